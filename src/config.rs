//! YAML configuration for diagram rendering.
//!
//! ```yaml
//! layout:
//!   direction: LR
//!   node_gap: 60
//! drawio:
//!   header_color: "#2d3748"
//! miro:
//!   border_color: "#000000"
//! ```
//!
//! Every section and field is optional; missing values take their defaults.

use crate::generator::{DrawioOptions, MiroOptions};
use crate::layout::LayoutOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete YAML configuration for rendering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    pub layout: LayoutOptions,
    pub drawio: DrawioOptions,
    pub miro: MiroOptions,
}

impl DiagramConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        // An empty file is a valid, all-default config
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        Ok(config)
    }

    /// Draw.io options with the row height the layout sized tables for
    pub fn drawio_options(&self) -> DrawioOptions {
        DrawioOptions {
            row_height: self.layout.row_height,
            ..self.drawio.clone()
        }
    }

    /// Save configuration to a YAML file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
