//! Miro REST API output: editable shapes and connectors on a board.
//!
//! [`MiroGenerator`] drives any [`BoardApi`]; [`MiroClient`] is the HTTP
//! implementation. Response parsing is pure in `parse_item_id` so it can be
//! tested without a network.

use super::{column_label, escape_html, relationships, ColumnColors, TableAnchors};
use crate::schema::{PositionedSchema, PositionedTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

const API_BASE: &str = "https://api.miro.com/v2";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const HEADER_HEIGHT: f64 = 36.0;
const ROW_HEIGHT: f64 = 30.0;
const CONNECTOR_COLOR: &str = "#64748b";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MiroError {
    /// The access token is empty.
    #[error("invalid Miro access token")]
    InvalidToken,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The HTTP request to the Miro API failed.
    #[error("Miro API request failed: {0}")]
    ApiRequest(String),

    /// The Miro API returned a non-success HTTP status.
    #[error("Miro API error: status {status}: {body}")]
    ApiResponse { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("Miro API response parse failed: {0}")]
    ApiParse(String),
}

// =============================================================================
// OPTIONS AND RESULT
// =============================================================================

/// Options for Miro generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiroOptions {
    pub header_color: String,
    pub column_color: String,
    pub pk_color: String,
    pub fk_color: String,
    pub border_color: String,
    pub text_color: String,
    pub header_text_color: String,
}

impl Default for MiroOptions {
    fn default() -> Self {
        Self {
            header_color: "#1a365d".to_string(),
            column_color: "#ffffff".to_string(),
            pk_color: "#fef3c7".to_string(),
            fk_color: "#dbeafe".to_string(),
            border_color: "#1e3a5f".to_string(),
            text_color: "#1a1a1a".to_string(),
            header_text_color: "#ffffff".to_string(),
        }
    }
}

/// Summary of the items created on a board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MiroResult {
    pub board_id: String,
    pub board_url: String,
    pub tables_created: usize,
    pub connectors_created: usize,
    /// Qualified table name -> header shape id
    pub shape_ids: BTreeMap<String, String>,
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Body of `POST /boards/{id}/shapes`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeRequest {
    pub data: ShapeData,
    pub style: ShapeStyle,
    pub position: Position,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeData {
    pub shape: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    pub fill_color: String,
    pub font_family: String,
    pub font_size: String,
    pub text_align: String,
    pub text_align_vertical: String,
    pub border_color: String,
    pub border_width: String,
    pub border_opacity: String,
    pub border_style: String,
    pub fill_opacity: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    pub width: f64,
    pub height: f64,
}

impl ShapeRequest {
    /// Rectangle centered at `(x, y)`
    #[allow(clippy::too_many_arguments)]
    pub fn rectangle(
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        content: String,
        fill_color: &str,
        text_color: &str,
        border_color: &str,
    ) -> Self {
        Self {
            data: ShapeData {
                shape: "rectangle".to_string(),
                content,
            },
            style: ShapeStyle {
                fill_color: fill_color.to_string(),
                font_family: "open_sans".to_string(),
                font_size: "14".to_string(),
                text_align: "left".to_string(),
                text_align_vertical: "middle".to_string(),
                border_color: border_color.to_string(),
                border_width: "1.0".to_string(),
                border_opacity: "1.0".to_string(),
                border_style: "normal".to_string(),
                fill_opacity: "1.0".to_string(),
                color: text_color.to_string(),
            },
            position: Position {
                x,
                y,
                origin: "center".to_string(),
            },
            geometry: Geometry { width, height },
        }
    }
}

/// Body of `POST /boards/{id}/connectors`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectorRequest<'a> {
    start_item: ItemRef<'a>,
    end_item: ItemRef<'a>,
    style: ConnectorStyle,
    shape: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemRef<'a> {
    id: &'a str,
    snap_to: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectorStyle {
    stroke_color: &'static str,
    stroke_width: &'static str,
    start_stroke_cap: &'static str,
    end_stroke_cap: &'static str,
}

impl<'a> ConnectorRequest<'a> {
    fn elbowed(start_id: &'a str, end_id: &'a str) -> Self {
        Self {
            start_item: ItemRef {
                id: start_id,
                snap_to: "right",
            },
            end_item: ItemRef {
                id: end_id,
                snap_to: "left",
            },
            style: ConnectorStyle {
                stroke_color: CONNECTOR_COLOR,
                stroke_width: "1.0",
                start_stroke_cap: "none",
                end_stroke_cap: "arrow",
            },
            shape: "elbowed",
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedItem {
    id: String,
}

fn parse_item_id(json: &str) -> Result<String, MiroError> {
    let item: CreatedItem =
        serde_json::from_str(json).map_err(|e| MiroError::ApiParse(e.to_string()))?;
    Ok(item.id)
}

// =============================================================================
// BOARD API
// =============================================================================

/// Operations on one Miro board
pub trait BoardApi {
    /// Create a shape and return its id
    fn create_shape(&mut self, shape: &ShapeRequest) -> Result<String, MiroError>;

    /// Connect two items and return the connector id
    fn create_connector(&mut self, start_id: &str, end_id: &str) -> Result<String, MiroError>;
}

/// Blocking HTTP client for one board
pub struct MiroClient {
    http: reqwest::blocking::Client,
    access_token: String,
    board_id: String,
    base_url: String,
}

impl MiroClient {
    pub fn new(access_token: String, board_id: String) -> Result<Self, MiroError> {
        if access_token.trim().is_empty() {
            return Err(MiroError::InvalidToken);
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| MiroError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            access_token,
            board_id,
            base_url: API_BASE.to_string(),
        })
    }

    /// Point the client at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<String, MiroError> {
        let url = format!("{}/boards/{}/{}", self.base_url, self.board_id, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .map_err(|e| MiroError::ApiRequest(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| MiroError::ApiRequest(e.to_string()))?;

        if !status.is_success() {
            return Err(MiroError::ApiResponse {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_item_id(&text)
    }
}

impl BoardApi for MiroClient {
    fn create_shape(&mut self, shape: &ShapeRequest) -> Result<String, MiroError> {
        self.post("shapes", shape)
    }

    fn create_connector(&mut self, start_id: &str, end_id: &str) -> Result<String, MiroError> {
        self.post("connectors", &ConnectorRequest::elbowed(start_id, end_id))
    }
}

// =============================================================================
// GENERATOR
// =============================================================================

/// Creates ER diagram items on a board
pub struct MiroGenerator<A: BoardApi> {
    api: A,
    board_id: String,
}

impl<A: BoardApi> MiroGenerator<A> {
    pub fn new(api: A, board_id: impl Into<String>) -> Self {
        Self {
            api,
            board_id: board_id.into(),
        }
    }

    pub fn into_inner(self) -> A {
        self.api
    }

    /// Create one header and one row per column for each table, then one
    /// connector per resolvable foreign key. Fails on the first API error.
    pub fn generate(
        &mut self,
        schema: &PositionedSchema,
        options: &MiroOptions,
    ) -> Result<MiroResult, MiroError> {
        let mut anchors: Vec<TableAnchors> = Vec::with_capacity(schema.len());
        let mut shape_ids = BTreeMap::new();

        for table in &schema.tables {
            let table_anchors = self.create_table(table, options)?;
            shape_ids
                .entry(table.qualified_name())
                .or_insert_with(|| table_anchors.header.clone());
            anchors.push(table_anchors);
        }

        let mut connectors_created = 0;
        for rel in relationships(schema) {
            let Some(source) = anchors[rel.from_table].column(&rel.from_column) else {
                continue;
            };
            let target = anchors[rel.to_table].column_or_header(rel.to_column.as_deref());
            self.api.create_connector(source, target)?;
            connectors_created += 1;
        }

        tracing::info!(
            board = %self.board_id,
            tables = schema.len(),
            connectors = connectors_created,
            "created items on Miro board"
        );

        Ok(MiroResult {
            board_id: self.board_id.clone(),
            board_url: board_url(&self.board_id),
            tables_created: schema.len(),
            connectors_created,
            shape_ids,
        })
    }

    fn create_table(
        &mut self,
        table: &PositionedTable,
        opts: &MiroOptions,
    ) -> Result<TableAnchors, MiroError> {
        let center_x = table.x + table.width / 2.0;

        let header = ShapeRequest::rectangle(
            center_x,
            table.y + HEADER_HEIGHT / 2.0,
            table.width,
            HEADER_HEIGHT,
            format!("<strong>{}</strong>", escape_html(&table.qualified_name())),
            &opts.header_color,
            &opts.header_text_color,
            &opts.border_color,
        );
        let mut anchors = TableAnchors::new(self.api.create_shape(&header)?);

        let colors = ColumnColors {
            column: &opts.column_color,
            pk: &opts.pk_color,
            fk: &opts.fk_color,
        };

        for (i, col) in table.table.columns.iter().enumerate() {
            let row = ShapeRequest::rectangle(
                center_x,
                table.y + HEADER_HEIGHT + i as f64 * ROW_HEIGHT + ROW_HEIGHT / 2.0,
                table.width,
                ROW_HEIGHT,
                escape_html(&column_label(col)),
                colors.fill_for(col),
                &opts.text_color,
                &opts.border_color,
            );
            let id = self.api.create_shape(&row)?;
            anchors.columns.entry(col.name.clone()).or_insert(id);
        }

        Ok(anchors)
    }
}

/// Browser URL of a board
pub fn board_url(board_id: &str) -> String {
    format!("https://miro.com/app/board/{}/", board_id)
}

/// Create the diagram on a board through the HTTP API
pub fn generate_miro(
    schema: &PositionedSchema,
    access_token: &str,
    board_id: &str,
    options: &MiroOptions,
) -> Result<MiroResult, MiroError> {
    let client = MiroClient::new(access_token.to_string(), board_id.to_string())?;
    MiroGenerator::new(client, board_id).generate(schema, options)
}
