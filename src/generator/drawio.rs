//! Draw.io (diagrams.net) XML output for ER diagrams.

use super::{
    column_label, escape_html, relationships, ColumnColors, IdSequence, TableAnchors,
};
use crate::layout::HEADER_EXTRA;
use crate::schema::{PositionedSchema, PositionedTable};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

const HEADER_FONT_COLOR: &str = "#ffffff";
const STROKE_COLOR: &str = "#1e3a5f";
const EDGE_COLOR: &str = "#64748b";

/// Options for Draw.io generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawioOptions {
    /// Taken from the layout options so rows line up with the sized tables
    #[serde(skip)]
    pub row_height: f64,
    pub header_color: String,
    pub column_color: String,
    pub pk_color: String,
    pub fk_color: String,
}

impl Default for DrawioOptions {
    fn default() -> Self {
        Self {
            row_height: 26.0,
            header_color: "#1a365d".to_string(),
            column_color: "#ffffff".to_string(),
            pk_color: "#fef3c7".to_string(),
            fk_color: "#dbeafe".to_string(),
        }
    }
}

impl DrawioOptions {
    fn colors(&self) -> ColumnColors<'_> {
        ColumnColors {
            column: &self.column_color,
            pk: &self.pk_color,
            fk: &self.fk_color,
        }
    }
}

/// Generate a Draw.io document stamped with the current time
pub fn to_drawio(schema: &PositionedSchema, options: &DrawioOptions) -> String {
    to_drawio_at(schema, options, Utc::now())
}

/// Generate a Draw.io document with an explicit modification time
pub fn to_drawio_at(
    schema: &PositionedSchema,
    options: &DrawioOptions,
    modified: DateTime<Utc>,
) -> String {
    let mut ids = IdSequence::new("cell");
    let mut cells: Vec<String> = Vec::new();
    let mut anchors: Vec<TableAnchors> = Vec::with_capacity(schema.len());

    for table in &schema.tables {
        anchors.push(table_cells(table, options, &mut ids, &mut cells));
    }

    let mut edges = 0;
    for rel in relationships(schema) {
        let Some(source) = anchors[rel.from_table].column(&rel.from_column) else {
            continue;
        };
        let target = anchors[rel.to_table].column_or_header(rel.to_column.as_deref());
        cells.push(edge_cell(&ids.next_id(), source, target, rel.name.as_deref()));
        edges += 1;
    }

    tracing::debug!(tables = schema.len(), edges, "generated draw.io cells");

    wrap_document(&cells.join("\n"), modified)
}

/// Swimlane container plus one row per column
fn table_cells(
    table: &PositionedTable,
    opts: &DrawioOptions,
    ids: &mut IdSequence,
    cells: &mut Vec<String>,
) -> TableAnchors {
    let table_id = ids.next_id();
    let header_height = opts.row_height + HEADER_EXTRA;

    cells.push(format!(
        r#"        <mxCell id="{id}" value="{value}" style="swimlane;fontStyle=1;childLayout=stackLayout;horizontal=1;startSize={header};horizontalStack=0;resizeParent=1;resizeParentMax=0;resizeLast=0;collapsible=0;marginBottom=0;fillColor={fill};fontColor={font};strokeColor={stroke};rounded=1;arcSize=8;" vertex="1" parent="1">
          <mxGeometry x="{x}" y="{y}" width="{w}" height="{h}" as="geometry"/>
        </mxCell>"#,
        id = table_id,
        value = escape_html(&table.qualified_name()),
        header = header_height,
        fill = escape_html(&opts.header_color),
        font = HEADER_FONT_COLOR,
        stroke = STROKE_COLOR,
        x = table.x,
        y = table.y,
        w = table.width,
        h = table.height,
    ));

    let colors = opts.colors();
    let mut anchors = TableAnchors::new(table_id.clone());

    for (i, col) in table.table.columns.iter().enumerate() {
        let col_id = ids.next_id();
        cells.push(format!(
            r#"        <mxCell id="{id}" value="{value}" style="text;strokeColor=none;fillColor={fill};align=left;verticalAlign=middle;spacingLeft=8;spacingRight=4;overflow=hidden;rotatable=0;points=[[0,0.5],[1,0.5]];portConstraint=eastwest;fontFamily=monospace;fontSize=11;" vertex="1" parent="{parent}">
          <mxGeometry y="{y}" width="{w}" height="{h}" as="geometry"/>
        </mxCell>"#,
            id = col_id,
            value = escape_html(&column_label(col)),
            fill = escape_html(colors.fill_for(col)),
            parent = table_id,
            y = header_height + i as f64 * opts.row_height,
            w = table.width,
            h = opts.row_height,
        ));
        anchors.columns.entry(col.name.clone()).or_insert(col_id);
    }

    anchors
}

fn edge_cell(id: &str, source: &str, target: &str, name: Option<&str>) -> String {
    format!(
        r#"        <mxCell id="{id}" value="{label}" style="edgeStyle=orthogonalEdgeStyle;rounded=1;orthogonalLoop=1;jettySize=auto;html=1;endArrow=ERmany;endFill=0;startArrow=ERone;startFill=0;strokeWidth=1;strokeColor={stroke};" edge="1" parent="1" source="{source}" target="{target}">
          <mxGeometry relative="1" as="geometry"/>
        </mxCell>"#,
        id = id,
        label = name.map(escape_html).unwrap_or_default(),
        stroke = EDGE_COLOR,
        source = source,
        target = target,
    )
}

fn wrap_document(content: &str, modified: DateTime<Utc>) -> String {
    let timestamp = modified.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut output = String::new();

    output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    output.push_str(&format!(
        "<mxfile host=\"app.diagrams.net\" modified=\"{}\" agent=\"{}/{}\" version=\"1.0\">\n",
        timestamp,
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));
    output.push_str("  <diagram name=\"Database Schema\" id=\"db-schema\">\n");
    output.push_str("    <mxGraphModel dx=\"1000\" dy=\"600\" grid=\"1\" gridSize=\"10\" guides=\"1\" tooltips=\"1\" connect=\"1\" arrows=\"1\" fold=\"1\" page=\"1\" pageScale=\"1\" pageWidth=\"1600\" pageHeight=\"1200\" math=\"0\" shadow=\"0\">\n");
    output.push_str("      <root>\n");
    output.push_str("        <mxCell id=\"0\"/>\n");
    output.push_str("        <mxCell id=\"1\" parent=\"0\"/>\n");
    if !content.is_empty() {
        output.push_str(content);
        output.push('\n');
    }
    output.push_str("      </root>\n");
    output.push_str("    </mxGraphModel>\n");
    output.push_str("  </diagram>\n");
    output.push_str("</mxfile>\n");
    output
}
