//! Integration tests for export scopes, degradation and encoding.

use datagrid_lib::DataGrid;
use datagrid_lib::cell::CellNode;
use datagrid_lib::column::ColumnDef;
use datagrid_lib::config::ExportOptions;
use datagrid_lib::config::GridConfig;
use datagrid_lib::error::RenderError;
use datagrid_lib::export::ExportFormat;
use datagrid_lib::export::ExportPayload;
use datagrid_lib::export::ExportScope;
use datagrid_lib::export::Exporter;
use datagrid_lib::model::Row;
use datagrid_lib::model::Value;

fn rows() -> Vec<Row> {
    (1..=50)
        .map(|i: i64| {
            Row::new()
                .set("id", i)
                .set("name", format!("Customer {}", i))
                .set("status", if i % 2 == 0 { "paid" } else { "late" })
        })
        .collect()
}

fn columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("id", "Id").sortable(),
        ColumnDef::new("name", "Name"),
        ColumnDef::new("status", "Status").with_render(|value, _| {
            let color = if value.as_str() == Some("paid") { "green" } else { "red" };
            Ok(CellNode::badge(value.to_string(), color))
        }),
        ColumnDef::new("actions", "Actions"),
    ]
}

fn grid() -> DataGrid {
    let mut grid = DataGrid::new("invoices", columns(), GridConfig::default());
    grid.set_rows(rows());
    grid
}

fn exported_ids(payload: &ExportPayload) -> Vec<i64> {
    payload
        .rows
        .iter()
        .map(|cells| match cells[0].raw {
            Value::Int(id) => id,
            ref other => panic!("unexpected id {:?}", other),
        })
        .collect()
}

#[test]
fn test_current_page_scope() {
    let mut grid = grid();
    grid.set_page(2);
    let payload = grid.prepare_export(ExportScope::CurrentPage, ExportOptions::default());
    assert_eq!(exported_ids(&payload), (11..=20).collect::<Vec<_>>());
    assert_eq!(payload.metadata.total_records, 50);
    assert_eq!(payload.metadata.exported_records, 10);
    assert_eq!(payload.metadata.current_page, Some(2));
    assert_eq!(payload.metadata.page_size, Some(10));
}

#[test]
fn test_all_scope_ignores_pagination() {
    let mut grid = grid();
    grid.set_page(2);
    let payload = grid.prepare_export(ExportScope::All, ExportOptions::default());
    assert_eq!(exported_ids(&payload), (1..=50).collect::<Vec<_>>());
    assert_eq!(payload.metadata.current_page, None);
}

#[test]
fn test_selected_scope_ignores_page() {
    let mut grid = grid();
    grid.toggle_row("4");
    grid.toggle_row("27");
    grid.toggle_row("49");
    grid.set_page(2);
    let payload = grid.prepare_export(ExportScope::Selected, ExportOptions::default());
    assert_eq!(exported_ids(&payload), vec![4, 27, 49]);
    assert!(!payload.metadata.scope_fallback);
}

#[test]
fn test_actions_column_and_lowering() {
    let payload = grid().prepare_export(ExportScope::All, ExportOptions::default());
    assert_eq!(payload.columns, vec!["Id", "Name", "Status"]);
    let status = &payload.rows[1][2];
    assert_eq!(status.text, "paid");
    assert!(status.html.contains("#52c41a"));
    assert_eq!(status.raw, Value::from("paid"));
}

#[test]
fn test_failing_render_degrades_one_cell() {
    let mut columns = columns();
    columns[1] = ColumnDef::new("name", "Name").with_render(|value, row| {
        if row.value("id") == &Value::Int(17) {
            return Err(RenderError::new("name", "lookup failed"));
        }
        Ok(CellNode::text(format!("** {} **", value)))
    });
    let mut grid = DataGrid::new("invoices", columns, GridConfig::default());
    grid.set_rows(rows());

    let payload = grid.prepare_export(ExportScope::All, ExportOptions::default());
    assert_eq!(payload.metadata.exported_records, 50);
    assert_eq!(payload.metadata.degraded_cells, 1);
    assert_eq!(payload.rows[16][1].text, "Customer 17");
    assert_eq!(payload.rows[15][1].text, "** Customer 16 **");
    assert_eq!(payload.rows[17][1].text, "** Customer 18 **");
}

#[tokio::test]
async fn test_export_every_format() {
    let grid = grid();
    let exporter = Exporter::new(ExportOptions::new("Open Invoices"));
    for format in ExportFormat::ALL {
        let output = grid
            .export(&exporter, ExportScope::All, format)
            .await
            .unwrap();
        assert!(!output.bytes.is_empty(), "{}", format);
        assert_eq!(output.mime_type, format.mime_type());
        assert!(output.file_name.starts_with("open_invoices_"));
        assert!(output.file_name.ends_with(format.extension()));
        assert_eq!(output.exported_records, 50);
    }
}

#[tokio::test]
async fn test_csv_content() {
    let mut grid = grid();
    grid.set_filter("status", "paid");
    let exporter = Exporter::new(ExportOptions::new("Paid").with_bom(false));
    let output = grid
        .export(&exporter, ExportScope::All, ExportFormat::Csv)
        .await
        .unwrap();
    assert!(output.file_name.starts_with("paid_"));
    let text = String::from_utf8(output.bytes).unwrap();
    assert!(!text.starts_with('\u{feff}'));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 26);
    assert_eq!(lines[0], "Id,Name,Status");
    assert_eq!(lines[1], "2,Customer 2,paid");
}
