//! Permanent items command implementation.

use serde::Serialize;
use trellis_protocol::DataType;
use trellis_server::ids::server_tag_to_id;
use trellis_server::PERMANENT_ITEMS;

/// One row of the permanent item table.
#[derive(Debug, Serialize)]
pub struct PermanentItemRow {
    /// Server-defined tag.
    pub tag: &'static str,
    /// Id derived from the tag.
    pub id: String,
    /// Display name.
    pub name: &'static str,
    /// Parent id.
    pub parent_id: String,
    /// Type that triggers creation.
    pub data_type: DataType,
}

/// Builds the table in creation order.
pub fn rows() -> Vec<PermanentItemRow> {
    PERMANENT_ITEMS
        .iter()
        .map(|item| PermanentItemRow {
            tag: item.tag,
            id: server_tag_to_id(item.tag),
            name: item.name,
            parent_id: server_tag_to_id(item.parent_tag),
            data_type: item.data_type,
        })
        .collect()
}

/// Runs the permanent-items command.
pub fn run(format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let rows = rows();
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {
            println!("Permanent Items");
            println!("===============");
            for row in &rows {
                println!(
                    "  {:<16} {:<16} {:?} (parent {})",
                    row.tag, row.name, row.data_type, row.parent_id
                );
            }
        }
    }
    Ok(())
}
