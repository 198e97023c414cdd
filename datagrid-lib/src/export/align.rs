//! Column inclusion and alignment for exports.

use crate::column::Alignment;
use crate::column::ColumnDef;

/// Returns the columns that take part in an export, in display order.
///
/// Hidden columns and the UI-only actions column are left out.
pub fn export_columns<'a>(columns: &'a [ColumnDef], actions_key: &str) -> Vec<&'a ColumnDef> {
    columns
        .iter()
        .filter(|c| !c.hidden && c.key != actions_key)
        .collect()
}

/// Returns the export alignment of each column.
///
/// The first column is left-aligned and interior columns are centered,
/// whatever they request on screen. The last column is right-aligned unless
/// it sets its own alignment. A single column is left-aligned.
pub fn export_alignments(columns: &[&ColumnDef]) -> Vec<Alignment> {
    let last = columns.len().saturating_sub(1);
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| match i {
            0 => Alignment::Left,
            i if i == last => column.align.unwrap_or(Alignment::Right),
            _ => Alignment::Center,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusion() {
        let columns = vec![
            ColumnDef::new("name", "Name"),
            ColumnDef::new("secret", "Secret").hidden(true),
            ColumnDef::new("actions", "Actions"),
            ColumnDef::new("amount", "Amount"),
        ];
        let keys: Vec<&str> = export_columns(&columns, "actions")
            .iter()
            .map(|c| c.key.as_str())
            .collect();
        assert_eq!(keys, vec!["name", "amount"]);
    }

    #[test]
    fn test_alignment_rule() {
        let columns = vec![
            ColumnDef::new("a", "A").align(Alignment::Right),
            ColumnDef::new("b", "B").align(Alignment::Left),
            ColumnDef::new("c", "C"),
        ];
        let refs: Vec<&ColumnDef> = columns.iter().collect();
        assert_eq!(
            export_alignments(&refs),
            vec![Alignment::Left, Alignment::Center, Alignment::Right]
        );
    }

    #[test]
    fn test_last_column_override() {
        let columns = vec![
            ColumnDef::new("a", "A"),
            ColumnDef::new("b", "B").align(Alignment::Center),
        ];
        let refs: Vec<&ColumnDef> = columns.iter().collect();
        assert_eq!(
            export_alignments(&refs),
            vec![Alignment::Left, Alignment::Center]
        );
        assert_eq!(export_alignments(&refs[..1]), vec![Alignment::Left]);
        assert!(export_alignments(&[]).is_empty());
    }
}
