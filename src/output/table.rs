//! Table output formatting

use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

/// Format rows as a rounded table with a centred header
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new(data);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Tabled)]
    struct Row {
        #[tabled(rename = "REPORT ID")]
        report_id: String,
        #[tabled(rename = "TARGET")]
        target: String,
    }

    #[test]
    fn test_format_table_empty() {
        let rows: Vec<Row> = vec![];
        assert_eq!(format_table(&rows), "No results found.");
    }

    #[test]
    fn test_format_table_headers_and_values() {
        let rows = vec![Row {
            report_id: "r1".to_string(),
            target: "example.com".to_string(),
        }];

        let result = format_table(&rows);

        assert!(result.contains("REPORT ID"));
        assert!(result.contains("example.com"));
        assert!(result.contains("╭"));
    }
}
