//! CSV export of the tag table.

use super::TagRecord;

/// Download filename served by the export endpoint.
pub const EXPORT_FILENAME: &str = "tags_export.csv";

/// Content type served by the export endpoint.
pub const EXPORT_MIME: &str = "text/csv";

/// Fixed header row. The importer matches the same column names.
pub const EXPORT_HEADER: [&str; 10] = [
    "Name",
    "Type",
    "Address",
    "Value",
    "Comment",
    "Group",
    "Active",
    "Retain",
    "DataSource",
    "Status",
];

/// Quote a field if it contains a comma, quote, CR or LF.
fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        csv_quote(value)
    } else {
        value.to_string()
    }
}

/// Always quote, doubling embedded quotes.
fn csv_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Serialize `tags` in input order.
///
/// The caller decides whether to pass the filtered projection or every tag.
/// Lines are joined with `\n` without a trailing newline. The comment column
/// is always quoted, even when empty.
pub fn export_csv<T: TagRecord>(tags: &[T]) -> String {
    let mut lines = Vec::with_capacity(tags.len() + 1);
    lines.push(EXPORT_HEADER.join(","));

    for tag in tags {
        let row = [
            csv_escape(tag.name()),
            csv_escape(tag.data_type()),
            csv_escape(tag.address().unwrap_or_default()),
            csv_escape(tag.value().unwrap_or_default()),
            csv_quote(tag.comment().unwrap_or_default()),
            csv_escape(tag.group_name().unwrap_or_default()),
            tag.active().to_string(),
            tag.retain().to_string(),
            csv_escape(tag.data_source()),
            csv_escape(tag.connection_status()),
        ];
        lines.push(row.join(","));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::fixtures::TestTag;

    fn pump_and_temp() -> Vec<TestTag> {
        vec![
            TestTag {
                data_type: "Bool".into(),
                address: Some("DB1.DBX0.0".into()),
                value: Some("true".into()),
                comment: Some("Main pump".into()),
                group_name: Some("Motors".into()),
                active: true,
                retain: false,
                data_source: "Internal".into(),
                connection_status: "Connected".into(),
                ..TestTag::new(1, "Pump1")
            },
            TestTag {
                data_type: "Real".into(),
                address: Some("DB1.DBD4".into()),
                value: Some("21.5".into()),
                comment: None,
                group_name: Some("Sensors".into()),
                active: false,
                retain: true,
                data_source: "MQTT".into(),
                connection_status: "Disconnected".into(),
                ..TestTag::new(2, "Temp1")
            },
        ]
    }

    #[test]
    fn exports_header_plus_one_line_per_tag() {
        let csv = export_csv(&pump_and_temp());
        let lines: Vec<&str> = csv.split('\n').collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Name,Type,Address,Value,Comment,Group,Active,Retain,DataSource,Status"
        );
        assert_eq!(
            lines[1],
            "Pump1,Bool,DB1.DBX0.0,true,\"Main pump\",Motors,true,false,Internal,Connected"
        );
        assert_eq!(
            lines[2],
            "Temp1,Real,DB1.DBD4,21.5,\"\",Sensors,false,true,MQTT,Disconnected"
        );
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn empty_input_exports_header_only() {
        let csv = export_csv::<TestTag>(&[]);
        assert_eq!(csv, EXPORT_HEADER.join(","));
    }

    #[test]
    fn embedded_quotes_and_commas_are_escaped() {
        let tag = TestTag {
            comment: Some("say \"hi\", then stop".into()),
            ..TestTag::new(1, "Valve,1")
        };
        let csv = export_csv(&[tag]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with("\"Valve,1\",Bool,,,\"say \"\"hi\"\", then stop\","));
    }
}
