// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Serialize;
use std::collections::BTreeMap;

const DELIMITER: char = ',';

/// One data line keyed by column name. Columns a short line did not reach are
/// absent rather than empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Row {
    values: BTreeMap<String, String>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn get_or_empty(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    /// Parses comma-delimited text. The first line is the header set; each
    /// remaining non-blank line becomes a row zipped against it by position.
    /// There is no quoting, so a comma inside a value splits it.
    pub fn parse(text: &str) -> Self {
        let mut lines = text.trim().lines();
        let headers = match lines.next() {
            Some(line) if !line.trim().is_empty() => split_fields(line),
            _ => return Self::default(),
        };

        let rows = lines
            .filter(|line| !line.trim().is_empty())
            .map(|line| zip_row(&headers, line))
            .collect();

        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|header| header == column)
    }
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(DELIMITER)
        .map(|value| value.trim().to_owned())
        .collect()
}

fn zip_row(headers: &[String], line: &str) -> Row {
    // Extra trailing values fall off the end of the zip.
    headers
        .iter()
        .zip(line.split(DELIMITER))
        .map(|(header, value)| (header.clone(), value.trim().to_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Dataset, Row};

    #[test]
    fn parse_trims_headers_and_values() {
        let dataset = Dataset::parse(" Feed pump , Drum \n P-101 ,  D1 \n");
        assert_eq!(dataset.headers(), ["Feed pump", "Drum"]);
        assert_eq!(dataset.rows().len(), 1);
        assert_eq!(dataset.rows()[0].get("Feed pump"), Some("P-101"));
        assert_eq!(dataset.rows()[0].get("Drum"), Some("D1"));
    }

    #[test]
    fn short_rows_leave_columns_absent() {
        let dataset = Dataset::parse("a,b,c\n1,2\n");
        let row = &dataset.rows()[0];
        assert_eq!(row.get("a"), Some("1"));
        assert_eq!(row.get("b"), Some("2"));
        assert_eq!(row.get("c"), None);
        assert_eq!(row.get_or_empty("c"), "");
    }

    #[test]
    fn long_rows_drop_extra_values() {
        let dataset = Dataset::parse("a,b\n1,2,3,4\n");
        let row = &dataset.rows()[0];
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("b"), Some("2"));
    }

    #[test]
    fn blank_lines_and_crlf_are_ignored() {
        let dataset = Dataset::parse("a,b\r\n1,2\r\n\r\n   \r\n3,4\r\n");
        assert_eq!(dataset.headers(), ["a", "b"]);
        assert_eq!(dataset.rows().len(), 2);
        assert_eq!(dataset.rows()[1].get("b"), Some("4"));
    }

    #[test]
    fn empty_text_yields_empty_dataset() {
        let dataset = Dataset::parse("  \n ");
        assert!(dataset.headers().is_empty());
        assert!(dataset.is_empty());
    }

    #[test]
    fn header_only_text_has_no_rows() {
        let dataset = Dataset::parse("a,b,1-60%\n");
        assert_eq!(dataset.headers().len(), 3);
        assert!(dataset.is_empty());
        assert!(dataset.has_column("1-60%"));
    }

    #[test]
    fn quoted_commas_split_fields() {
        let dataset = Dataset::parse("a,b\n\"x,y\",z\n");
        let row = &dataset.rows()[0];
        assert_eq!(row.get("a"), Some("\"x"));
        assert_eq!(row.get("b"), Some("y\""));
    }

    #[test]
    fn repeated_header_keeps_later_value() {
        let dataset = Dataset::parse("a,a\n1,2\n");
        assert_eq!(dataset.rows()[0].get("a"), Some("2"));
    }

    #[test]
    fn row_collects_from_pairs() {
        let row: Row = [("Drum", "D1"), ("Inhibitor", "Scale")].into_iter().collect();
        assert_eq!(row.get("Inhibitor"), Some("Scale"));
        assert!(!row.is_empty());
    }
}
