// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

pub const STROKE_FIELD: &str = "%Stroke";

pub const DEFAULT_NAME_FIELD: &str = "Feed pump";
pub const DEFAULT_DESTINATION_FIELD: &str = "Destination";
pub const DEFAULT_INHIBITOR_FIELD: &str = "Inhibitor";
pub const DEFAULT_DRUM_FIELD: &str = "Drum";

/// Column names the filter and renderers read from each row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    pub name: String,
    pub destination: String,
    pub inhibitor: String,
    pub drum: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME_FIELD.to_owned(),
            destination: DEFAULT_DESTINATION_FIELD.to_owned(),
            inhibitor: DEFAULT_INHIBITOR_FIELD.to_owned(),
            drum: DEFAULT_DRUM_FIELD.to_owned(),
        }
    }
}

impl FieldMap {
    /// Table column labels in display order.
    pub fn table_labels(&self) -> [&str; 5] {
        [
            self.name.as_str(),
            self.destination.as_str(),
            self.inhibitor.as_str(),
            self.drum.as_str(),
            STROKE_FIELD,
        ]
    }

    /// Configured columns that the header set does not contain.
    pub fn missing_from<'a>(&'a self, headers: &[String]) -> Vec<&'a str> {
        [&self.name, &self.destination, &self.inhibitor, &self.drum]
            .into_iter()
            .filter(|field| !headers.iter().any(|header| header == *field))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldMap, STROKE_FIELD};

    #[test]
    fn table_labels_end_with_stroke() {
        let fields = FieldMap::default();
        let labels = fields.table_labels();
        assert_eq!(labels[0], "Feed pump");
        assert_eq!(labels[4], STROKE_FIELD);
    }

    #[test]
    fn missing_from_reports_unknown_columns() {
        let fields = FieldMap::default();
        let headers = vec!["Feed pump".to_owned(), "Drum".to_owned()];
        assert_eq!(fields.missing_from(&headers), vec!["Destination", "Inhibitor"]);
    }
}
