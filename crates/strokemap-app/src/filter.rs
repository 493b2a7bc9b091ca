// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Serialize, Serializer};
use std::fmt;

use crate::{Dataset, FieldMap, Row, STROKE_FIELD, parse_float_prefix, resolve_range_header};

pub const NOT_SELECTED_MARKER: &str = "-";
pub const MISSING_MARKER: &str = "N/A";

/// The raw text of the two query inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Query {
    pub load: String,
    pub search: String,
}

impl Query {
    pub fn new(load: impl Into<String>, search: impl Into<String>) -> Self {
        Self {
            load: load.into(),
            search: search.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.load.trim().is_empty() && self.search.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FilterError {
    InvalidLoadFormat,
    LoadOutOfRange,
}

impl FilterError {
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidLoadFormat => "Please enter a valid number for % Load.",
            Self::LoadOutOfRange => "Load value is out of range.",
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for FilterError {}

/// Derived `%Stroke` value attached to each filtered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stroke {
    /// No load was entered.
    NotSelected,
    /// A load was entered but the row has no value in that range column.
    Missing,
    Value(String),
}

impl Stroke {
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotSelected => NOT_SELECTED_MARKER,
            Self::Missing => MISSING_MARKER,
            Self::Value(value) => value,
        }
    }

    fn from_cell(value: Option<&str>) -> Self {
        match value {
            Some(value) if !value.is_empty() => Self::Value(value.to_owned()),
            _ => Self::Missing,
        }
    }
}

impl fmt::Display for Stroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Stroke {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A copy of a source row plus its stroke for the current pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AugmentedRow {
    pub row: Row,
    pub stroke: Stroke,
}

impl AugmentedRow {
    /// Looks up a column, treating `%Stroke` as the derived field.
    pub fn get(&self, column: &str) -> Option<&str> {
        if column == STROKE_FIELD {
            return Some(self.stroke.as_str());
        }
        self.row.get(column)
    }
}

pub type FilterResult = std::result::Result<Vec<AugmentedRow>, FilterError>;

/// Applies the search term, then the load, to the base rows. Either failure
/// discards every row; there is no partial result.
pub fn filter_rows(dataset: &Dataset, query: &Query, fields: &FieldMap) -> FilterResult {
    let search = query.search.trim().to_lowercase();
    let load = query.load.trim();

    let matched = dataset
        .rows()
        .iter()
        .filter(|row| search.is_empty() || name_matches(row, &fields.name, &search));

    if load.is_empty() {
        return Ok(matched
            .map(|row| AugmentedRow {
                row: row.clone(),
                stroke: Stroke::NotSelected,
            })
            .collect());
    }

    let load = parse_load(load)?;
    let column = resolve_range_header(load, dataset.headers()).ok_or(FilterError::LoadOutOfRange)?;

    Ok(matched
        .map(|row| AugmentedRow {
            row: row.clone(),
            stroke: Stroke::from_cell(row.get(column)),
        })
        .collect())
}

pub fn parse_load(raw: &str) -> std::result::Result<f64, FilterError> {
    parse_float_prefix(raw)
        .filter(|value| value.is_finite())
        .ok_or(FilterError::InvalidLoadFormat)
}

fn name_matches(row: &Row, name_field: &str, lowered_term: &str) -> bool {
    row.get_or_empty(name_field)
        .to_lowercase()
        .contains(lowered_term)
}
