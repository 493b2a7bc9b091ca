// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::{AugmentedRow, Dataset, FieldMap, FilterError, Query, Stroke, filter_rows};

pub const NO_MATCHING_DATA: &str = "No matching data found.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Wrapped,
    Scrollable,
}

impl ViewMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wrapped => "wrapped",
            Self::Scrollable => "scrollable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "wrapped" | "wrap" => Some(Self::Wrapped),
            "scrollable" | "scroll" => Some(Self::Scrollable),
            _ => None,
        }
    }

    pub const fn toggle(self) -> Self {
        match self {
            Self::Wrapped => Self::Scrollable,
            Self::Scrollable => Self::Wrapped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableLine {
    pub name: String,
    pub destination: String,
    pub inhibitor: String,
    pub drum: String,
    pub stroke: String,
}

impl TableLine {
    pub fn cells(&self) -> [&str; 5] {
        [
            self.name.as_str(),
            self.destination.as_str(),
            self.inhibitor.as_str(),
            self.drum.as_str(),
            self.stroke.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardEntry {
    /// `<drum> (<inhibitor>)`
    pub heading: String,
    /// `<destination> = <stroke>`
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub title: String,
    pub entries: Vec<CardEntry>,
}

/// Everything a renderer needs for one pass. Built fresh on every query change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub table: Vec<TableLine>,
    pub cards: Vec<Card>,
    pub message: Option<String>,
    pub error: Option<FilterError>,
    pub view_mode: ViewMode,
}

impl ViewModel {
    pub fn row_count(&self) -> usize {
        self.table.len()
    }
}

pub fn project_table(rows: &[AugmentedRow], fields: &FieldMap) -> Vec<TableLine> {
    rows.iter()
        .map(|row| TableLine {
            name: row.row.get_or_empty(&fields.name).to_owned(),
            destination: row.row.get_or_empty(&fields.destination).to_owned(),
            inhibitor: row.row.get_or_empty(&fields.inhibitor).to_owned(),
            drum: row.row.get_or_empty(&fields.drum).to_owned(),
            stroke: row.stroke.as_str().to_owned(),
        })
        .collect()
}

/// Groups rows by name in first-seen order. Rows inside a group keep their
/// filtered order.
pub fn group_cards(rows: &[AugmentedRow], fields: &FieldMap) -> Vec<Card> {
    let mut cards: Vec<Card> = Vec::new();
    for row in rows {
        let title = row.row.get_or_empty(&fields.name);
        let entry = card_entry(row, fields);
        match cards.iter_mut().find(|card| card.title == title) {
            Some(card) => card.entries.push(entry),
            None => cards.push(Card {
                title: title.to_owned(),
                entries: vec![entry],
            }),
        }
    }
    cards
}

fn card_entry(row: &AugmentedRow, fields: &FieldMap) -> CardEntry {
    CardEntry {
        heading: format!(
            "{} ({})",
            row.row.get_or_empty(&fields.drum),
            row.row.get_or_empty(&fields.inhibitor)
        ),
        detail: format!(
            "{} = {}",
            row.row.get_or_empty(&fields.destination),
            format_card_stroke(&row.stroke)
        ),
    }
}

pub fn format_card_stroke(stroke: &Stroke) -> String {
    match stroke {
        Stroke::NotSelected => stroke.as_str().to_owned(),
        _ => format!("{}%", stroke.as_str()),
    }
}

/// Recomputes the whole view from the base dataset. A filter error empties
/// both projections and becomes the message; an empty result without an error
/// gets the no-data notice.
pub fn on_query_changed(
    dataset: &Dataset,
    query: &Query,
    fields: &FieldMap,
    view_mode: ViewMode,
) -> ViewModel {
    match filter_rows(dataset, query, fields) {
        Ok(rows) => {
            let table = project_table(&rows, fields);
            let cards = group_cards(&rows, fields);
            let message = table.is_empty().then(|| NO_MATCHING_DATA.to_owned());
            ViewModel {
                table,
                cards,
                message,
                error: None,
                view_mode,
            }
        }
        Err(error) => ViewModel {
            table: Vec::new(),
            cards: Vec::new(),
            message: Some(error.to_string()),
            error: Some(error),
            view_mode,
        },
    }
}
