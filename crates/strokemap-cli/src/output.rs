// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use std::fmt::Write as _;
use strokemap_app::{FieldMap, ViewModel, range_headers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Cards,
    Json,
}

impl OutputFormat {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "cards" => Ok(Self::Cards),
            "json" => Ok(Self::Json),
            other => bail!("unknown format {other:?}; use table, cards, or json"),
        }
    }
}

pub fn render_view(view: &ViewModel, fields: &FieldMap, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(view, fields)),
        OutputFormat::Cards => Ok(render_cards(view)),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(view).context("encode view as JSON")?;
            json.push('\n');
            Ok(json)
        }
    }
}

fn render_table(view: &ViewModel, fields: &FieldMap) -> String {
    let labels = fields.table_labels();
    let mut widths = labels.map(|label| label.chars().count());
    for line in &view.table {
        for (width, cell) in widths.iter_mut().zip(line.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &labels, &widths);
    let rule = widths.map(|width| "-".repeat(width));
    push_row(&mut out, &rule.each_ref().map(String::as_str), &widths);
    for line in &view.table {
        push_row(&mut out, &line.cells(), &widths);
    }
    push_message(&mut out, view);
    out
}

fn push_row(out: &mut String, cells: &[&str; 5], widths: &[usize; 5]) {
    let padded = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}

fn render_cards(view: &ViewModel) -> String {
    let mut out = String::new();
    for (index, card) in view.cards.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "[{}]", card.title);
        for entry in &card.entries {
            let _ = writeln!(out, "  {}", entry.heading);
            let _ = writeln!(out, "    {}", entry.detail);
        }
    }
    push_message(&mut out, view);
    out
}

fn push_message(out: &mut String, view: &ViewModel) {
    if let Some(message) = &view.message {
        out.push_str(message);
        out.push('\n');
    }
}

/// One line per range column in schema order.
pub fn render_ranges(headers: &[String]) -> String {
    let ranges = range_headers(headers);
    if ranges.is_empty() {
        return "no range columns found; expected headers like \"1-60%\"\n".to_owned();
    }

    let width = ranges
        .iter()
        .map(|range| range.label.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for range in ranges {
        let _ = writeln!(
            out,
            "{:<width$}  {} to {}",
            range.label, range.min, range.max
        );
    }
    out
}
