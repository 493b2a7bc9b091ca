// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Serialize;

/// A column whose name encodes an inclusive load interval, e.g. `61-100%`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeHeader<'a> {
    pub label: &'a str,
    pub min: f64,
    pub max: f64,
}

impl<'a> RangeHeader<'a> {
    pub fn parse(header: &'a str) -> Option<Self> {
        if !header.contains('%') {
            return None;
        }

        let stripped = header.replacen('%', "", 1);
        let mut parts = stripped.split('-');
        let (Some(min), Some(max), None) = (parts.next(), parts.next(), parts.next()) else {
            return None;
        };

        Some(Self {
            label: header,
            min: parse_bound(min)?,
            max: parse_bound(max)?,
        })
    }

    pub fn contains(&self, load: f64) -> bool {
        self.min <= load && load <= self.max
    }
}

fn parse_bound(raw: &str) -> Option<f64> {
    parse_float_prefix(raw).filter(|value| value.is_finite())
}

/// Longest decimal number at the start of `raw` after leading whitespace.
/// Trailing text is ignored, so `"75%"` reads as 75 and `"100 load"` as 100.
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let whole = count_digits(&bytes[end..]);
    end += whole;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = count_digits(&bytes[end + 1..]);
        end += 1 + fraction;
    }
    if whole + fraction == 0 {
        return None;
    }

    // An exponent only counts once it has digits: "1e" reads as 1.
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let digits = count_digits(&bytes[exponent..]);
        if digits > 0 {
            end = exponent + digits;
        }
    }

    text[..end].parse().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|byte| byte.is_ascii_digit()).count()
}

/// Every range header in schema order.
pub fn range_headers(headers: &[String]) -> Vec<RangeHeader<'_>> {
    headers
        .iter()
        .filter_map(|header| RangeHeader::parse(header))
        .collect()
}

/// First range header, in schema order, whose interval holds `load`.
/// Overlapping ranges resolve to the earlier column, not the narrower one.
pub fn resolve_range_header(load: f64, headers: &[String]) -> Option<&str> {
    headers
        .iter()
        .filter_map(|header| RangeHeader::parse(header))
        .find(|range| range.contains(load))
        .map(|range| range.label)
}
