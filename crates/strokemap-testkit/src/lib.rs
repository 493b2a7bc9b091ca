// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::PathBuf;
use strokemap_app::Dataset;

/// Small hand-written dataset. Pump A appears twice, pump B has no value in
/// the `61-100%` column, and the range columns are declared high-first.
pub const SAMPLE_CSV: &str = "\
Feed pump,Destination,Inhibitor,Drum,61-100%,1-60%
Feed Pump A,Well 1,Scale,D-101,18,12
Feed Pump B,Well 2,Corrosion,D-102,,9
Booster C,Well 3,Scale,D-103,7,4
Feed Pump A,Well 4,Paraffin,D-104,22,15
";

pub const STROKE_RANGES: [&str; 5] = ["1-60%", "61-65%", "66-70%", "71-80%", "81-100%"];

const PUMP_PREFIXES: [&str; 4] = ["Feed Pump", "Booster", "Injection Pump", "Transfer Pump"];
const PUMP_TAGS: [&str; 8] = ["A", "B", "C", "D", "E", "F", "G", "H"];
const DESTINATIONS: [&str; 10] = [
    "Well 1",
    "Well 2",
    "Well 3",
    "Well 4",
    "Separator",
    "Flowline North",
    "Flowline South",
    "Heater Treater",
    "Tank Battery",
    "Compressor",
];
const INHIBITORS: [&str; 6] = [
    "Scale",
    "Corrosion",
    "Paraffin",
    "Biocide",
    "Hydrate",
    "Emulsion Breaker",
];

pub fn sample_dataset() -> Dataset {
    Dataset::parse(SAMPLE_CSV)
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for wide pump datasets.
#[derive(Debug, Clone)]
pub struct PlantFaker {
    rng: DeterministicRng,
}

impl PlantFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn pump_name(&mut self) -> String {
        let prefix = self.pick(&PUMP_PREFIXES);
        let tag = self.pick(&PUMP_TAGS);
        format!("{prefix} {tag}")
    }

    /// Text with `pumps` distinct pumps, each feeding one to three
    /// destinations. Roughly one stroke cell in ten is left blank.
    pub fn dataset_text(&mut self, pumps: usize) -> String {
        let mut lines = vec![format!(
            "Feed pump,Destination,Inhibitor,Drum,{}",
            STROKE_RANGES.join(",")
        )];

        let mut drum = 100;
        for index in 0..pumps {
            let name = format!("{}{}", self.pump_name(), index + 1);
            let feeds = 1 + self.int_n(3);
            for _ in 0..feeds {
                drum += 1;
                let mut cells = vec![
                    name.clone(),
                    self.pick(&DESTINATIONS).to_owned(),
                    self.pick(&INHIBITORS).to_owned(),
                    format!("D-{drum}"),
                ];
                let mut stroke = 5 + self.int_n(20);
                for _ in STROKE_RANGES {
                    stroke += self.int_n(8);
                    if self.int_n(10) == 0 {
                        cells.push(String::new());
                    } else {
                        cells.push(stroke.to_string());
                    }
                }
                lines.push(cells.join(","));
            }
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.int_n(values.len())]
    }
}

pub fn temp_dataset_path(contents: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("strokemap.csv");
    std::fs::write(&path, contents)
        .with_context(|| format!("write fixture dataset {}", path.display()))?;
    Ok((dir, path))
}
