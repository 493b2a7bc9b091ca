// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::sync::mpsc::Sender;
use std::thread;
use strokemap_source::{DataSource, LoadedDataset, Loader};
use strokemap_tui::{AppRuntime, DatasetLoad, InternalEvent};
use time::macros::format_description;
use tracing::debug;

pub struct SourceRuntime {
    loader: Loader,
    source: DataSource,
}

impl SourceRuntime {
    pub fn new(loader: Loader, source: DataSource) -> Self {
        Self { loader, source }
    }
}

impl AppRuntime for SourceRuntime {
    fn source_label(&self) -> String {
        self.source.to_string()
    }

    fn load_dataset(&mut self) -> Result<DatasetLoad> {
        dataset_load(self.loader.load(&self.source)?)
    }

    fn spawn_dataset_load(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let loader = self.loader.clone();
        let source = self.source.clone();
        thread::Builder::new()
            .name("dataset-load".to_owned())
            .spawn(move || {
                let event = match loader.load(&source).and_then(dataset_load) {
                    Ok(load) => InternalEvent::DatasetLoaded(load),
                    Err(error) => InternalEvent::DatasetFailed(format!("{error:#}")),
                };
                if tx.send(event).is_err() {
                    debug!(%source, "dataset load finished after the UI exited");
                }
            })
            .context("spawn dataset load thread")?;
        Ok(())
    }
}

fn dataset_load(loaded: LoadedDataset) -> Result<DatasetLoad> {
    let clock = loaded
        .loaded_at
        .format(format_description!("[hour]:[minute]:[second]"))
        .context("format load time")?;
    let summary = format!("{} at {clock} UTC", loaded.summary());
    Ok(DatasetLoad {
        dataset: loaded.dataset,
        summary,
    })
}
