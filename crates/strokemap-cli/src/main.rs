// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod output;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use logging::LogTarget;
use output::OutputFormat;
use runtime::SourceRuntime;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use strokemap_app::{AppCommand, AppState, Query, on_query_changed, range_headers};
use strokemap_source::{DataSource, LoadedDataset, Loader};
use tracing::{info, warn};

/// Exit status when a headless query fails validation.
const FILTER_ERROR_EXIT: u8 = 2;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(ExitCode::SUCCESS);
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(ExitCode::SUCCESS);
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(ExitCode::SUCCESS);
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `strokemap --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let log_target = if options.is_interactive() {
        LogTarget::File(config.log_file()?)
    } else {
        LogTarget::Stderr
    };
    logging::init(config.log_level(), &log_target)?;

    let source = if options.demo {
        DataSource::Demo
    } else {
        config.data_source(options.data.as_deref())?
    };
    let loader = Loader::new(config.timeout()?).with_context(|| {
        format!(
            "invalid [source] config in {}; fix the timeout value",
            options.config_path.display()
        )
    })?;
    let fields = config.field_map();

    if options.check_only {
        let loaded = loader.load(&source)?;
        check_dataset(&loaded, &config)?;
        println!("{}", loaded.summary());
        return Ok(ExitCode::SUCCESS);
    }

    if options.list_ranges {
        let loaded = loader.load(&source)?;
        print!("{}", output::render_ranges(loaded.dataset.headers()));
        return Ok(ExitCode::SUCCESS);
    }

    if options.is_headless() {
        let loaded = loader.load(&source)?;
        warn_missing_columns(&loaded, &config);
        let query = Query::new(
            options
                .load
                .clone()
                .unwrap_or_else(|| config.default_load().to_owned()),
            options.search.clone().unwrap_or_default(),
        );
        let view = on_query_changed(&loaded.dataset, &query, &fields, config.view_mode());
        print!(
            "{}",
            output::render_view(&view, &fields, options.format.unwrap_or_default())?
        );
        if view.error.is_some() {
            return Ok(ExitCode::from(FILTER_ERROR_EXIT));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut state = AppState {
        view_mode: config.view_mode(),
        ..AppState::default()
    };
    if !config.default_load().is_empty() {
        state.dispatch(AppCommand::SetLoad(config.default_load().to_owned()));
    }

    info!(%source, config = %options.config_path.display(), "starting interactive session");
    let mut runtime = SourceRuntime::new(loader, source);
    strokemap_tui::run_app(&mut state, &mut runtime, fields)?;
    Ok(ExitCode::SUCCESS)
}

fn check_dataset(loaded: &LoadedDataset, config: &Config) -> Result<()> {
    let fields = config.field_map();
    let missing = fields.missing_from(loaded.dataset.headers());
    if !missing.is_empty() {
        bail!(
            "dataset {} has no column(s) {}; set [columns] to match its header line",
            loaded.source,
            missing.join(", ")
        );
    }
    if range_headers(loaded.dataset.headers()).is_empty() {
        bail!(
            "dataset {} has no range columns; expected headers like \"1-60%\"",
            loaded.source
        );
    }
    Ok(())
}

fn warn_missing_columns(loaded: &LoadedDataset, config: &Config) {
    let fields = config.field_map();
    let missing = fields.missing_from(loaded.dataset.headers());
    if !missing.is_empty() {
        warn!(source = %loaded.source, missing = ?missing, "configured columns not in dataset");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    data: Option<String>,
    demo: bool,
    load: Option<String>,
    search: Option<String>,
    format: Option<OutputFormat>,
    list_ranges: bool,
    check_only: bool,
    print_config_path: bool,
    print_example: bool,
    show_help: bool,
}

impl CliOptions {
    fn is_headless(&self) -> bool {
        self.load.is_some() || self.search.is_some() || self.format.is_some()
    }

    fn is_interactive(&self) -> bool {
        !(self.is_headless() || self.list_ranges || self.check_only)
    }
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        data: None,
        demo: false,
        load: None,
        search: None,
        format: None,
        list_ranges: false,
        check_only: false,
        print_config_path: false,
        print_example: false,
        show_help: false,
    };

    let mut iter = args.into_iter().map(|arg| arg.as_ref().to_owned());
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                options.config_path =
                    PathBuf::from(required_value(&mut iter, "--config", "a file path")?);
            }
            "--data" => {
                options.data = Some(required_value(
                    &mut iter,
                    "--data",
                    "a file path or http(s) URL",
                )?);
            }
            "--load" => {
                options.load = Some(required_value(&mut iter, "--load", "a number")?);
            }
            "--search" => {
                options.search = Some(required_value(&mut iter, "--search", "a search term")?);
            }
            "--format" => {
                let raw = required_value(&mut iter, "--format", "table, cards, or json")?;
                options.format = Some(OutputFormat::parse(&raw)?);
            }
            "--demo" => {
                options.demo = true;
            }
            "--ranges" => {
                options.list_ranges = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.demo && options.data.is_some() {
        bail!("--demo and --data are mutually exclusive; pick one data source");
    }

    Ok(options)
}

fn required_value(
    iter: &mut impl Iterator<Item = String>,
    flag: &str,
    what: &str,
) -> Result<String> {
    iter.next()
        .ok_or_else(|| anyhow!("{flag} requires {what}"))
}

fn print_help() {
    println!("strokemap: feed pump stroke lookup");
    println!("  --config <path>          Use a specific config path");
    println!("  --data <path|url>        Load the dataset from a file or http(s) URL");
    println!("  --demo                   Use the built-in demo dataset");
    println!("  --load <percent>         Query mode: pick the stroke column for this load");
    println!("  --search <term>          Query mode: filter pumps by name");
    println!("  --format <fmt>           Query mode output: table, cards, or json");
    println!("  --ranges                 List the dataset's load range columns");
    println!("  --check                  Validate config + dataset, then exit");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --help                   Show this help");
    println!();
    println!("Without query flags, strokemap opens the interactive viewer.");
}
