//! `facet`: a polyhedral map globe and papercraft exporter.
//!
//! Configuration is loaded from `config.ron` and overridden by CLI flags.
//! `facet --print` writes the shape's net as PNG pages and exits; otherwise a
//! window shows the textured solid.

mod data;
mod error;
mod print;
mod view;
mod window;

use std::process::ExitCode;

use clap::Parser;
use facet_config::{CliArgs, Config, default_config_dir};
use facet_shapes::ShapeKind;
use tracing::{error, info};

use crate::data::DataSet;
use crate::error::AppError;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("facet: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), AppError> {
    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .ok_or(AppError::NoConfigDir)?;

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(args);
    config.validate()?;

    let log_dir = (cfg!(debug_assertions) || args.print).then(|| config_dir.join("logs"));
    facet_log::init_logging(&config, log_dir.as_deref())?;
    info!(config = %config_dir.display(), shape = %config.view.shape, "facet starting");

    let kind: ShapeKind = config.view.shape.parse()?;
    let data = DataSet::open(&config)?;

    if args.print {
        let compositor = data::compositor(&config);
        let written = print::export_pages(&config, kind, &data, compositor.sheet())?;
        info!(pages = written.len(), dir = %config.print.output_dir.display(), "print export finished");
        return Ok(());
    }
    window::run(config, kind, &data)
}
