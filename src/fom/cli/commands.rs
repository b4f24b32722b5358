//! # CLI Commands
//!
//! This module owns the process boundary of the `fom` binary:
//!
//! 1. **Parse arguments** with clap
//! 2. **Install logging**: tracing to stderr, filtered by `RUST_LOG`
//! 3. **Build the context**: search path, config and [`FomApi`]
//! 4. **Dispatch** each subcommand to its `handle_*` function
//! 5. **Print** rendered results (data to stdout, problems to stderr)
//!
//! Handlers never compute anything themselves; they call the API and render
//! the returned [`CmdResult`].

use super::render::{
    render_attributes, render_completions, render_config, render_discriminants, render_matches,
    render_message, render_models, render_scan,
};
use super::setup::{Cli, Commands};
use clap::Parser;
use fom::api::FomApi;
use fom::commands::config::ConfigAction;
use fom::commands::{CmdResult, MessageLevel};
use fom::error::Result;
use fom::init::initialize;
use fom::parse::ScanOptions;
use fom::store::fs::FsSource;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("fom=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = initialize(&cli.fom_path)?;
    let mut api = ctx.api;

    let result = match cli.command {
        Commands::Models => handle_models(&mut api),
        Commands::Attributes { model, process } => {
            handle_attributes(&mut api, &model, process.as_deref())
        }
        Commands::Discriminants {
            model,
            process,
            parameter,
        } => handle_discriminants(&mut api, &model, &process, &parameter),
        Commands::Complete {
            model,
            process,
            parameter,
            format,
            attributes,
        } => handle_complete(
            &mut api,
            &model,
            &process,
            parameter.as_deref(),
            &attributes,
            format.as_deref(),
        ),
        Commands::Parse {
            model,
            path,
            process,
            all,
        } => handle_parse(&mut api, &model, &path, process.as_deref(), all),
        Commands::Scan {
            model,
            dir,
            process,
            unknown,
            all,
        } => handle_scan(
            &mut api,
            &model,
            &dir,
            process.as_deref(),
            ScanOptions {
                include_unknown: unknown,
                all_matches: all,
            },
        ),
        Commands::Config { key, value } => handle_config(&mut api, key, value),
    }?;

    Ok(result)
}

/// Print messages and report failure when any of them is an error.
/// Info and success go to stdout, warnings and errors to stderr.
fn finish(result: &CmdResult) -> ExitCode {
    let mut failed = false;
    for message in &result.messages {
        let text = render_message(message);
        match message.level {
            MessageLevel::Info | MessageLevel::Success => print!("{}", text),
            MessageLevel::Warning => eprint!("{}", text),
            MessageLevel::Error => {
                failed = true;
                eprint!("{}", text);
            }
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn handle_models(api: &mut FomApi<FsSource>) -> Result<ExitCode> {
    let result = api.list_models()?;
    print!("{}", render_models(&result.models));
    Ok(finish(&result))
}

fn handle_attributes(
    api: &mut FomApi<FsSource>,
    model: &str,
    process: Option<&str>,
) -> Result<ExitCode> {
    let result = api.attributes(model, process)?;
    print!("{}", render_attributes(&result.attributes));
    Ok(finish(&result))
}

fn handle_discriminants(
    api: &mut FomApi<FsSource>,
    model: &str,
    process: &str,
    parameter: &str,
) -> Result<ExitCode> {
    let result = api.discriminants(model, process, parameter)?;
    print!("{}", render_discriminants(&result.discriminants));
    Ok(finish(&result))
}

fn handle_complete(
    api: &mut FomApi<FsSource>,
    model: &str,
    process: &str,
    parameter: Option<&str>,
    assignments: &[String],
    format: Option<&str>,
) -> Result<ExitCode> {
    let result = api.complete(model, process, parameter, assignments, format)?;
    print!(
        "{}",
        render_completions(&result.completions, parameter.is_some())
    );
    let code = finish(&result);
    // A single requested parameter with no candidate is a failed lookup
    if parameter.is_some() && result.completions.is_empty() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(code)
}

fn handle_parse(
    api: &mut FomApi<FsSource>,
    model: &str,
    path: &str,
    process: Option<&str>,
    all: bool,
) -> Result<ExitCode> {
    let result = api.parse(model, path, process, all)?;
    print!("{}", render_matches(&result.matches));
    let code = finish(&result);
    if result.matches.is_empty() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(code)
}

fn handle_scan(
    api: &mut FomApi<FsSource>,
    model: &str,
    dir: &Path,
    process: Option<&str>,
    options: ScanOptions,
) -> Result<ExitCode> {
    let result = api.scan(model, dir, process, options)?;
    print!("{}", render_scan(&result.scanned));
    Ok(finish(&result))
}

fn handle_config(
    api: &mut FomApi<FsSource>,
    key: Option<String>,
    value: Option<String>,
) -> Result<ExitCode> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(key), None) => ConfigAction::ShowKey(key),
        (Some(key), Some(value)) => ConfigAction::Set(key, value),
    };
    let show_all = matches!(action, ConfigAction::ShowAll);
    let result = api.config_action(action)?;
    if show_all {
        if let Some(config) = &result.config {
            print!("{}", render_config(config, &result.search_path));
        }
    }
    Ok(finish(&result))
}
