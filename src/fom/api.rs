//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer. It is the single
//! entry point for fom operations, whatever the client.
//!
//! The facade:
//! - **Dispatches** to the matching `commands::*::run`
//! - **Normalizes inputs** (`key=value` strings to attribute values, paths to
//!   listings)
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! It never prints, exits or reads the environment: the host builds the
//! search path and configuration (see `init.rs`) and passes them in.
//!
//! ## Generic Over SchemaSource
//!
//! `FomApi<S: SchemaSource>` is generic over where schemas come from:
//! - Production: `FomApi<FsSource>`
//! - Testing: `FomApi<MemorySource>`
//!
//! Engine callers that want models directly (a GUI, a pipeline executor) use
//! [`FomApi::model`] and work with [`FileOrganizationModel`] itself.

use crate::commands::{self, config::ConfigAction, CmdResult, FomPaths};
use crate::config::FomConfig;
use crate::error::Result;
use crate::listing::fs::FsListing;
use crate::model::FileOrganizationModel;
use crate::parse::ScanOptions;
use crate::store::{ModelStore, SchemaSource};
use std::path::Path;
use std::rc::Rc;

pub struct FomApi<S: SchemaSource> {
    store: ModelStore<S>,
    config: FomConfig,
    paths: FomPaths,
}

impl<S: SchemaSource> FomApi<S> {
    pub fn new(source: S, config: FomConfig, paths: FomPaths) -> Self {
        Self {
            store: ModelStore::new(source),
            config,
            paths,
        }
    }

    pub fn model(&mut self, name: &str) -> Result<Rc<FileOrganizationModel>> {
        self.store.get_model(name)
    }

    pub fn list_models(&mut self) -> Result<CmdResult> {
        commands::models::run(&mut self.store)
    }

    pub fn attributes(&mut self, model: &str, process: Option<&str>) -> Result<CmdResult> {
        commands::attributes::run(&mut self.store, model, process)
    }

    pub fn discriminants(
        &mut self,
        model: &str,
        process: &str,
        parameter: &str,
    ) -> Result<CmdResult> {
        commands::discriminants::run(&mut self.store, model, process, parameter)
    }

    pub fn complete<I: AsRef<str>>(
        &mut self,
        model: &str,
        process: &str,
        parameter: Option<&str>,
        assignments: &[I],
        format: Option<&str>,
    ) -> Result<CmdResult> {
        let values = commands::parse_assignments(assignments)?;
        commands::complete::run(
            &mut self.store,
            &self.config,
            model,
            process,
            parameter,
            &values,
            format,
        )
    }

    pub fn parse(
        &mut self,
        model: &str,
        path: &str,
        process: Option<&str>,
        all: bool,
    ) -> Result<CmdResult> {
        commands::parse::run(&mut self.store, model, path, process, all)
    }

    pub fn scan(
        &mut self,
        model: &str,
        dir: &Path,
        process: Option<&str>,
        options: ScanOptions,
    ) -> Result<CmdResult> {
        commands::scan::run(&mut self.store, model, FsListing::new(dir), process, options)
    }

    pub fn config_action(&mut self, action: ConfigAction) -> Result<CmdResult> {
        let result = commands::config::run(&self.paths, action)?;
        if let Some(config) = &result.config {
            self.config = config.clone();
        }
        Ok(result)
    }
}
