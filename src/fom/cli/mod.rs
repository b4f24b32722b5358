//! # CLI Layer
//!
//! The `fom` binary is one client of the library. This module is the only
//! place that:
//! - parses arguments (clap)
//! - installs the tracing subscriber
//! - writes to stdout/stderr
//!
//! ## Structure
//!
//! - `setup.rs`: clap definitions and version string
//! - `commands.rs`: `run()`, context setup, one `handle_*` per subcommand
//! - `render.rs`: `CmdResult` pieces to terminal strings
//! - `styles.rs`: console styles used by the renderers
//!
//! Renderers return `String`s so output can be tested without a terminal.

pub mod commands;
pub mod render;
pub mod setup;
pub mod styles;
