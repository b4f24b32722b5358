//! # fom
//!
//! A File Organization Model (FOM) describes where the files of a processing
//! pipeline live. Given a model, the engine turns attribute values
//! (`subject=s01`) into candidate paths (`s01/anat/s01_T1w.nii`), and turns a
//! path back into the attribute values it encodes.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐
//! │  CLI (bin) │  clap, tracing-subscriber, console rendering
//! └─────┬──────┘
//!       ▼
//! ┌────────────┐
//! │  api.rs    │  FomApi<S: SchemaSource>, input normalization
//! └─────┬──────┘
//!       ▼
//! ┌────────────┐
//! │ commands/  │  one module per operation, returns CmdResult
//! └─────┬──────┘
//!       ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │ engine: store/ → schema → model → pattern, paths, parse  │
//! │         completion (ProcessAttributes)                   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine does no output of its own. Filesystem access is confined to the
//! [`store::SchemaSource`] and [`listing::DirectoryListing`] implementations,
//! both of which have in-memory counterparts for tests.
//!
//! ## Using the engine directly
//!
//! ```no_run
//! use fom::store::{fs::FsSource, ModelStore};
//! use fom::attributes::AttributeValues;
//!
//! let mut store = ModelStore::new(FsSource::new(vec!["/usr/share/foms".into()]));
//! let model = store.get_model("bids")?;
//! let mut values = AttributeValues::new();
//! values.insert("subject".into(), "s01".into());
//! for candidate in model.find_paths("normalize", "t1", &values, None)? {
//!     println!("{}", candidate.path);
//! }
//! # Ok::<(), fom::error::FomError>(())
//! ```

pub mod api;
pub mod attributes;
pub mod commands;
pub mod completion;
pub mod config;
pub mod error;
pub mod init;
pub mod listing;
pub mod model;
pub mod parse;
pub mod paths;
pub mod pattern;
pub mod schema;
pub mod store;

pub use error::{FomError, Result, SchemaError};
pub use model::FileOrganizationModel;
