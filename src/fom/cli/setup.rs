use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Returns the version string, with the git hash for non-release builds.
/// Format: "0.3.2" for releases, "0.3.2@abc1234 2024-01-15 14:30" otherwise
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(name = "fom", bin_name = "fom", version = get_version())]
#[command(
    about = "Complete file paths from attributes, and recover attributes from paths",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Model directory to search (repeatable, replaces the configured search path)
    #[arg(long = "fom-path", value_name = "DIR", global = true)]
    pub fom_path: Vec<PathBuf>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List models found on the search path
    #[command(alias = "ls", display_order = 1)]
    Models,

    /// Show attribute definitions of a model
    #[command(display_order = 2)]
    Attributes {
        model: String,

        /// Only attributes used by this process
        #[arg(short, long)]
        process: Option<String>,
    },

    /// Show the attributes a parameter's path depends on
    #[command(display_order = 3)]
    Discriminants {
        model: String,
        process: String,
        parameter: String,
    },

    /// Complete paths from attribute values
    #[command(display_order = 4)]
    Complete {
        model: String,
        process: String,

        /// Every candidate of one parameter (default: first candidate of each)
        #[arg(short = 'p', long)]
        parameter: Option<String>,

        /// Preferred format name or extension
        #[arg(short, long)]
        format: Option<String>,

        /// Attribute value, e.g. -a subject=s01
        #[arg(short = 'a', long = "attr", value_name = "KEY=VALUE")]
        attributes: Vec<String>,
    },

    /// Recover attribute values from a path
    #[command(display_order = 5)]
    Parse {
        model: String,
        path: String,

        /// Only try this process
        #[arg(short, long)]
        process: Option<String>,

        /// Show every matching rule
        #[arg(long)]
        all: bool,
    },

    /// Walk a directory and show recognized files
    #[command(display_order = 6)]
    Scan {
        model: String,
        dir: PathBuf,

        /// Only try this process
        #[arg(short, long)]
        process: Option<String>,

        /// Also list unrecognized entries
        #[arg(long)]
        unknown: bool,

        /// Show every matching rule per entry
        #[arg(long)]
        all: bool,
    },

    /// Show or change configuration
    #[command(display_order = 7)]
    Config {
        /// fom_path, preferred_formats or roots.<name>
        key: Option<String>,

        /// New value (comma-separated for lists)
        value: Option<String>,
    },
}
