use thiserror::Error;

/// Problems found while loading or compiling a schema.
///
/// Every variant aborts model construction: no half-loaded model is ever
/// handed out.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Malformed schema {origin}: {source}")]
    Malformed {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Pattern '{pattern}' references undeclared directory '{{{name}}}'")]
    UndeclaredDirectory { pattern: String, name: String },

    #[error("Pattern '{pattern}' references undeclared attribute '<{name}>'")]
    UndeclaredAttribute { pattern: String, name: String },

    #[error("Directory name '{0}' is already used for an attribute")]
    NameCollision(String),

    #[error("Directory '{directory}' references another directory '{{{name}}}'")]
    NestedDirectory { directory: String, name: String },

    #[error("Conflicting values for '{key}' while merging {origin}")]
    MergeConflict { key: String, origin: String },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Default value '{default}' of attribute '{attribute}' is not one of its declared values")]
    InvalidDefault { attribute: String, default: String },

    #[error("Import cycle through model '{0}'")]
    ImportCycle(String),

    #[error("Model '{model}' imports unknown model '{import}'")]
    UnknownImport { model: String, import: String },
}

#[derive(Error, Debug)]
pub enum FomError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error(
        "Attribute '{attribute}' has conflicting defaults ({first:?} vs {second:?}) and no merge policy was chosen"
    )]
    AmbiguousMerge {
        attribute: String,
        first: Option<String>,
        second: Option<String>,
    },

    #[error("Model not found: {0}")]
    UnknownModel(String),

    #[error("Process '{process}' is not declared in model '{model}'")]
    UnknownProcess { model: String, process: String },

    #[error("Parameter '{parameter}' is not declared for process '{process}'")]
    UnknownParameter { process: String, parameter: String },

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Invalid attribute assignment '{0}', expected key=value")]
    InvalidAssignment(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FomError>;
