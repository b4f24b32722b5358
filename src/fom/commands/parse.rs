use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::{ModelStore, SchemaSource};

/// Attributes recovered from `path`, trying one process or all of them.
pub fn run<S: SchemaSource>(
    store: &mut ModelStore<S>,
    model: &str,
    path: &str,
    process: Option<&str>,
    all: bool,
) -> Result<CmdResult> {
    let fom = store.get_model(model)?;
    let matches = if all {
        fom.parse_path_all(process, path)?
    } else {
        let found = match process {
            Some(process) => fom.parse_path(process, path)?,
            None => fom.parse_path_any(path)?,
        };
        found.into_iter().collect()
    };

    let mut result = CmdResult::default();
    if matches.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "{} is not recognized by model {}",
            path, model
        )));
    }
    Ok(result.with_matches(matches))
}
