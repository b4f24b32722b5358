use crate::commands::{CmdMessage, CmdResult, ModelSummary};
use crate::error::Result;
use crate::store::{ModelStore, SchemaSource};

pub fn run<S: SchemaSource>(store: &mut ModelStore<S>) -> Result<CmdResult> {
    store.find_models()?;
    let locations = store.locations()?.to_vec();
    let models: Vec<ModelSummary> = locations
        .into_iter()
        .map(|location| ModelSummary {
            loaded: store.is_loaded(&location.name),
            name: location.name,
            path: location.path,
        })
        .collect();

    let mut result = CmdResult::default();
    if models.is_empty() {
        result.add_message(CmdMessage::info("No models found on the search path"));
    }
    Ok(result.with_models(models))
}
