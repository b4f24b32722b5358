use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::{ModelStore, SchemaSource};

pub fn run<S: SchemaSource>(
    store: &mut ModelStore<S>,
    model: &str,
    process: Option<&str>,
) -> Result<CmdResult> {
    let fom = store.get_model(model)?;
    let attributes: Vec<_> = fom.attributes(process)?.into_iter().cloned().collect();

    let mut result = CmdResult::default();
    if attributes.is_empty() {
        result.add_message(CmdMessage::info(match process {
            Some(process) => format!("Process {} uses no attributes", process),
            None => format!("Model {} declares no attributes", model),
        }));
    }
    Ok(result.with_attributes(attributes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FomError;
    use crate::store::memory::fixtures::sample_store;

    #[test]
    fn test_all_attributes() {
        let mut store = sample_store();
        let res = run(&mut store, "sample", None).unwrap();
        let names: Vec<&str> = res.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["protocol", "subject", "analysis", "modality"]);
        assert_eq!(res.attributes[0].description.as_deref(), Some("study protocol"));
    }

    #[test]
    fn test_process_attributes() {
        let mut store = sample_store();
        let res = run(&mut store, "sample", Some("normalize")).unwrap();
        let names: Vec<&str> = res.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["subject", "analysis"]);
    }

    #[test]
    fn test_process_without_parameters() {
        let mut store = sample_store();
        let res = run(&mut store, "sample", Some("empty")).unwrap();
        assert!(res.attributes.is_empty());
        assert_eq!(res.messages.len(), 1);
    }

    #[test]
    fn test_unknown_model() {
        let mut store = sample_store();
        assert!(matches!(
            run(&mut store, "missing", None),
            Err(FomError::UnknownModel(_))
        ));
    }
}
