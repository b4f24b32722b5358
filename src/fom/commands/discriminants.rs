use crate::commands::CmdResult;
use crate::error::Result;
use crate::store::{ModelStore, SchemaSource};

pub fn run<S: SchemaSource>(
    store: &mut ModelStore<S>,
    model: &str,
    process: &str,
    parameter: &str,
) -> Result<CmdResult> {
    let fom = store.get_model(model)?;
    let discriminants = fom
        .find_discriminant_attributes(process, parameter)?
        .to_vec();
    Ok(CmdResult::default().with_discriminants(discriminants))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FomError;
    use crate::store::memory::fixtures::sample_store;

    #[test]
    fn test_discriminants() {
        let mut store = sample_store();
        let res = run(&mut store, "sample", "segment", "mask").unwrap();
        assert_eq!(
            res.discriminants,
            vec!["protocol", "subject", "modality", "analysis"]
        );
    }

    #[test]
    fn test_unknown_parameter() {
        let mut store = sample_store();
        assert!(matches!(
            run(&mut store, "sample", "segment", "nothing"),
            Err(FomError::UnknownParameter { .. })
        ));
    }
}
