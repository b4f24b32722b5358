use crate::attributes::AttributeValues;
use crate::commands::{CmdMessage, CmdResult, ParameterCompletion};
use crate::config::FomConfig;
use crate::error::Result;
use crate::model::FileOrganizationModel;
use crate::paths::PathCandidate;
use crate::store::{ModelStore, SchemaSource};

/// Candidate paths for one parameter, or the first candidate of every
/// parameter of the process.
pub fn run<S: SchemaSource>(
    store: &mut ModelStore<S>,
    config: &FomConfig,
    model: &str,
    process: &str,
    parameter: Option<&str>,
    values: &AttributeValues,
    format: Option<&str>,
) -> Result<CmdResult> {
    let fom = store.get_model(model)?;
    let preferred = format.or_else(|| config.preferred_format());

    let parameters: Vec<String> = match parameter {
        Some(parameter) => vec![parameter.to_string()],
        None => fom
            .parameter_names(process)?
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    let mut result = CmdResult::default();
    let mut completions = Vec::with_capacity(parameters.len());
    for name in &parameters {
        let mut candidates: Vec<PathCandidate> =
            fom.find_paths(process, name, values, preferred)?.collect();
        if parameter.is_none() {
            candidates.truncate(1);
        }
        if candidates.is_empty() {
            result.add_message(CmdMessage::warning(explain_missing(
                &fom, process, name, values,
            )?));
            continue;
        }
        let resolved = candidates.iter().map(|c| c.resolve(&config.roots)).collect();
        completions.push(ParameterCompletion {
            parameter: name.clone(),
            candidates,
            resolved,
        });
    }
    Ok(result.with_completions(completions))
}

/// Why `parameter` has no candidate path.
fn explain_missing(
    fom: &FileOrganizationModel,
    process: &str,
    parameter: &str,
    values: &AttributeValues,
) -> Result<String> {
    let mut missing = Vec::new();
    let mut rejected = Vec::new();
    for name in fom.find_discriminant_attributes(process, parameter)? {
        let supplied = values.get(name).filter(|v| !v.is_empty());
        match supplied {
            None if fom.registry().get_default(name).is_none() => missing.push(name.as_str()),
            Some(value) => {
                let accepted = fom.registry().get(name).map_or(true, |d| d.accepts(value));
                if !accepted || value.contains('/') {
                    rejected.push(format!("{}={}", name, value));
                }
            }
            None => {}
        }
    }

    let mut reasons = Vec::new();
    if !missing.is_empty() {
        reasons.push(format!("missing {}", missing.join(", ")));
    }
    if !rejected.is_empty() {
        reasons.push(format!("invalid {}", rejected.join(", ")));
    }
    Ok(format!("No path for {}: {}", parameter, reasons.join("; ")))
}
