//! Terminal rendering of command results.
//!
//! Every function returns the text to print. Styling goes through
//! [`console::Style`], which drops escape codes when the output is not a
//! terminal, so piped output is plain text.

use super::styles::{DIM, ERROR, INFO, KEY, NAME, PATH, SUCCESS, WARNING};
use fom::attributes::{AttributeDefinition, AttributeValues};
use fom::commands::{CmdMessage, MessageLevel, ModelSummary, ParameterCompletion};
use fom::config::FomConfig;
use fom::parse::{PathMatch, ScanItem};
use std::fmt::Write;
use std::path::PathBuf;
use unicode_width::UnicodeWidthStr;

/// Pads `text` with spaces to `width` display columns.
fn pad(text: &str, width: usize) -> String {
    let missing = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(missing))
}

fn column_width<'a>(items: impl Iterator<Item = &'a str>) -> usize {
    items.map(UnicodeWidthStr::width).max().unwrap_or(0)
}

fn format_values(values: &AttributeValues) -> String {
    values
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_models(models: &[ModelSummary]) -> String {
    let width = column_width(models.iter().map(|m| m.name.as_str()));
    let mut out = String::new();
    for model in models {
        let marker = if model.loaded { " (loaded)" } else { "" };
        let _ = writeln!(
            out,
            "{}  {}{}",
            NAME.apply_to(pad(&model.name, width)),
            PATH.apply_to(model.path.display()),
            DIM.apply_to(marker)
        );
    }
    out
}

pub fn render_attributes(attributes: &[AttributeDefinition]) -> String {
    let width = column_width(attributes.iter().map(|a| a.name.as_str()));
    let mut out = String::new();
    for attribute in attributes {
        let mut details = Vec::new();
        if let Some(default) = &attribute.default {
            details.push(format!("default={}", default));
        }
        if let Some(values) = &attribute.values {
            details.push(format!("values=[{}]", values.join(", ")));
        }
        let _ = write!(
            out,
            "{}  {}",
            KEY.apply_to(pad(&attribute.name, width)),
            details.join("  ")
        );
        if let Some(description) = &attribute.description {
            let _ = write!(out, "  {}", DIM.apply_to(description));
        }
        out.push('\n');
    }
    out
}

pub fn render_discriminants(names: &[String]) -> String {
    names.iter().map(|n| format!("{}\n", n)).collect()
}

/// One resolved path per line for a single parameter, `parameter  path`
/// lines otherwise.
pub fn render_completions(completions: &[ParameterCompletion], single: bool) -> String {
    let mut out = String::new();
    if single {
        for completion in completions {
            for path in &completion.resolved {
                let _ = writeln!(out, "{}", path.display());
            }
        }
        return out;
    }
    let width = column_width(completions.iter().map(|c| c.parameter.as_str()));
    for completion in completions {
        if let Some(path) = completion.resolved.first() {
            let _ = writeln!(
                out,
                "{}  {}",
                KEY.apply_to(pad(&completion.parameter, width)),
                PATH.apply_to(path.display())
            );
        }
    }
    out
}

fn match_heading(found: &PathMatch) -> String {
    let mut heading = format!("{}.{}", found.process, found.parameter);
    if let Some(root) = &found.root {
        let _ = write!(heading, " [root {}]", root);
    }
    match (&found.format, &found.extension) {
        (Some(format), Some(ext)) if format != ext => {
            let _ = write!(heading, " ({} .{})", format, ext);
        }
        (_, Some(ext)) => {
            let _ = write!(heading, " (.{})", ext);
        }
        _ => {}
    }
    heading
}

pub fn render_matches(matches: &[PathMatch]) -> String {
    let mut out = String::new();
    for found in matches {
        let _ = writeln!(out, "{}", NAME.apply_to(match_heading(found)));
        let width = column_width(
            found
                .attributes
                .keys()
                .chain(found.fixed.keys())
                .map(String::as_str),
        );
        for (name, value) in &found.attributes {
            let _ = writeln!(out, "  {}  {}", KEY.apply_to(pad(name, width)), value);
        }
        for (name, value) in &found.fixed {
            let _ = writeln!(
                out,
                "  {}  {} {}",
                KEY.apply_to(pad(name, width)),
                value,
                DIM.apply_to("(fixed)")
            );
        }
    }
    out
}

pub fn render_scan(items: &[ScanItem]) -> String {
    let width = column_width(items.iter().map(|i| i.path.as_str()));
    let mut out = String::new();
    for item in items {
        let path = pad(&item.path, width);
        match &item.recognized {
            Some(found) => {
                let _ = writeln!(
                    out,
                    "{}  {}  {}",
                    PATH.apply_to(path),
                    NAME.apply_to(format!("{}.{}", found.process, found.parameter)),
                    format_values(&found.attributes)
                );
            }
            None => {
                let _ = writeln!(out, "{}  {}", DIM.apply_to(path), DIM.apply_to("?"));
            }
        }
    }
    out
}

pub fn render_config(config: &FomConfig, search_path: &[PathBuf]) -> String {
    let mut rows: Vec<(String, String)> = vec![
        ("fom_path".to_string(), config.get("fom_path").unwrap_or_default()),
        (
            "preferred_formats".to_string(),
            config.get("preferred_formats").unwrap_or_default(),
        ),
    ];
    rows.extend(
        config
            .roots
            .iter()
            .map(|(name, path)| (format!("roots.{}", name), path.display().to_string())),
    );
    let width = column_width(rows.iter().map(|(k, _)| k.as_str()));

    let mut out = String::new();
    for (key, value) in &rows {
        let _ = writeln!(out, "{}  {}", KEY.apply_to(pad(key, width)), value);
    }
    if !search_path.is_empty() {
        let _ = writeln!(out, "\n{}", NAME.apply_to("search path:"));
        for dir in search_path {
            let _ = writeln!(out, "  {}", PATH.apply_to(dir.display()));
        }
    }
    out
}

pub fn render_message(message: &CmdMessage) -> String {
    let styled = match message.level {
        MessageLevel::Info => INFO.apply_to(&message.content),
        MessageLevel::Success => SUCCESS.apply_to(&message.content),
        MessageLevel::Warning => WARNING.apply_to(&message.content),
        MessageLevel::Error => ERROR.apply_to(&message.content),
    };
    format!("{}\n", styled)
}
