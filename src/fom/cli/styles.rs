use console::Style;
use once_cell::sync::Lazy;

pub static NAME: Lazy<Style> = Lazy::new(|| Style::new().bold());
pub static PATH: Lazy<Style> = Lazy::new(|| Style::new().cyan());
pub static KEY: Lazy<Style> = Lazy::new(|| Style::new().yellow());
pub static DIM: Lazy<Style> = Lazy::new(|| Style::new().color256(245).italic());
pub static INFO: Lazy<Style> = Lazy::new(|| Style::new().dim());
pub static SUCCESS: Lazy<Style> = Lazy::new(|| Style::new().green());
pub static WARNING: Lazy<Style> = Lazy::new(|| Style::new().yellow());
pub static ERROR: Lazy<Style> = Lazy::new(|| Style::new().red());
