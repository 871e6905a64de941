/// Sheetdiff - Semantic Change Detection for Tabletop Character Sheets
///
/// Core library that compares two time-ordered snapshots of a character
/// document (an arbitrarily-shaped, schema-drifting JSON tree) and produces
/// ordered, categorized, prioritized change records with best-effort
/// causation attribution.

pub mod config;
pub mod core;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
