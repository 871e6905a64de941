pub mod change;
pub mod context;
pub mod document;

// Canonical extraction from raw snapshots
pub mod accessors;

// Static field-path mappings and priority resolution
pub mod registry;

// Static effect-lookup tables (feats, races, classes)
pub mod tables;

// Per-facet change detectors + the engine that runs them
pub mod detect;

// Cause attribution for numeric stat changes
pub mod causation;

// Add/remove cancellation for id-unstable collections
pub mod reconcile;
