pub mod common;
mod engine_scenarios;
mod property;
