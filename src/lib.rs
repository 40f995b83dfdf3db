//! health-export-etl library
//!
//! This crate provides the core functionality for the `health-etl` binary.
//! Keep the crate root minimal; implementation and tests live in their modules.
//!
//! ## Overview
//!
//! An Apple Health `export.xml` is streamed once, element by element, and the
//! elements of interest are projected into flat CSV tables:
//!
//! - [`parser`] - Streams element-end events and classifies them into table rows
//! - [`sink`] - Writes rows to plain or gzip-compressed CSV files
//! - [`progress`] - Periodic progress lines keyed on the record count
//! - [`pipeline`] - Runs one document through parser and sinks
//! - [`cli`] - Command-line interface and TOML-driven runs
//! - [`models`] - Element records, output tables, rows and counters
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use health_export_etl::{errors::AppResult, pipeline};
//! use std::path::PathBuf;
//!
//! # fn example() -> AppResult<()> {
//! let config = pipeline::RunConfig {
//!     source: PathBuf::from("export.xml"),
//!     steps_path: Some(PathBuf::from("data/steps.csv.gz")),
//!     workouts_path: Some(PathBuf::from("data/workouts.csv")),
//!     progress_every: 250_000,
//! };
//! let counters = pipeline::run(&config)?;
//! println!("steps: {}", counters.steps);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod logging;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod progress;
pub mod shutdown;
pub mod sink;
pub mod utils;
