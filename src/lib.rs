//! Batch driver for the PhD-SNP point-mutation predictor: loads mutation
//! requests, runs the predictor over them through a bounded process pool
//! and collects the parsed prediction rows.

pub mod command;
pub mod error;
pub mod job;
pub mod loader;
pub mod output;
pub mod report;
pub mod scheduler;
