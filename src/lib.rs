//! repobench library
//!
//! Exposed for integration tests and embedding; the binary in `main.rs` is a
//! thin clap front end over [`cli::run`].

pub mod ai;
pub mod assessors;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod git;
pub mod history;
pub mod models;
pub mod parsers;
pub mod reporters;
pub mod scoring;
