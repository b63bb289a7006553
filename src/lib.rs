//! HARVESTCAST — Crop-Yield Feature Pipeline
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod resolver;
pub mod weather;
pub mod predict;
pub mod engine;
