//! AWS-oriented adapters and handlers for the shortest-path table refresh.
//!
//! This crate owns runtime integration details (the Lambda handler, the
//! DynamoDB store adapter, environment configuration and log setup). Graph
//! parsing, distances and the materialization protocol live in
//! `path_matrix_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
