//! Integration tests for Feed Scotty
//!
//! These tests use wiremock to serve pages and previous snapshots, and run
//! whole batches against a temporary output directory.

mod pipeline_tests;
