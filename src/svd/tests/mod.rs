//! Cross-stage tests for the SVD pipeline.
//!
//! These tests exercise extraction, decomposition, truncation,
//! reconstruction and combination together.

mod reference_tests;
