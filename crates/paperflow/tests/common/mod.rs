//! Shared test utilities for paperflow integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs against temporary `input/`, `output/`
//!   and `processed/` directories
//! - Fakes for the external collaborators (renderer, recognition engine,
//!   whole-document OCR tool)
//! - Builders for fixture PDFs

pub mod builders;
pub mod fakes;
pub mod harness;

pub use builders::*;
pub use fakes::*;
pub use harness::*;
