//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All console output from commands goes through this module so quiet and
//! debug modes behave the same everywhere. Diagnostic logging is separate
//! and goes through `tracing`.

pub mod output;
