//! # bsl-lint-rules
//!
//! Built-in diagnostics for bsl-lint.
//!
//! ## Available Rules
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | BSL001 | `using-object-not-available-unix` | Flags `COMObject`/`Mail` created outside a Linux platform check |
//!
//! ## Usage
//!
//! ```ignore
//! use bsl_lint_core::Analyzer;
//! use bsl_lint_rules::UsingObjectNotAvailableUnix;
//!
//! let analyzer = Analyzer::builder()
//!     .root("./src")
//!     .rule(UsingObjectNotAvailableUnix::new())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod registry;
pub mod using_object_not_available_unix;

pub use registry::{all_rules, configured_rules};
pub use using_object_not_available_unix::{
    GuardResolver, TypeNameMatcher, UsingObjectNotAvailableUnix,
};

/// Re-export core types for convenience.
pub use bsl_lint_core::{Rule, Severity, Violation};
