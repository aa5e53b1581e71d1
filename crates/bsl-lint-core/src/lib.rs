//! # bsl-lint-core
//!
//! Core framework for linting 1C:Enterprise (BSL) and OneScript modules.
//!
//! This crate provides the foundational pieces for building BSL rules:
//!
//! - [`syntax`] with a bilingual lexer, a recursive-descent parser and an
//!   arena-backed [`SyntaxTree`](syntax::SyntaxTree) with a
//!   [`Visit`](syntax::visit::Visit) trait
//! - [`Rule`] trait for per-module rules
//! - [`Analyzer`] for orchestrating lint execution
//! - [`Violation`] for representing lint findings
//!
//! ## Example
//!
//! ```ignore
//! use bsl_lint_core::{Analyzer, Severity};
//!
//! let analyzer = Analyzer::builder()
//!     .root("./src")
//!     .rule(MyRule::new())
//!     .build()?;
//!
//! let result = analyzer.analyze()?;
//! for violation in &result.violations {
//!     println!("{violation}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod context;
mod language;
mod rule;
mod types;

pub mod syntax;

/// Utility modules for rule implementations.
pub mod utils;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use config::{AnalyzerConfig, Config, ConfigError, RuleConfig};
pub use context::FileContext;
pub use language::{MessageLanguage, SourceLanguage};
pub use rule::{DiagnosticKind, Rule, RuleBox, RuleMetadata, RuleScope};
pub use types::{LintResult, Location, Severity, Suggestion, Violation, ViolationDiagnostic};
pub use utils::allowance::AllowCheck;
