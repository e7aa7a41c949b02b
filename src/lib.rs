//! # oxidized-rules
//!
//! Conformance checker for AI assistant rule files.
//!
//! `oxidized-rules` reads `.mdc` rule files and free-form `.md` guides, checks
//! their front-matter, the XML-like `<rule>` body, and every `<example>`
//! block, then reports each deviation with a line reference. Reports render
//! as colored text, JSON, JSON Lines, or [SARIF].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use oxidized_rules::{config::Config, lint, output};
//!
//! let config = Config::load(None).expect("failed to load config");
//! let batch = lint::run(&[PathBuf::from(".cursor/rules")], &config).expect("check failed");
//!
//! if !batch.passed {
//!     let text = output::format_report(&batch, &output::OutputFormat::Text);
//!     print!("{text}");
//! }
//! ```
//!
//! ## Architecture
//!
//! 1. **[`config`]**: load and validate configuration from TOML files.
//! 2. **[`markup`]**: tokenize the XML-like rule body and find code fences.
//! 3. **[`checks`]**: front-matter, structure, and example checks.
//! 4. **[`lint`]**: discover files and check them in parallel.
//! 5. **[`finding`]** and **[`document`]**: core data types.
//! 6. **[`output`]**: format reports.
//!
//! [SARIF]: https://sarifweb.azurewebsites.net/

pub mod checks;
pub mod config;
pub mod document;
pub mod error;
pub mod finding;
pub mod lint;
pub mod markup;
pub mod output;
