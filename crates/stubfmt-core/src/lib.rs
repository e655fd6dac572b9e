//! stubfmt core - blank-line and stub-collapse normalizer for
//! declaration-only source files
//!
//! Decides which placeholder-bodied declarations render on one line and how
//! many blank lines (0 or 1) separate every pair of adjacent statements at
//! every nesting depth.
//!
//! # Architecture
//!
//! ```text
//! Text → Parser → Block → Verifier (structure) → Suite Walker → Lines → Text
//!                              ↓                       ↓
//!                 Classifier · Stub Detector · Resolver · Arbiter · Collapse
//!                                                      ↓
//!                                    Verifier (stability + equivalence)
//! ```
//!
//! # Guarantees
//!
//! - **Idempotent**: formatting formatted output is a no-op
//! - **Deterministic**: same input and config always produce identical output
//! - **Order preserving**: no statement is ever moved
//! - **Bounded**: emitted blank-line runs never exceed one line

pub mod classify;
pub mod collapse;
pub mod config;
pub mod error;
pub mod merge;
pub mod normalizer;
pub mod parser;
pub mod spacing;
pub mod stub;
pub mod verifier;

pub use config::FormatConfig;
pub use error::{Error, Result};
pub use merge::MergeKind;
pub use normalizer::{fingerprint, format_file_contents, format_str, normalize, RenderedItem};
pub use parser::ast::{Block, Category, Kind, PairedClause, StatementNode};
pub use parser::parse;
pub use parser::tokenizer::Span;

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
