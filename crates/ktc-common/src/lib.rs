//! Common types and utilities for the ktc compiler front-end.
//!
//! This crate provides foundational types used across all ktc crates:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`)
//! - Diagnostics, codes and message templates
//! - Compiler limits and thresholds
//! - Small insertion-ordered containers (`SmartMap`, `SmartSet`)

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Centralized limits and thresholds
pub mod limits;

// Diagnostics and message templates
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticMessage, diagnostic_codes, format_message,
    get_message_template,
};

// Small ordered containers with an array -> hash switch-over
pub mod collections;
pub use collections::{SmartMap, SmartSet, merge_maps, merge_maps_into_first};
