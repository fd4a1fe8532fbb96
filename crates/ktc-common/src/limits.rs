//! Centralized limits and thresholds for the ktc front-end.
//!
//! Recursion limits for the type solver live in
//! `ktc_solver::recursion::RecursionProfile`; the values here are the
//! constants shared by more than one crate.

// =============================================================================
// Container thresholds
// =============================================================================

/// Size at which `SmartMap` and `SmartSet` leave the array representation.
///
/// Inserting a new key into a container already holding
/// `SMALL_COLLECTION_THRESHOLD - 1` entries switches it to the hash-backed
/// representation, so the array form never holds more than 4 entries.
pub const SMALL_COLLECTION_THRESHOLD: usize = 5;

// =============================================================================
// Recursion depth limits (checker)
// =============================================================================

/// Maximum nesting depth the pseudocode builder follows in a single body.
///
/// Deeper expressions are truncated (treated as an opaque value) rather than
/// overflowing the stack.
pub const MAX_PSEUDOCODE_NESTING: u32 = 512;

// =============================================================================
// Operation counts
// =============================================================================

/// Upper bound on dataflow worklist iterations per pseudocode graph,
/// expressed as a multiple of the instruction count.
///
/// The initialization lattice has height 2, so a well-formed graph stabilizes
/// long before this; the bound only guards malformed edges.
pub const DATAFLOW_ITERATION_FACTOR: usize = 8;

/// Upper bound on override-chain nodes visited by one traversal.
pub const MAX_OVERRIDE_TRAVERSAL: usize = 10_000;
