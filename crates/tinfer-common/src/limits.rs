//! Centralized limits and thresholds for inference.
//!
//! These are defaults; `SolverConfig` can override the solver-facing ones.

/// Maximum nesting of subtype checks before the check gives up and answers
/// `false`.
///
/// Re-entrant checks of the same pair answer `true` long before this is hit;
/// the depth limit only guards against types that grow as they recurse.
pub const MAX_SUBTYPE_DEPTH: u32 = 100;

/// Maximum number of subtype steps within one top-level check. Running out
/// answers `false`.
pub const MAX_SUBTYPE_ITERATIONS: u32 = 100_000;

/// Maximum number of rounds of the solver's fixed-point loop.
///
/// Every round either narrows a monotonic bound set or commits a node, so
/// real inputs finish far below this.
pub const MAX_SOLVE_ROUNDS: u32 = 10_000;

/// Maximum number of distinct types collected into one supertype tree.
///
/// Declarations like `C<T> extends C<List<T>>` would otherwise expand forever.
pub const MAX_SUPERTYPE_TREE_SIZE: usize = 4096;
