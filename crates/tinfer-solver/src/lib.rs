//! Constraint-based type inference for nominal generic types.
//!
//! This crate resolves the types and overloads of individual call sites.
//! The work is split into a few layers:
//!
//! - **Type model** (`def`, `types`, `signature`, `category`, `mapper`):
//!   definitions, type values with nullity and Never normalization,
//!   signatures, and one-pass binding substitution.
//! - **Lattice queries** (`supertype_tree`, `context`): subtype tests,
//!   least/greatest bounds, shortest inheritance paths, overload specificity.
//!   A `TypeContext` is safe to share across threads.
//! - **Constraint solving** (`constraint`, `bounds`, `reconcile`, `solver`):
//!   a constraint graph iterated to a fixed point, with overload narrowing and
//!   forced choice when propagation stalls.
//! - **Driver** (`infer`): turns call descriptors into constraints, runs a
//!   session, and writes solutions and diagnostics back.

// Definitions and the definition store
pub mod def;
pub use def::{Abstractness, DefId, DefinitionInfo, DefinitionKind, DefinitionStore, ShapeFlags, Variance};

// Type values
pub mod types;
pub use types::{
    Nullity, PartialType, SimpleVar, Solution, Solvable, SolverVar, SolverVarNamer, Type,
    TypeBoundary, TypeLike, TypeSolution, TypeVar, TypeVarRef, Value, ValueBound,
};

pub mod signature;
pub use signature::{Callee, CalleePriority, Signature, ValueFormal, ValueFormalKind};

pub mod category;
pub use category::TypeCategory;

pub mod mapper;

pub mod application_order;
pub use application_order::{ActualArg, ResolutionProblem};

pub mod supertype_tree;
pub use supertype_tree::SuperTypeTree;

mod recursion;

// Lattice queries
pub mod context;
pub use context::{Optimism, Specificity, TypeContext};

// Constraint solving
pub mod bounds;
pub use bounds::BoundKind;

pub mod constraint;
pub use constraint::Constraint;

pub mod reconcile;

pub mod config;
pub use config::SolverConfig;

pub mod solver;
pub use solver::{SolverError, TypeSolver};

// Batch driver
pub mod infer;
pub use infer::{CallDescriptor, CallInput, InputBound, infer_bounds};

#[cfg(test)]
#[path = "../tests/fixture.rs"]
pub(crate) mod fixture;
