//! Pairing actual arguments with a signature's formals.
//!
//! An application order lists, for each required and optional formal in
//! declaration order, the index of the actual bound to it (`None` for an
//! omitted optional), followed by the indices of actuals collected by the
//! rest formal. `[0, 1, None, 2]` against `(a, b, c = ..., d = ...)` binds
//! the third actual to `d` and leaves `c` to its default.
//!
//! A trailing block goes to the last formal whose type is a functional
//! interface, so `f(x) { ... }` can satisfy `f(block: Fn, x: Int32)`.

use crate::def::DefinitionStore;
use crate::signature::Signature;
use crate::types::Type;
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use tinfer_common::{Diagnostic, DiagnosticArg, MessageTemplate, Position};

/// How an actual argument is written at the call site.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActualArg {
    Positional,
    /// Passed by name, as in `f(x = 1)`.
    Named(Arc<str>),
    /// A block lambda after the argument list.
    TrailingBlock,
}

/// Why actuals could not be paired with formals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionProblem {
    ArgumentListSizeMismatch {
        n_positional_actuals: usize,
        n_formals: usize,
    },
    NamedArgumentMismatch {
        actual_index: usize,
        key: Arc<str>,
    },
    DuplicateName {
        actual_index: usize,
        formal_index: usize,
        key: Arc<str>,
    },
    NoFormalForActual {
        actual_index: usize,
    },
}

impl ResolutionProblem {
    pub fn to_diagnostic(&self, position: Position) -> Diagnostic {
        let (template, args) = match self {
            ResolutionProblem::ArgumentListSizeMismatch {
                n_positional_actuals,
                n_formals,
            } => (
                MessageTemplate::ArgumentListSizeMismatch,
                vec![
                    DiagnosticArg::from(*n_positional_actuals),
                    DiagnosticArg::from(*n_formals),
                ],
            ),
            ResolutionProblem::NamedArgumentMismatch { key, .. } => (
                MessageTemplate::NamedArgumentMismatch,
                vec![DiagnosticArg::from(key.as_ref())],
            ),
            ResolutionProblem::DuplicateName { key, .. } => (
                MessageTemplate::DuplicateName,
                vec![DiagnosticArg::from(key.as_ref())],
            ),
            ResolutionProblem::NoFormalForActual { actual_index } => (
                MessageTemplate::NoFormalForActual,
                vec![DiagnosticArg::from(*actual_index)],
            ),
        };
        Diagnostic::error(template, position, args)
    }
}

impl fmt::Display for ResolutionProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionProblem::ArgumentListSizeMismatch {
                n_positional_actuals,
                n_formals,
            } => write!(f, "{n_positional_actuals} actuals for {n_formals} formals"),
            ResolutionProblem::NamedArgumentMismatch { key, .. } => write!(f, "no formal named {key}"),
            ResolutionProblem::DuplicateName { key, .. } => write!(f, "{key} supplied twice"),
            ResolutionProblem::NoFormalForActual { actual_index } => {
                write!(f, "no formal for actual {actual_index}")
            }
        }
    }
}

impl std::error::Error for ResolutionProblem {}

/// Order `actuals` to match `sig`.
pub fn application_order_for_actuals(
    actuals: &[ActualArg],
    sig: &Signature,
    store: &DefinitionStore,
) -> Result<Vec<Option<usize>>, ResolutionProblem> {
    let formals: Vec<FormalSlot<'_>> = sig
        .required_and_optional()
        .enumerate()
        .map(|(i, vf)| FormalSlot {
            optional: vf.kind.is_optional(),
            takes_block: mentions_function_type(store, &vf.ty),
            name: sig.input_name(i),
        })
        .collect();
    let has_rest = sig.rest.is_some();

    let n_actuals = actuals.len();
    let n_formals = formals.len();
    let has_trailing_block = matches!(actuals.last(), Some(ActualArg::TrailingBlock));
    let n_before_block = n_actuals - usize::from(has_trailing_block);
    let no_named = actuals[..n_before_block]
        .iter()
        .all(|a| !matches!(a, ActualArg::Named(_)));

    let mut n_required = 0;
    let mut n_optional = 0;
    let mut optionals_at_end = true;
    for formal in &formals {
        if formal.optional {
            n_optional += 1;
        } else {
            if n_optional != 0 {
                optionals_at_end = false;
                break;
            }
            n_required += 1;
        }
    }

    let arity_ok = n_actuals >= n_required && (has_rest || n_actuals <= n_formals);
    if !arity_ok && no_named {
        return Err(ResolutionProblem::ArgumentListSizeMismatch {
            n_positional_actuals: n_actuals,
            n_formals,
        });
    }

    if no_named && optionals_at_end {
        return Ok(fast_order(
            &formals,
            n_actuals,
            n_required,
            n_optional,
            has_trailing_block,
        ));
    }
    slow_order(actuals, &formals, has_rest)
}

/// The formal receiving `actual_index`, as an index usable with
/// `Signature::value_formal_for_actual`.
pub fn corresponding_formal(actual_index: usize, order: &[Option<usize>]) -> Option<usize> {
    order.iter().position(|a| *a == Some(actual_index))
}

struct FormalSlot<'a> {
    optional: bool,
    takes_block: bool,
    name: Option<&'a str>,
}

fn mentions_function_type(store: &DefinitionStore, t: &Type) -> bool {
    !t.is_param() && store.is_functional_interface(t.definition())
}

/// Required formals all precede optional ones and nothing is named.
fn fast_order(
    formals: &[FormalSlot<'_>],
    n_actuals: usize,
    n_required: usize,
    n_optional: usize,
    has_trailing_block: bool,
) -> Vec<Option<usize>> {
    let n_formals = formals.len();
    let n_before_block = n_actuals - usize::from(has_trailing_block);
    let mut block_dest = None;
    if has_trailing_block {
        if n_actuals > n_required {
            block_dest = (n_required..n_formals).rev().find(|&i| formals[i].takes_block);
        }
        if block_dest.is_none() {
            block_dest = (0..n_required).rev().find(|&i| formals[i].takes_block);
        }
    }

    let Some(dest) = block_dest.filter(|&d| d != n_before_block) else {
        let mut order: Vec<Option<usize>> = (0..n_actuals).map(Some).collect();
        if n_required + n_optional > n_actuals {
            order.resize(n_formals, None);
        }
        return order;
    };

    let mut order = Vec::with_capacity(n_formals.max(n_actuals));
    if n_before_block >= dest {
        order.extend((0..dest).map(Some));
        order.push(Some(n_before_block));
        order.extend((dest + 1..n_actuals).map(|i| Some(i - 1)));
    } else {
        order.extend((0..n_before_block).map(Some));
        order.resize(dest, None);
        order.push(Some(n_before_block));
    }
    if order.len() < n_formals {
        order.resize(n_formals, None);
    }
    order
}

fn slow_order(
    actuals: &[ActualArg],
    formals: &[FormalSlot<'_>],
    has_rest: bool,
) -> Result<Vec<Option<usize>>, ResolutionProblem> {
    let n_formals = formals.len();
    let n_actuals = actuals.len();
    let by_name: FxHashMap<&str, usize> = formals
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.name.map(|n| (n, i)))
        .collect();
    let mut used_formals = FixedBitSet::with_capacity(n_formals);
    let mut used_actuals = FixedBitSet::with_capacity(n_actuals);
    let mut pairs: Vec<(usize, usize)> = Vec::new();

    // Named actuals.
    let mut n_positional = 0;
    for (actual_index, actual) in actuals.iter().enumerate() {
        let ActualArg::Named(key) = actual else {
            n_positional += 1;
            continue;
        };
        let Some(&formal_index) = by_name.get(key.as_ref()) else {
            return Err(ResolutionProblem::NamedArgumentMismatch {
                actual_index,
                key: Arc::clone(key),
            });
        };
        if used_formals.contains(formal_index) {
            return Err(ResolutionProblem::DuplicateName {
                actual_index,
                formal_index,
                key: Arc::clone(key),
            });
        }
        pairs.push((formal_index, actual_index));
        used_formals.insert(formal_index);
        used_actuals.insert(actual_index);
    }

    if n_positional > n_formals - used_formals.count_ones(..) && !has_rest {
        return Err(ResolutionProblem::ArgumentListSizeMismatch {
            n_positional_actuals: n_positional,
            n_formals,
        });
    }

    // Trailing block.
    if let Some(last) = n_actuals.checked_sub(1) {
        if !used_actuals.contains(last) && actuals[last] == ActualArg::TrailingBlock {
            let available = n_actuals - used_actuals.count_ones(..);
            let unused_required = (0..n_formals)
                .filter(|&i| !used_formals.contains(i) && !formals[i].optional)
                .count();
            let include_optional = available > unused_required;
            let dest = (0..n_formals).rev().find(|&i| {
                !used_formals.contains(i)
                    && (include_optional || !formals[i].optional)
                    && formals[i].takes_block
            });
            if let Some(dest) = dest {
                pairs.push((dest, last));
                used_formals.insert(dest);
                used_actuals.insert(last);
            }
        }
    }

    // The count of positional actuals needed to reach the last unused
    // required formal.
    let mut n_required = 0;
    let mut unused_seen = 0;
    for (i, formal) in formals.iter().enumerate() {
        if !used_formals.contains(i) {
            unused_seen += 1;
            if !formal.optional {
                n_required = unused_seen;
            }
        }
    }

    let mut bind_in_order = |limit: Option<usize>,
                             used_formals: &mut FixedBitSet,
                             used_actuals: &mut FixedBitSet| {
        let mut remaining = limit;
        let free_formals: Vec<usize> = (0..n_formals).filter(|&i| !used_formals.contains(i)).collect();
        let free_actuals: Vec<usize> = (0..n_actuals).filter(|&i| !used_actuals.contains(i)).collect();
        for (f, a) in free_formals.into_iter().zip(free_actuals) {
            if remaining == Some(0) {
                break;
            }
            pairs.push((f, a));
            used_formals.insert(f);
            used_actuals.insert(a);
            remaining = remaining.map(|r| r - 1);
        }
    };
    // Required positionals, then optional ones.
    bind_in_order(Some(n_required), &mut used_formals, &mut used_actuals);
    bind_in_order(None, &mut used_formals, &mut used_actuals);

    // Leftovers go to the rest formal.
    let mut rest_actuals = Vec::new();
    if has_rest {
        for i in 0..n_actuals {
            if !used_actuals.contains(i) {
                rest_actuals.push(i);
                used_actuals.insert(i);
            }
        }
    }

    if (0..n_formals).any(|i| !used_formals.contains(i) && !formals[i].optional) {
        return Err(ResolutionProblem::ArgumentListSizeMismatch {
            n_positional_actuals: n_positional,
            n_formals,
        });
    }
    if let Some(actual_index) = (0..n_actuals).find(|&i| !used_actuals.contains(i)) {
        return Err(ResolutionProblem::NoFormalForActual { actual_index });
    }

    let mut order: Vec<Option<usize>> = vec![None; n_formals];
    for (formal_index, actual_index) in pairs {
        order[formal_index] = Some(actual_index);
    }
    order.extend(rest_actuals.into_iter().map(Some));
    Ok(order)
}

#[cfg(test)]
#[path = "../tests/application_order_tests.rs"]
mod tests;
