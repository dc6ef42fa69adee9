//! Forcing a choice when propagation stalls.
//!
//! Satisfied nodes are grouped by the full bounds they have. Groups are
//! tried in order, stopping at the first that commits anything:
//!
//! 1. a common bound;
//! 2. lower bounds other than `Never<T>`, where `Never<T>` counts as `T`
//!    when `T` is also an upper bound;
//! 3. the lowest upper bound;
//! 4. `Never<T>` lower bounds, as `Never` of the combined `T`s.
//!
//! Every choice in a group is computed before any is committed.

use super::TypeSolver;
use super::node::{Node, NodeId};
use crate::def::{Abstractness, DefId};
use crate::types::{Nullity, Solution, Type};
use tracing::debug;

impl TypeSolver {
    pub(super) fn force_choice(&mut self) {
        let mut with_common = Vec::new();
        let mut with_lower_early = Vec::new();
        let mut with_lower_late = Vec::new();
        let mut with_upper = Vec::new();
        for &id in &self.satisfied {
            let full = &self.nodes[id].full;
            if !full.common().is_empty() {
                with_common.push(id);
            }
            let lower = full.lower();
            if !lower.is_empty() {
                if lower.iter().any(|t| !is_never(t) || never_of_upper(t, &self.nodes[id]).is_some()) {
                    with_lower_early.push(id);
                }
                if lower.iter().any(is_never) {
                    with_lower_late.push(id);
                }
            }
            if !full.upper().is_empty() {
                with_upper.push(id);
            }
        }
        debug!(
            common = with_common.len(),
            lower = with_lower_early.len(),
            upper = with_upper.len(),
            never = with_lower_late.len(),
            "forcing choices"
        );

        if !self.progress && !with_common.is_empty() {
            let choices = with_common
                .iter()
                .map(|&id| (id, self.nodes[id].full.common().first().cloned().map(Solution::Type)))
                .collect();
            self.choose_all(choices);
        }

        if !self.progress && !with_lower_early.is_empty() {
            let choices = with_lower_early
                .iter()
                .map(|&id| {
                    let node = &self.nodes[id];
                    let lowers: Vec<Type> = node
                        .full
                        .lower()
                        .iter()
                        .filter_map(|t| {
                            if !is_never(t) {
                                Some(t.clone())
                            } else {
                                never_of_upper(t, node).cloned()
                            }
                        })
                        .collect();
                    (id, self.combine_lower(node, &lowers))
                })
                .collect();
            self.choose_all(choices);
        }

        if !self.progress && !with_upper.is_empty() {
            let choices = with_upper
                .iter()
                .map(|&id| (id, self.combine_upper(&self.nodes[id])))
                .collect();
            self.choose_all(choices);
        }

        if !self.progress && !with_lower_late.is_empty() {
            let choices = with_lower_late
                .iter()
                .map(|&id| {
                    let node = &self.nodes[id];
                    let lowers: Vec<Type> = node.full.lower().iter().map(Type::strip_never).collect();
                    let choice = match self.combine_lower(node, &lowers) {
                        Some(Solution::Type(t)) => Some(Solution::Type(Type::never_of(t))),
                        other => other,
                    };
                    (id, choice)
                })
                .collect();
            self.choose_all(choices);
        }
    }

    fn choose_all(&mut self, choices: Vec<(NodeId, Option<Solution>)>) {
        for (id, choice) in choices {
            if let Some(choice) = choice {
                self.choose(id, choice);
            }
        }
    }

    /// The lowest of the upper bounds, restricted to the shape of a partial
    /// common bound if there is one.
    fn combine_upper(&self, node: &Node) -> Option<Solution> {
        let shape = node.partial.common().first().map(|p| p.definition());
        let uppers: Vec<&Type> = node
            .full
            .upper()
            .iter()
            .filter(|t| shape.is_none_or(|d| t.definition() == d))
            .collect();
        let (&first, rest) = uppers.split_first()?;
        let lowest = rest
            .iter()
            .fold(first, |t, &u| if self.ctx.is_sub_type(u, t) { u } else { t });
        Some(Solution::Type(lowest.clone()))
    }

    /// The least common supertype of `lowers`.
    ///
    /// A partial common bound fixes the shape: lower bounds are projected onto
    /// it and its nullity is used. Otherwise the result is nullable if any
    /// lower bound is. Among several incomparable candidates, a concrete class
    /// beats an interface.
    fn combine_lower(&self, node: &Node, lowers: &[Type]) -> Option<Solution> {
        let (nullity, lowers): (Nullity, Vec<Type>) = match node.partial.common().first() {
            Some(common) => {
                let d = common.definition();
                let projected = lowers
                    .iter()
                    .filter_map(|lb| {
                        if lb.definition() == d {
                            Some(lb.clone())
                        } else {
                            self.ctx.super_type_tree(lb).get(d).first().cloned()
                        }
                    })
                    .collect();
                (common.nullity(), projected)
            }
            None => {
                let nullable = node.full.lower().iter().any(Type::is_nullable)
                    || node.partial.lower().iter().any(|p| p.nullity().is_nullable());
                (Nullity::from_nullable(nullable), lowers.to_vec())
            }
        };
        if lowers.is_empty() {
            return None;
        }
        let non_null: Vec<Type> = lowers.iter().map(Type::non_null).collect();
        let supers = self.ctx.least_common_super_types(&non_null);
        let candidates: Vec<Type> = if supers.is_empty() {
            non_null
        } else {
            supers.into_iter().collect()
        };
        let store = self.ctx.store();
        let chosen = if candidates.len() == 1 {
            candidates.first()
        } else {
            candidates
                .iter()
                .find(|t| !t.is_param() && store.abstractness(t.definition()) == Abstractness::Concrete)
                .or_else(|| candidates.first())
        };
        Some(match chosen {
            Some(t) => Solution::Type(t.with_nullity(nullity)),
            None => Solution::Unsolvable,
        })
    }
}

fn is_never(t: &Type) -> bool {
    !t.is_param() && t.definition() == DefId::NEVER
}

/// `T` for a lower bound `Never<T>` when `T` is also an upper bound.
fn never_of_upper<'a>(t: &'a Type, node: &Node) -> Option<&'a Type> {
    match t.bindings() {
        [inner] if node.full.upper().contains(inner) => Some(inner),
        _ => None,
    }
}
