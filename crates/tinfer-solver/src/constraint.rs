//! Constraints: the edges of the solver graph.
//!
//! Each constraint names the nodes (`Solvable`s) it moves bound information
//! between. The solver re-checks a constraint whenever one of those nodes
//! changes.

use crate::def::{DefId, DefinitionStore};
use crate::signature::Callee;
use crate::types::{Render, SimpleVar, Solvable, Type, TypeBoundary, TypeLike, TypeVar};
use std::fmt;

/// Everything the solver needs to narrow one call's overloads.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallConstraint {
    /// Candidates; the solver whittles these down to one.
    pub callees: Vec<Callee>,
    /// Solves to `Solution::Int` with the chosen index, or `Unsolvable`.
    pub callee_choice: SimpleVar,
    /// Written type arguments, as in `f<String>(x)`.
    pub explicit_type_args: Option<Vec<Type>>,
    /// Per type-formal variables, for relating reified bounds to type actuals.
    pub type_arg_vars: Option<Vec<TypeVar>>,
    /// Actual input types in source order.
    pub args: Vec<TypeVar>,
    /// The last argument is a trailing block that may need reordering.
    pub has_trailing_block: bool,
    /// Solves to the chosen callee's type actuals.
    pub type_actuals: Option<SimpleVar>,
    /// The contextualized return type after unpacking any `Result`.
    pub call_pass: TypeVar,
    /// The contextualized failure types; empty when the return is not a
    /// `Result`. Required when any candidate returns one.
    pub call_fail: Option<SimpleVar>,
}

impl CallConstraint {
    pub fn any_returns_result(&self) -> bool {
        self.callees
            .iter()
            .any(|c| !c.sig.return_type.is_param() && c.sig.return_type.definition() == DefId::RESULT)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// `sub <: sup`: sub's bounds flow up as lower bounds of sup, and sup's
    /// flow down as upper bounds of sub.
    SubType { sub: TypeBoundary, sup: TypeBoundary },
    /// `a <: b` and `b <: a`.
    SameType { a: TypeBoundary, b: TypeBoundary },
    /// `a <: b` or `b <: a`, as for casts that may narrow or widen.
    Bivariant { a: TypeBoundary, b: TypeBoundary },
    /// Connects a partial type to the variables it mentions, so that solving
    /// those variables can complete it.
    Uses { type_like: TypeLike, type_vars: Vec<TypeVar> },
    Call(Box<CallConstraint>),
    /// `receiver` solves to the list of the parts' solutions.
    Put { receiver: SimpleVar, parts: Vec<TypeBoundary> },
}

impl Constraint {
    pub fn sub_type(sub: impl Into<TypeBoundary>, sup: impl Into<TypeBoundary>) -> Self {
        Constraint::SubType {
            sub: sub.into(),
            sup: sup.into(),
        }
    }

    pub fn same_type(a: impl Into<TypeBoundary>, b: impl Into<TypeBoundary>) -> Self {
        Constraint::SameType {
            a: a.into(),
            b: b.into(),
        }
    }

    pub fn bivariant(a: impl Into<TypeBoundary>, b: impl Into<TypeBoundary>) -> Self {
        Constraint::Bivariant {
            a: a.into(),
            b: b.into(),
        }
    }

    /// A uses constraint listing every variable `type_like` mentions.
    pub fn uses(type_like: TypeLike) -> Self {
        let type_vars = type_like.type_vars_used().into_iter().collect();
        Constraint::Uses {
            type_like,
            type_vars,
        }
    }

    pub fn put(receiver: SimpleVar, parts: Vec<TypeBoundary>) -> Self {
        Constraint::Put { receiver, parts }
    }

    /// The nodes this constraint connects.
    pub fn bounds(&self) -> Vec<Solvable> {
        match self {
            Constraint::SubType { sub: a, sup: b }
            | Constraint::SameType { a, b }
            | Constraint::Bivariant { a, b } => {
                vec![Solvable::Boundary(a.clone()), Solvable::Boundary(b.clone())]
            }
            Constraint::Uses {
                type_like,
                type_vars,
            } => std::iter::once(Solvable::from(type_like.clone()))
                .chain(type_vars.iter().cloned().map(Solvable::from))
                .collect(),
            Constraint::Call(call) => {
                let mut out = vec![Solvable::Simple(call.callee_choice.clone())];
                for t in call.explicit_type_args.iter().flatten() {
                    out.push(Solvable::from(TypeLike::Type(t.clone())));
                }
                for v in call.type_arg_vars.iter().flatten() {
                    out.push(Solvable::from(v.clone()));
                }
                if let Some(v) = &call.type_actuals {
                    out.push(Solvable::Simple(v.clone()));
                }
                out.extend(call.args.iter().cloned().map(Solvable::from));
                out.push(Solvable::from(call.call_pass.clone()));
                if let Some(v) = &call.call_fail {
                    out.push(Solvable::Simple(v.clone()));
                }
                out
            }
            Constraint::Put { receiver, parts } => std::iter::once(Solvable::Simple(receiver.clone()))
                .chain(parts.iter().cloned().map(Solvable::Boundary))
                .collect(),
        }
    }
}

fn join<T: Render>(
    items: &[T],
    sep: &str,
    store: &DefinitionStore,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i != 0 {
            f.write_str(sep)?;
        }
        item.render(store, f)?;
    }
    Ok(())
}

impl Render for TypeVar {
    fn render(&self, _store: &DefinitionStore, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Render for Constraint {
    fn render(&self, store: &DefinitionStore, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::SubType { sub, sup } => {
                sub.render(store, f)?;
                f.write_str(" <: ")?;
                sup.render(store, f)
            }
            Constraint::SameType { a, b } => {
                a.render(store, f)?;
                f.write_str(" == ")?;
                b.render(store, f)
            }
            Constraint::Bivariant { a, b } => {
                a.render(store, f)?;
                f.write_str(" ~: ")?;
                b.render(store, f)
            }
            Constraint::Uses {
                type_like,
                type_vars,
            } => {
                type_like.render(store, f)?;
                f.write_str(" uses ")?;
                join(type_vars, ", ", store, f)
            }
            Constraint::Call(call) => {
                f.write_str("call")?;
                if let Some(args) = call.explicit_type_args.as_deref().filter(|a| !a.is_empty()) {
                    f.write_str("<")?;
                    join(args, ", ", store, f)?;
                    f.write_str(">")?;
                }
                f.write_str("(")?;
                for (i, callee) in call.callees.iter().enumerate() {
                    if i != 0 {
                        f.write_str(" || ")?;
                    }
                    callee.sig.render(store, f)?;
                }
                f.write_str(")(")?;
                join(&call.args, ", ", store, f)?;
                f.write_str(") -> ")?;
                if call.type_actuals.is_some() || call.type_arg_vars.is_some() {
                    f.write_str("<")?;
                    let vars = call.type_arg_vars.as_deref().unwrap_or_default();
                    join(vars, ", ", store, f)?;
                    if let Some(actuals) = &call.type_actuals {
                        if !vars.is_empty() {
                            f.write_str(" as ")?;
                        }
                        write!(f, "...{}", actuals.name())?;
                    }
                    f.write_str("> ")?;
                }
                write!(f, "{}: {}", call.callee_choice.name(), call.call_pass.name())?;
                if let Some(fail) = &call.call_fail {
                    write!(f, " throws {}", fail.name())?;
                }
                Ok(())
            }
            Constraint::Put { receiver, parts } => {
                write!(f, "{} <- [", receiver.name())?;
                join(parts, ", ", store, f)?;
                f.write_str("]")
            }
        }
    }
}
