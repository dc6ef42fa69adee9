//! Signatures and overload candidates.

use crate::def::{DefId, DefinitionStore};
use crate::types::{Render, Type};
use std::fmt;
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueFormalKind {
    Required,
    Optional,
    Rest,
}

impl ValueFormalKind {
    /// Optional and rest inputs may be omitted.
    pub const fn is_optional(self) -> bool {
        !matches!(self, ValueFormalKind::Required)
    }
}

/// One declared input.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueFormal {
    pub ty: Type,
    pub kind: ValueFormalKind,
}

/// Inclusive bounds on the number of actuals; `max` is `None` with a rest input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArityRange {
    pub min: usize,
    pub max: Option<usize>,
}

impl ArityRange {
    pub fn contains(&self, n: usize) -> bool {
        n >= self.min && self.max.is_none_or(|max| n <= max)
    }
}

impl fmt::Display for ArityRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{max}"),
            Some(max) => write!(f, "{}..{max}", self.min),
            None => write!(f, "{}..", self.min),
        }
    }
}

/// A function signature. Required inputs precede optional ones, which
/// precede the rest input.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    pub return_type: Type,
    /// The first required input is the implicit receiver.
    pub has_this_formal: bool,
    pub required: Vec<Type>,
    pub optional: Vec<Type>,
    pub rest: Option<Type>,
    /// The signature's own type parameters.
    pub type_formals: Vec<DefId>,
    /// Symbols for required then optional inputs, used to match named actuals.
    /// May be shorter than the input list; missing entries are unnamed.
    pub input_names: Vec<Option<Arc<str>>>,
}

impl Signature {
    /// A signature with only required inputs.
    pub fn new(required: Vec<Type>, return_type: Type) -> Self {
        Self {
            return_type,
            has_this_formal: false,
            required,
            optional: Vec::new(),
            rest: None,
            type_formals: Vec::new(),
            input_names: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_optional(mut self, optional: Vec<Type>) -> Self {
        self.optional = optional;
        self
    }

    #[must_use]
    pub fn with_rest(mut self, rest: Type) -> Self {
        self.rest = Some(rest);
        self
    }

    #[must_use]
    pub fn with_type_formals(mut self, type_formals: Vec<DefId>) -> Self {
        self.type_formals = type_formals;
        self
    }

    #[must_use]
    pub fn with_input_names(mut self, names: Vec<Option<Arc<str>>>) -> Self {
        self.input_names = names;
        self
    }

    pub fn arity_range(&self) -> ArityRange {
        let min = self.required.len();
        ArityRange {
            min,
            max: if self.rest.is_some() {
                None
            } else {
                Some(min + self.optional.len())
            },
        }
    }

    /// The formal receiving the `i`th actual when actuals are in formal order.
    pub fn value_formal_for_actual(&self, i: usize) -> Option<ValueFormal> {
        if let Some(ty) = self.required.get(i) {
            return Some(ValueFormal {
                ty: ty.clone(),
                kind: ValueFormalKind::Required,
            });
        }
        if let Some(ty) = self.optional.get(i - self.required.len()) {
            return Some(ValueFormal {
                ty: ty.clone(),
                kind: ValueFormalKind::Optional,
            });
        }
        self.rest.as_ref().map(|ty| ValueFormal {
            ty: ty.clone(),
            kind: ValueFormalKind::Rest,
        })
    }

    /// Required then optional inputs.
    pub fn required_and_optional(&self) -> impl Iterator<Item = ValueFormal> + '_ {
        let required = self.required.iter().map(|ty| ValueFormal {
            ty: ty.clone(),
            kind: ValueFormalKind::Required,
        });
        let optional = self.optional.iter().map(|ty| ValueFormal {
            ty: ty.clone(),
            kind: ValueFormalKind::Optional,
        });
        required.chain(optional)
    }

    pub fn input_name(&self, formal_index: usize) -> Option<&str> {
        self.input_names
            .get(formal_index)
            .and_then(|n| n.as_deref())
    }
}

impl Render for Signature {
    fn render(&self, store: &DefinitionStore, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.type_formals.is_empty() {
            f.write_str("<")?;
            for (i, tf) in self.type_formals.iter().enumerate() {
                if i != 0 {
                    f.write_str(", ")?;
                }
                f.write_str(&store.name(*tf))?;
            }
            f.write_str(">")?;
        }
        f.write_str("(")?;
        let mut first = true;
        for (i, formal) in self.required_and_optional().enumerate() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            if i == 0 && self.has_this_formal {
                f.write_str("this: ")?;
            }
            formal.ty.render(store, f)?;
            if formal.kind == ValueFormalKind::Optional {
                f.write_str(" = ...")?;
            }
        }
        if let Some(rest) = &self.rest {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str("...")?;
            rest.render(store, f)?;
        }
        f.write_str(") -> ")?;
        self.return_type.render(store, f)
    }
}

/// Tie-breaking tier among otherwise equally fitting callees.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CalleePriority {
    /// Chosen only when no `Default` candidate survives.
    Fallback,
    #[default]
    Default,
}

/// An overload candidate.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Callee {
    pub sig: Arc<Signature>,
    pub priority: CalleePriority,
}

impl Callee {
    pub fn new(sig: Signature) -> Self {
        Self {
            sig: Arc::new(sig),
            priority: CalleePriority::Default,
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: CalleePriority) -> Self {
        self.priority = priority;
        self
    }
}

#[cfg(test)]
#[path = "../tests/signature_tests.rs"]
mod tests;
