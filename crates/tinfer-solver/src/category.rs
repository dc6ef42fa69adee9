//! Type categories.
//!
//! A few shapes get special treatment throughout inference. `classify` sorts
//! a type into one of them and checks that it is well formed, so callers can
//! `match` on the result and fall through to a default arm.

use crate::def::{DefId, DefinitionStore};
use crate::mapper::map_signature;
use crate::signature::Signature;
use crate::types::{Nullity, Type};
use rustc_hash::FxHashMap;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// `Result<Pass, Fail...>`: a normal result bundled with failure modes.
    Result,
    /// No normal result.
    Void,
    /// A functional interface standing in for a function type.
    Functional,
    /// `Never<T>`: no value, but translatable as `T`.
    Never,
    /// A failure to derive a usable type.
    Invalid,
    /// Everything else, including formal references.
    Other,
}

impl TypeCategory {
    pub fn of_definition(store: &DefinitionStore, definition: DefId) -> TypeCategory {
        match definition {
            DefId::RESULT => TypeCategory::Result,
            DefId::VOID => TypeCategory::Void,
            DefId::NEVER => TypeCategory::Never,
            DefId::INVALID => TypeCategory::Invalid,
            _ if store.is_functional_interface(definition) => TypeCategory::Functional,
            _ => TypeCategory::Other,
        }
    }

    pub fn of_type(store: &DefinitionStore, t: &Type) -> TypeCategory {
        if t.is_param() {
            TypeCategory::Other
        } else {
            Self::of_definition(store, t.definition())
        }
    }
}

/// The category of `t`, or `None` when its bindings or nullity do not fit it.
pub fn category_if_well_formed(store: &DefinitionStore, t: &Type) -> Option<TypeCategory> {
    let category = TypeCategory::of_type(store, t);
    let n = t.bindings().len();
    let well_formed = match category {
        TypeCategory::Result => n >= 1 && t.nullity() == Nullity::NonNull,
        TypeCategory::Void => n == 0 && t.nullity() == Nullity::NonNull,
        _ => n == store.formal_count(t.definition()),
    };
    well_formed.then_some(category)
}

/// A classified type.
#[derive(Clone, Debug)]
pub enum TypeView<'a> {
    Result { pass: &'a Type, fails: &'a [Type] },
    Void,
    Functional { nullity: Nullity, sig: Signature },
    Never { but_if: &'a Type, nullity: Nullity },
    Invalid,
    Other { nullity: Nullity },
    Malformed(TypeCategory),
}

pub fn classify<'a>(store: &DefinitionStore, t: &'a Type) -> TypeView<'a> {
    let Some(category) = category_if_well_formed(store, t) else {
        return TypeView::Malformed(TypeCategory::of_type(store, t));
    };
    match category {
        TypeCategory::Result => TypeView::Result {
            pass: &t.bindings()[0],
            fails: &t.bindings()[1..],
        },
        TypeCategory::Void => TypeView::Void,
        TypeCategory::Functional => match sig_for_fun_interface_type(store, t) {
            Some(sig) => TypeView::Functional {
                nullity: t.nullity(),
                sig,
            },
            None => TypeView::Malformed(TypeCategory::Functional),
        },
        TypeCategory::Never => match t.bindings().first() {
            Some(but_if) => TypeView::Never {
                but_if,
                nullity: t.nullity(),
            },
            None => TypeView::Malformed(TypeCategory::Never),
        },
        TypeCategory::Invalid => TypeView::Invalid,
        TypeCategory::Other => TypeView::Other {
            nullity: t.nullity(),
        },
    }
}

/// The apply signature of a functional interface type, with the interface's
/// formals replaced by `t`'s bindings.
pub fn sig_for_fun_interface_type(store: &DefinitionStore, t: &Type) -> Option<Signature> {
    if t.is_param() {
        return None;
    }
    let apply = store.apply_signature(t.definition())?;
    let formals = store.formals(t.definition());
    if formals.len() != t.bindings().len() {
        return None;
    }
    let map: FxHashMap<DefId, Type> = formals
        .into_iter()
        .zip(t.bindings().iter().cloned())
        .collect();
    Some(map_signature(&apply, &map))
}

/// True for `Void`, `Never<Void>` and `Result<Void, ...>`.
pub fn is_void_like(t: Option<&Type>) -> bool {
    let Some(t) = t else { return false };
    if t.is_param() {
        return false;
    }
    match t.definition() {
        DefId::VOID => true,
        DefId::NEVER => t.bindings().len() == 1 && is_void_like(t.bindings().first()),
        DefId::RESULT => is_void_like(t.bindings().first()),
        _ => false,
    }
}

/// The pass type of a `Result`, or `t` itself.
pub fn pass_type_of(store: &DefinitionStore, t: &Type) -> Type {
    match classify(store, t) {
        TypeView::Result { pass, .. } => pass.clone(),
        _ => t.clone(),
    }
}

#[cfg(test)]
#[path = "../tests/category_tests.rs"]
mod tests;
