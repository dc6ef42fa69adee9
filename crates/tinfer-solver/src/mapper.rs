//! One-pass substitution of formal and variable bindings.
//!
//! Replacements are not themselves re-mapped: substituting `T -> List<T>`
//! into `Map<T, T>` gives `Map<List<T>, List<T>>`. A placeholder's nullity is
//! OR-ed into its replacement, so `T?` with `T -> Int32` gives `Int32?`.

use crate::def::DefId;
use crate::signature::Signature;
use crate::types::{PartialType, Type, TypeLike, TypeVar};
use rustc_hash::FxHashMap;

/// Source of replacement types for a substitution.
pub trait BindingLookup {
    fn formal(&mut self, formal: DefId) -> Option<TypeLike>;
    fn var(&mut self, var: &TypeVar) -> Option<TypeLike>;
}

/// Table-driven lookup.
pub struct MapLookup<'a> {
    pub vars: &'a FxHashMap<TypeVar, TypeLike>,
    pub formals: &'a FxHashMap<DefId, TypeLike>,
}

impl BindingLookup for MapLookup<'_> {
    fn formal(&mut self, formal: DefId) -> Option<TypeLike> {
        self.formals.get(&formal).cloned()
    }

    fn var(&mut self, var: &TypeVar) -> Option<TypeLike> {
        self.vars.get(var).cloned()
    }
}

/// Closure-driven lookup over formals only.
pub struct FormalFn<F>(pub F);

impl<F: FnMut(DefId) -> Option<TypeLike>> BindingLookup for FormalFn<F> {
    fn formal(&mut self, formal: DefId) -> Option<TypeLike> {
        (self.0)(formal)
    }

    fn var(&mut self, _var: &TypeVar) -> Option<TypeLike> {
        None
    }
}

/// Substitute through a type-like.
pub fn map_type_like(t: &TypeLike, lookup: &mut impl BindingLookup) -> TypeLike {
    match t {
        TypeLike::Type(ty) => map_type_with(ty, lookup),
        TypeLike::Partial(p) => {
            let bindings = p
                .bindings()
                .iter()
                .map(|b| map_type_like(b, lookup))
                .collect();
            PartialType::from(p.definition(), bindings, p.nullity())
        }
        TypeLike::Var(r) => match lookup.var(&r.var) {
            Some(rep) => {
                let nullity = r.nullity.or(rep.nullity());
                rep.with_nullity(nullity)
            }
            None => t.clone(),
        },
    }
}

/// Substitute through a full type; the result may be partial.
pub fn map_type_with(ty: &Type, lookup: &mut impl BindingLookup) -> TypeLike {
    if ty.is_param() {
        return match lookup.formal(ty.definition()) {
            Some(rep) => {
                let nullity = ty.nullity().or(rep.nullity());
                rep.with_nullity(nullity)
            }
            None => TypeLike::Type(ty.clone()),
        };
    }
    if ty.bindings().is_empty() {
        return TypeLike::Type(ty.clone());
    }
    let bindings = ty
        .bindings()
        .iter()
        .map(|b| map_type_with(b, lookup))
        .collect();
    PartialType::from(ty.definition(), bindings, ty.nullity())
}

/// Substitute formals with full types.
pub fn map_type(ty: &Type, formals: &FxHashMap<DefId, Type>) -> Type {
    if formals.is_empty() {
        return ty.clone();
    }
    if ty.is_param() {
        return match formals.get(&ty.definition()) {
            Some(rep) => rep.with_nullity(ty.nullity().or(rep.nullity())),
            None => ty.clone(),
        };
    }
    if ty.bindings().is_empty() {
        return ty.clone();
    }
    let bindings = ty.bindings().iter().map(|b| map_type(b, formals)).collect();
    Type::new(ty.definition(), bindings, ty.nullity())
}

/// Substitute formals through every type in a signature.
pub fn map_signature(sig: &Signature, formals: &FxHashMap<DefId, Type>) -> Signature {
    let map_all = |ts: &[Type]| -> Vec<Type> { ts.iter().map(|t| map_type(t, formals)).collect() };
    Signature {
        return_type: map_type(&sig.return_type, formals),
        has_this_formal: sig.has_this_formal,
        required: map_all(&sig.required),
        optional: map_all(&sig.optional),
        rest: sig.rest.as_ref().map(|t| map_type(t, formals)),
        type_formals: sig.type_formals.clone(),
        input_names: sig.input_names.clone(),
    }
}

#[cfg(test)]
#[path = "../tests/mapper_tests.rs"]
mod tests;
