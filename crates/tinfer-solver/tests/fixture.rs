//! A small universe of user declarations shared by the unit tests.
//!
//! ```text
//!              I
//!             / \
//!            J   L
//!           /|\ / \
//!          A K D   C
//!            |
//!            B
//! ```
//!
//! `I`, `J`, `K` and `L` are interfaces; `A`, `B`, `C` and `D` are classes.
//! `Holder<T>` is an invariant interface implemented by `StrA` and `StrB` as
//! `Holder<String>` and by `IntC` as `Holder<Int32>`.

use crate::context::TypeContext;
use crate::def::{Abstractness, DefId, DefinitionStore, Variance};
use crate::types::{Nullity, Type};
use std::sync::Arc;

pub(crate) struct Universe {
    pub ctx: Arc<TypeContext>,
    pub i: DefId,
    pub j: DefId,
    pub l: DefId,
    pub a: DefId,
    pub k: DefId,
    pub d: DefId,
    pub c: DefId,
    pub b: DefId,
    pub holder: DefId,
    pub str_a: DefId,
    pub str_b: DefId,
    pub int_c: DefId,
    /// A free-standing formal bounded by `Listed<String>`.
    pub listed_param: DefId,
}

impl Universe {
    pub fn new() -> Self {
        tinfer_common::tracing_config::init_tracing();
        let store = DefinitionStore::new();
        let iface = |name: &str| store.declare_shape(name, Abstractness::Abstract);
        let class = |name: &str| store.declare_shape(name, Abstractness::Concrete);

        let i = iface("I");
        let j = iface("J");
        let l = iface("L");
        let k = iface("K");
        let a = class("A");
        let d = class("D");
        let c = class("C");
        let b = class("B");
        store.set_super_types(j, vec![simple(i)]);
        store.set_super_types(l, vec![simple(i)]);
        store.set_super_types(a, vec![simple(j)]);
        store.set_super_types(k, vec![simple(j)]);
        store.set_super_types(d, vec![simple(j), simple(l)]);
        store.set_super_types(c, vec![simple(l)]);
        store.set_super_types(b, vec![simple(k)]);

        let holder = iface("Holder");
        store.add_formal(holder, "T", Variance::Invariant);
        let str_a = class("StrA");
        let str_b = class("StrB");
        let int_c = class("IntC");
        store.set_super_types(str_a, vec![of(holder, vec![string()])]);
        store.set_super_types(str_b, vec![of(holder, vec![string()])]);
        store.set_super_types(int_c, vec![of(holder, vec![int()])]);

        let listed_param = store.declare_formal("T", Variance::Invariant);
        store.set_upper_bounds(listed_param, vec![of(DefId::LISTED, vec![string()])]);

        Self {
            ctx: Arc::new(TypeContext::new(Arc::new(store))),
            i,
            j,
            l,
            a,
            k,
            d,
            c,
            b,
            holder,
            str_a,
            str_b,
            int_c,
            listed_param,
        }
    }
}

pub(crate) fn simple(d: DefId) -> Type {
    Type::simple(d)
}

pub(crate) fn of(d: DefId, bindings: Vec<Type>) -> Type {
    Type::new(d, bindings, Nullity::NonNull)
}

pub(crate) fn param(formal: DefId) -> Type {
    Type::formal(formal, Nullity::NonNull)
}

pub(crate) fn int() -> Type {
    Type::simple(DefId::INT32)
}

pub(crate) fn string() -> Type {
    Type::simple(DefId::STRING)
}

pub(crate) fn float() -> Type {
    Type::simple(DefId::FLOAT64)
}

pub(crate) fn boolean() -> Type {
    Type::simple(DefId::BOOLEAN)
}

pub(crate) fn any() -> Type {
    Type::simple(DefId::ANY_VALUE)
}

pub(crate) fn void() -> Type {
    Type::simple(DefId::VOID)
}

pub(crate) fn list_of(t: Type) -> Type {
    of(DefId::LIST, vec![t])
}

pub(crate) fn map_of(k: Type, v: Type) -> Type {
    of(DefId::MAP, vec![k, v])
}
