//! Definition identifiers and storage for nominal types.
//!
//! Every type names its definition through a `DefId`. A definition is either a
//! *shape* (a class or interface with formals and declared supertypes) or a
//! *formal* (a type parameter with a variance and upper bounds, itself usable
//! as a type).
//!
//! The store is populated before inference and then only read, so one
//! `Arc<DefinitionStore>` can serve many sessions on many threads.
//!
//! ## `DefId` layout
//!
//! | Range | Contents |
//! |-------|----------|
//! | `1..32` | well-known shapes |
//! | `32..64` | formals of well-known shapes |
//! | `64..` | user declarations and synthesized function interfaces |

use crate::signature::Signature;
use crate::types::{Nullity, Type};
use bitflags::bitflags;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

// =============================================================================
// DefId
// =============================================================================

/// Identifies a shape or a formal within a `DefinitionStore`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefId(pub u32);

impl DefId {
    pub const ANY_VALUE: Self = Self(1);
    pub const BOOLEAN: Self = Self(2);
    pub const BUBBLE: Self = Self(3);
    pub const EQUATABLE: Self = Self(4);
    pub const FLOAT64: Self = Self(5);
    pub const FUNCTION: Self = Self(6);
    pub const INT32: Self = Self(7);
    pub const INT64: Self = Self(8);
    pub const INVALID: Self = Self(9);
    pub const LIST: Self = Self(10);
    pub const LISTED: Self = Self(11);
    pub const LIST_BUILDER: Self = Self(12);
    pub const MAP: Self = Self(13);
    pub const MAPPED: Self = Self(14);
    pub const MAP_BUILDER: Self = Self(15);
    pub const MAP_KEY: Self = Self(16);
    pub const NEVER: Self = Self(17);
    pub const NULL: Self = Self(18);
    pub const RESULT: Self = Self(19);
    pub const STRING: Self = Self(20);
    pub const TYPE: Self = Self(21);
    pub const VOID: Self = Self(22);

    pub const LIST_T: Self = Self(32);
    pub const LISTED_T: Self = Self(33);
    pub const LIST_BUILDER_T: Self = Self(34);
    pub const MAP_K: Self = Self(35);
    pub const MAP_V: Self = Self(36);
    pub const MAPPED_K: Self = Self(37);
    pub const MAPPED_V: Self = Self(38);
    pub const MAP_BUILDER_K: Self = Self(39);
    pub const MAP_BUILDER_V: Self = Self(40);
    pub const NEVER_T: Self = Self(41);
    pub const RESULT_PASS: Self = Self(42);

    /// First id handed out by `DefinitionStore::allocate`.
    pub const FIRST_USER: u32 = 64;

    pub const fn is_builtin(self) -> bool {
        self.0 < Self::FIRST_USER
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Definition metadata
// =============================================================================

/// How a formal's binding relates to the enclosing type's subtype direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variance {
    /// `out T`: `C<Sub> <: C<Super>`.
    Covariant,
    /// `in T`: `C<Super> <: C<Sub>`.
    Contravariant,
    /// Bindings must be equal.
    Invariant,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Abstractness {
    Abstract,
    Concrete,
}

bitflags! {
    /// Per-shape markers.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ShapeFlags: u8 {
        /// The shape's sole abstract method stands in for a function type.
        const FUNCTIONAL_INTERFACE = 1 << 0;
        /// One of the builtin shapes registered by `DefinitionStore::new`.
        const WELL_KNOWN = 1 << 1;
        /// Created on demand by `DefinitionStore::function_interface`.
        const SYNTHESIZED = 1 << 2;
    }
}

#[derive(Clone, Debug)]
pub struct ShapeInfo {
    /// Formals in declaration order.
    pub formals: Vec<DefId>,
    /// Direct supertypes, expressed over this shape's formals.
    pub super_types: Vec<Type>,
    pub abstractness: Abstractness,
    pub flags: ShapeFlags,
    /// For functional interfaces, the signature of the abstract method.
    pub apply_signature: Option<Arc<Signature>>,
}

#[derive(Clone, Debug)]
pub struct FormalInfo {
    pub variance: Variance,
    pub upper_bounds: Vec<Type>,
    /// The shape declaring this formal, if any. Signature-level formals have none.
    pub owner: Option<DefId>,
}

#[derive(Clone, Debug)]
pub enum DefinitionKind {
    Shape(ShapeInfo),
    Formal(FormalInfo),
}

/// Everything the store knows about one definition.
#[derive(Clone, Debug)]
pub struct DefinitionInfo {
    /// Name used when rendering types.
    pub name: Arc<str>,
    pub kind: DefinitionKind,
}

impl DefinitionInfo {
    pub fn shape(name: &str, abstractness: Abstractness) -> Self {
        Self {
            name: name.into(),
            kind: DefinitionKind::Shape(ShapeInfo {
                formals: Vec::new(),
                super_types: vec![Type::simple(DefId::ANY_VALUE)],
                abstractness,
                flags: ShapeFlags::empty(),
                apply_signature: None,
            }),
        }
    }

    pub fn formal(name: &str, variance: Variance) -> Self {
        Self {
            name: name.into(),
            kind: DefinitionKind::Formal(FormalInfo {
                variance,
                upper_bounds: vec![Type::simple(DefId::ANY_VALUE)],
                owner: None,
            }),
        }
    }

    pub const fn as_shape(&self) -> Option<&ShapeInfo> {
        match &self.kind {
            DefinitionKind::Shape(s) => Some(s),
            DefinitionKind::Formal(_) => None,
        }
    }

    pub const fn as_formal(&self) -> Option<&FormalInfo> {
        match &self.kind {
            DefinitionKind::Formal(f) => Some(f),
            DefinitionKind::Shape(_) => None,
        }
    }
}

/// Key for synthesized function interfaces.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct FnInterfaceKey {
    n_required: usize,
    n_optional: usize,
    has_rest: bool,
    bubbly: bool,
}

// =============================================================================
// DefinitionStore
// =============================================================================

/// Thread-safe storage for shape and formal definitions.
///
/// Declaration methods take `&self`; they are meant to run before any
/// `TypeContext` caches are populated, since caches assume definitions never
/// change afterwards.
pub struct DefinitionStore {
    definitions: DashMap<DefId, Arc<DefinitionInfo>>,
    next_id: AtomicU32,
    function_interfaces: DashMap<FnInterfaceKey, DefId>,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    /// A store holding only the well-known builtins.
    pub fn new() -> Self {
        let store = Self {
            definitions: DashMap::new(),
            next_id: AtomicU32::new(DefId::FIRST_USER),
            function_interfaces: DashMap::new(),
        };
        store.register_builtins();
        store
    }

    fn allocate(&self) -> DefId {
        DefId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Insert a definition under a fresh id.
    pub fn register(&self, info: DefinitionInfo) -> DefId {
        let id = self.allocate();
        trace!(def_id = %id, name = %info.name, "DefinitionStore::register");
        self.definitions.insert(id, Arc::new(info));
        id
    }

    /// Declare a shape extending `AnyValue` with no formals.
    pub fn declare_shape(&self, name: &str, abstractness: Abstractness) -> DefId {
        self.register(DefinitionInfo::shape(name, abstractness))
    }

    /// Declare a free-standing formal bounded by `AnyValue`, e.g. a function's `<T>`.
    pub fn declare_formal(&self, name: &str, variance: Variance) -> DefId {
        self.register(DefinitionInfo::formal(name, variance))
    }

    /// Declare a formal and append it to `shape`'s formals.
    pub fn add_formal(&self, shape: DefId, name: &str, variance: Variance) -> DefId {
        let mut info = DefinitionInfo::formal(name, variance);
        if let DefinitionKind::Formal(f) = &mut info.kind {
            f.owner = Some(shape);
        }
        let id = self.register(info);
        self.update_shape(shape, |s| s.formals.push(id));
        id
    }

    pub fn set_super_types(&self, shape: DefId, super_types: Vec<Type>) {
        self.update_shape(shape, |s| s.super_types = super_types);
    }

    pub fn set_upper_bounds(&self, formal: DefId, upper_bounds: Vec<Type>) {
        if let Some(mut entry) = self.definitions.get_mut(&formal) {
            if let DefinitionKind::Formal(f) = &mut Arc::make_mut(entry.value_mut()).kind {
                f.upper_bounds = upper_bounds;
            }
        }
    }

    /// Tag `shape` as a functional interface whose abstract method has `apply`.
    pub fn mark_functional_interface(&self, shape: DefId, apply: Signature) {
        self.update_shape(shape, |s| {
            s.flags |= ShapeFlags::FUNCTIONAL_INTERFACE;
            s.apply_signature = Some(Arc::new(apply));
        });
    }

    fn update_shape(&self, shape: DefId, f: impl FnOnce(&mut ShapeInfo)) {
        if let Some(mut entry) = self.definitions.get_mut(&shape) {
            if let DefinitionKind::Shape(s) = &mut Arc::make_mut(entry.value_mut()).kind {
                f(s);
            }
        }
    }

    pub fn get(&self, id: DefId) -> Option<Arc<DefinitionInfo>> {
        self.definitions.get(&id).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, id: DefId) -> bool {
        self.definitions.contains_key(&id)
    }

    pub fn name(&self, id: DefId) -> Arc<str> {
        self.definitions
            .get(&id)
            .map(|r| Arc::clone(&r.name))
            .unwrap_or_else(|| Arc::from(format!("{id}").as_str()))
    }

    pub fn is_formal(&self, id: DefId) -> bool {
        self.definitions
            .get(&id)
            .is_some_and(|r| r.as_formal().is_some())
    }

    /// Formals of a shape; empty for formals and unknown ids.
    pub fn formals(&self, id: DefId) -> Vec<DefId> {
        self.definitions
            .get(&id)
            .and_then(|r| r.as_shape().map(|s| s.formals.clone()))
            .unwrap_or_default()
    }

    pub fn formal_count(&self, id: DefId) -> usize {
        self.definitions
            .get(&id)
            .and_then(|r| r.as_shape().map(|s| s.formals.len()))
            .unwrap_or(0)
    }

    pub fn variance(&self, formal: DefId) -> Variance {
        self.definitions
            .get(&formal)
            .and_then(|r| r.as_formal().map(|f| f.variance))
            .unwrap_or(Variance::Invariant)
    }

    pub fn upper_bounds(&self, formal: DefId) -> Vec<Type> {
        self.definitions
            .get(&formal)
            .and_then(|r| r.as_formal().map(|f| f.upper_bounds.clone()))
            .unwrap_or_default()
    }

    pub fn super_types(&self, shape: DefId) -> Vec<Type> {
        self.definitions
            .get(&shape)
            .and_then(|r| r.as_shape().map(|s| s.super_types.clone()))
            .unwrap_or_default()
    }

    pub fn abstractness(&self, shape: DefId) -> Abstractness {
        self.definitions
            .get(&shape)
            .and_then(|r| r.as_shape().map(|s| s.abstractness))
            .unwrap_or(Abstractness::Abstract)
    }

    pub fn flags(&self, shape: DefId) -> ShapeFlags {
        self.definitions
            .get(&shape)
            .and_then(|r| r.as_shape().map(|s| s.flags))
            .unwrap_or_default()
    }

    pub fn is_functional_interface(&self, shape: DefId) -> bool {
        self.flags(shape).contains(ShapeFlags::FUNCTIONAL_INTERFACE)
    }

    pub fn apply_signature(&self, shape: DefId) -> Option<Arc<Signature>> {
        self.definitions
            .get(&shape)
            .and_then(|r| r.as_shape().and_then(|s| s.apply_signature.clone()))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    // =========================================================================
    // Function types
    // =========================================================================

    /// The functional interface standing for functions with the given inputs.
    ///
    /// The interface is abstract, extends `Function`, and has one formal per
    /// required and optional input (`I`, contravariant), one for the rest
    /// input (`REST`, contravariant) and one for the output (`O`, covariant).
    /// Its apply method returns `O`, or `Result<O, Bubble>` when `bubbly`.
    /// Interfaces are created once per key.
    pub fn function_interface(
        &self,
        n_required: usize,
        n_optional: usize,
        has_rest: bool,
        bubbly: bool,
    ) -> DefId {
        let key = FnInterfaceKey {
            n_required,
            n_optional,
            has_rest,
            bubbly,
        };
        if let Some(id) = self.function_interfaces.get(&key) {
            return *id;
        }
        let entry = self.function_interfaces.entry(key);
        *entry.or_insert_with(|| self.synthesize_function_interface(key))
    }

    fn synthesize_function_interface(&self, key: FnInterfaceKey) -> DefId {
        let mut info = DefinitionInfo::shape("Fn", Abstractness::Abstract);
        if let DefinitionKind::Shape(s) = &mut info.kind {
            s.super_types = vec![Type::simple(DefId::FUNCTION)];
            s.flags = ShapeFlags::SYNTHESIZED;
        }
        let id = self.register(info);

        let inputs: Vec<DefId> = (0..key.n_required + key.n_optional)
            .map(|_| self.add_formal(id, "I", Variance::Contravariant))
            .collect();
        let rest = key
            .has_rest
            .then(|| self.add_formal(id, "REST", Variance::Contravariant));
        let output = self.add_formal(id, "O", Variance::Covariant);

        let output_type = Type::formal(output, Nullity::NonNull);
        let return_type = if key.bubbly {
            Type::new(
                DefId::RESULT,
                vec![output_type, Type::simple(DefId::BUBBLE)],
                Nullity::NonNull,
            )
        } else {
            output_type
        };
        let as_type = |f: &DefId| Type::formal(*f, Nullity::NonNull);
        let apply = Signature {
            return_type,
            has_this_formal: false,
            required: inputs[..key.n_required].iter().map(as_type).collect(),
            optional: inputs[key.n_required..].iter().map(as_type).collect(),
            rest: rest.as_ref().map(as_type),
            type_formals: Vec::new(),
            input_names: Vec::new(),
        };
        self.mark_functional_interface(id, apply);
        trace!(
            def_id = %id,
            n_required = key.n_required,
            n_optional = key.n_optional,
            has_rest = key.has_rest,
            bubbly = key.bubbly,
            "synthesized function interface"
        );
        id
    }

    /// A function type `(required, optional..., ...rest) -> output`.
    pub fn function_type(
        &self,
        required: Vec<Type>,
        optional: Vec<Type>,
        rest: Option<Type>,
        output: Type,
        bubbly: bool,
    ) -> Type {
        let defn = self.function_interface(required.len(), optional.len(), rest.is_some(), bubbly);
        let mut bindings = required;
        bindings.extend(optional);
        bindings.extend(rest);
        bindings.push(output);
        Type::new(defn, bindings, Nullity::NonNull)
    }

    // =========================================================================
    // Builtins
    // =========================================================================

    fn insert_builtin(&self, id: DefId, info: DefinitionInfo) {
        self.definitions.insert(id, Arc::new(info));
    }

    fn builtin_shape(&self, id: DefId, name: &str, abstractness: Abstractness, supers: Vec<Type>) {
        let mut info = DefinitionInfo::shape(name, abstractness);
        if let DefinitionKind::Shape(s) = &mut info.kind {
            s.super_types = supers;
            s.flags = ShapeFlags::WELL_KNOWN;
        }
        self.insert_builtin(id, info);
    }

    fn builtin_formal(&self, shape: DefId, id: DefId, name: &str, variance: Variance) {
        let mut info = DefinitionInfo::formal(name, variance);
        if let DefinitionKind::Formal(f) = &mut info.kind {
            f.owner = Some(shape);
        }
        self.insert_builtin(id, info);
        self.update_shape(shape, |s| s.formals.push(id));
    }

    fn register_builtins(&self) {
        use Abstractness::{Abstract, Concrete};
        let any = || vec![Type::simple(DefId::ANY_VALUE)];
        let equatable = || vec![Type::simple(DefId::EQUATABLE)];
        let map_key = || vec![Type::simple(DefId::MAP_KEY)];
        let param = |f: DefId| Type::formal(f, Nullity::NonNull);

        self.builtin_shape(DefId::ANY_VALUE, "AnyValue", Abstract, Vec::new());
        self.builtin_shape(DefId::BOOLEAN, "Boolean", Concrete, equatable());
        self.builtin_shape(DefId::BUBBLE, "Bubble", Concrete, any());
        self.builtin_shape(DefId::EQUATABLE, "Equatable", Abstract, any());
        self.builtin_shape(DefId::FLOAT64, "Float64", Concrete, equatable());
        self.builtin_shape(DefId::FUNCTION, "Function", Abstract, any());
        self.builtin_shape(DefId::INT32, "Int32", Concrete, map_key());
        self.builtin_shape(DefId::INT64, "Int64", Concrete, any());
        self.builtin_shape(DefId::INVALID, "Invalid", Abstract, Vec::new());
        self.builtin_shape(DefId::MAP_KEY, "MapKey", Abstract, equatable());
        self.builtin_shape(DefId::NULL, "Null", Concrete, equatable());
        self.builtin_shape(DefId::STRING, "String", Concrete, map_key());
        self.builtin_shape(DefId::TYPE, "Type", Concrete, any());
        self.builtin_shape(DefId::VOID, "Void", Concrete, Vec::new());

        self.builtin_shape(DefId::LISTED, "Listed", Abstract, any());
        self.builtin_formal(DefId::LISTED, DefId::LISTED_T, "T", Variance::Invariant);
        self.builtin_shape(
            DefId::LIST,
            "List",
            Concrete,
            vec![Type::new(DefId::LISTED, vec![param(DefId::LIST_T)], Nullity::NonNull)],
        );
        self.builtin_formal(DefId::LIST, DefId::LIST_T, "T", Variance::Covariant);
        self.builtin_shape(
            DefId::LIST_BUILDER,
            "ListBuilder",
            Concrete,
            vec![Type::new(
                DefId::LISTED,
                vec![param(DefId::LIST_BUILDER_T)],
                Nullity::NonNull,
            )],
        );
        self.builtin_formal(DefId::LIST_BUILDER, DefId::LIST_BUILDER_T, "T", Variance::Invariant);

        self.builtin_shape(DefId::MAPPED, "Mapped", Abstract, any());
        self.builtin_formal(DefId::MAPPED, DefId::MAPPED_K, "K", Variance::Contravariant);
        self.builtin_formal(DefId::MAPPED, DefId::MAPPED_V, "V", Variance::Invariant);
        let mapped = |k: DefId, v: DefId| {
            vec![Type::new(DefId::MAPPED, vec![param(k), param(v)], Nullity::NonNull)]
        };
        self.builtin_shape(DefId::MAP, "Map", Concrete, mapped(DefId::MAP_K, DefId::MAP_V));
        self.builtin_formal(DefId::MAP, DefId::MAP_K, "K", Variance::Contravariant);
        self.builtin_formal(DefId::MAP, DefId::MAP_V, "V", Variance::Covariant);
        self.builtin_shape(
            DefId::MAP_BUILDER,
            "MapBuilder",
            Concrete,
            mapped(DefId::MAP_BUILDER_K, DefId::MAP_BUILDER_V),
        );
        self.builtin_formal(DefId::MAP_BUILDER, DefId::MAP_BUILDER_K, "K", Variance::Invariant);
        self.builtin_formal(DefId::MAP_BUILDER, DefId::MAP_BUILDER_V, "V", Variance::Invariant);
        for key in [DefId::MAP_K, DefId::MAPPED_K, DefId::MAP_BUILDER_K] {
            self.set_upper_bounds(key, vec![Type::simple(DefId::MAP_KEY)]);
        }

        self.builtin_shape(DefId::NEVER, "Never", Abstract, any());
        self.builtin_formal(DefId::NEVER, DefId::NEVER_T, "T", Variance::Covariant);

        // Result takes one or more bindings; only the pass formal is declared.
        self.builtin_shape(DefId::RESULT, "Result", Concrete, Vec::new());
        self.builtin_formal(DefId::RESULT, DefId::RESULT_PASS, "P", Variance::Invariant);
    }
}

#[cfg(test)]
#[path = "../tests/def_tests.rs"]
mod tests;
