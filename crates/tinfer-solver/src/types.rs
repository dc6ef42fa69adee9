//! Type values, solver variables and solutions.
//!
//! ## Overview
//!
//! | Value | Meaning |
//! |-------|---------|
//! | `Type` | a definition, its bindings and a `Nullity`; fully known |
//! | `PartialType` | a shape whose bindings may mention solver variables |
//! | `TypeVarRef` | a solver variable used as a type, with its own `Nullity` |
//! | `TypeLike` | any of the three above |
//!
//! Types are immutable and reference counted, so cloning one is cheap and
//! equality is structural. Both builders apply the `Never` normalization:
//!
//! - `Never<Never<T>>` becomes `Never<T>`
//! - `Never<T?>` becomes `Never<T>?`
//!
//! with the outer and inner nullities OR-ed together.

use crate::def::{DefId, DefinitionStore};
use indexmap::IndexSet;
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Prefix of every solver variable name; user code cannot spell it.
pub const VAR_PREFIX_CHAR: char = 'ʼ';

// =============================================================================
// Nullity
// =============================================================================

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Nullity {
    #[default]
    NonNull,
    OrNull,
}

impl Nullity {
    /// `OrNull` if either side is.
    #[must_use]
    pub const fn or(self, other: Nullity) -> Nullity {
        match (self, other) {
            (Nullity::NonNull, Nullity::NonNull) => Nullity::NonNull,
            _ => Nullity::OrNull,
        }
    }

    pub const fn is_nullable(self) -> bool {
        matches!(self, Nullity::OrNull)
    }

    pub const fn from_nullable(nullable: bool) -> Nullity {
        if nullable { Nullity::OrNull } else { Nullity::NonNull }
    }
}

// =============================================================================
// Type
// =============================================================================

type Bindings = SmallVec<[Type; 2]>;

#[derive(PartialEq, Eq, Hash)]
struct TypeData {
    definition: DefId,
    /// The definition is a formal (a type parameter reference).
    param: bool,
    bindings: Bindings,
    nullity: Nullity,
}

/// A fully specified type.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Type(Arc<TypeData>);

impl Type {
    /// A shape type with `bindings`, after `Never` normalization.
    pub fn new(definition: DefId, bindings: Vec<Type>, nullity: Nullity) -> Type {
        let mut bindings = Bindings::from_vec(bindings);
        let mut nullity = nullity;
        if definition == DefId::NEVER && bindings.len() == 1 {
            let arg = &bindings[0];
            if arg.is_never() {
                return arg.with_nullity(nullity.or(arg.nullity()));
            }
            if arg.is_nullable() {
                let unwrapped = arg.non_null();
                nullity = Nullity::OrNull;
                bindings[0] = unwrapped;
            }
        }
        Type(Arc::new(TypeData {
            definition,
            param: false,
            bindings,
            nullity,
        }))
    }

    /// A non-null shape type without bindings.
    pub fn simple(definition: DefId) -> Type {
        Type::new(definition, Vec::new(), Nullity::NonNull)
    }

    /// A reference to a formal.
    pub fn formal(definition: DefId, nullity: Nullity) -> Type {
        Type(Arc::new(TypeData {
            definition,
            param: true,
            bindings: Bindings::new(),
            nullity,
        }))
    }

    /// `Never<t>`.
    pub fn never_of(t: Type) -> Type {
        Type::new(DefId::NEVER, vec![t], Nullity::NonNull)
    }

    pub fn definition(&self) -> DefId {
        self.0.definition
    }

    /// Whether this is a reference to a formal rather than a shape type.
    pub fn is_param(&self) -> bool {
        self.0.param
    }

    pub fn bindings(&self) -> &[Type] {
        &self.0.bindings
    }

    pub fn nullity(&self) -> Nullity {
        self.0.nullity
    }

    pub fn is_nullable(&self) -> bool {
        self.0.nullity.is_nullable()
    }

    pub fn is_never(&self) -> bool {
        !self.0.param && self.0.definition == DefId::NEVER
    }

    /// `self` when the nullity already matches.
    #[must_use]
    pub fn with_nullity(&self, nullity: Nullity) -> Type {
        if self.nullity() == nullity {
            self.clone()
        } else if self.is_param() {
            Type::formal(self.definition(), nullity)
        } else {
            Type::new(self.definition(), self.bindings().to_vec(), nullity)
        }
    }

    #[must_use]
    pub fn non_null(&self) -> Type {
        self.with_nullity(Nullity::NonNull)
    }

    #[must_use]
    pub fn or_null(&self) -> Type {
        self.with_nullity(Nullity::OrNull)
    }

    /// `Never<X>` to `X` and `Never<X>?` to `X?`; anything else unchanged.
    #[must_use]
    pub fn strip_never(&self) -> Type {
        if self.is_never() && self.bindings().len() == 1 {
            let inner = &self.bindings()[0];
            if self.is_nullable() {
                inner.or_null()
            } else {
                inner.clone()
            }
        } else {
            self.clone()
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_param() {
            write!(f, "'{}", self.definition())?;
        } else {
            write!(f, "{}", self.definition())?;
        }
        if !self.bindings().is_empty() {
            f.write_str("<")?;
            for (i, b) in self.bindings().iter().enumerate() {
                if i != 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{b:?}")?;
            }
            f.write_str(">")?;
        }
        if self.is_nullable() {
            f.write_str("?")?;
        }
        Ok(())
    }
}

// =============================================================================
// Partial types and solver variables
// =============================================================================

/// Names a solver variable that solves to a type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVar(pub Arc<str>);

impl TypeVar {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// The variable as a non-null binding.
    pub fn to_ref(&self) -> TypeVarRef {
        TypeVarRef {
            var: self.clone(),
            nullity: Nullity::NonNull,
        }
    }
}

/// Names a solver variable that solves to an integer or a list of types.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimpleVar(pub Arc<str>);

impl SimpleVar {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SolverVar {
    Type(TypeVar),
    Simple(SimpleVar),
}

/// A solver variable used in type position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeVarRef {
    pub var: TypeVar,
    pub nullity: Nullity,
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct PartialData {
    definition: DefId,
    bindings: Vec<TypeLike>,
    nullity: Nullity,
}

/// A shape type where at least one binding is not yet a full `Type`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PartialType(Arc<PartialData>);

impl PartialType {
    /// Builds a shape type, collapsing to a `Type` when every binding is one.
    pub fn from(definition: DefId, bindings: Vec<TypeLike>, nullity: Nullity) -> TypeLike {
        if bindings.iter().all(|b| matches!(b, TypeLike::Type(_))) {
            let full = bindings
                .into_iter()
                .filter_map(|b| match b {
                    TypeLike::Type(t) => Some(t),
                    _ => None,
                })
                .collect();
            return TypeLike::Type(Type::new(definition, full, nullity));
        }
        if definition == DefId::NEVER && bindings.len() == 1 {
            let b = &bindings[0];
            if b.definition() == Some(DefId::NEVER) && !b.is_param() {
                return b.with_nullity(nullity.or(b.nullity()));
            }
            if b.nullity().is_nullable() {
                let adjusted = vec![b.with_nullity(Nullity::NonNull)];
                return PartialType::from(definition, adjusted, Nullity::OrNull);
            }
        }
        TypeLike::Partial(PartialType(Arc::new(PartialData {
            definition,
            bindings,
            nullity,
        })))
    }

    pub fn definition(&self) -> DefId {
        self.0.definition
    }

    pub fn bindings(&self) -> &[TypeLike] {
        &self.0.bindings
    }

    pub fn nullity(&self) -> Nullity {
        self.0.nullity
    }

    /// Variables mentioned anywhere in the bindings, in first-use order.
    pub fn type_vars_used(&self) -> IndexSet<TypeVar> {
        fn scan(p: &PartialType, out: &mut IndexSet<TypeVar>) {
            for b in p.bindings() {
                match b {
                    TypeLike::Var(r) => {
                        out.insert(r.var.clone());
                    }
                    TypeLike::Partial(inner) => scan(inner, out),
                    TypeLike::Type(_) => {}
                }
            }
        }
        let mut out = IndexSet::new();
        scan(self, &mut out);
        out
    }
}

/// A type, a partial type or a variable reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeLike {
    Type(Type),
    Partial(PartialType),
    Var(TypeVarRef),
}

impl TypeLike {
    pub fn nullity(&self) -> Nullity {
        match self {
            TypeLike::Type(t) => t.nullity(),
            TypeLike::Partial(p) => p.nullity(),
            TypeLike::Var(r) => r.nullity,
        }
    }

    /// The definition, or `None` for a variable reference.
    pub fn definition(&self) -> Option<DefId> {
        match self {
            TypeLike::Type(t) => Some(t.definition()),
            TypeLike::Partial(p) => Some(p.definition()),
            TypeLike::Var(_) => None,
        }
    }

    pub fn is_param(&self) -> bool {
        matches!(self, TypeLike::Type(t) if t.is_param())
    }

    pub fn is_type_or_partial(&self) -> bool {
        !matches!(self, TypeLike::Var(_))
    }

    pub fn binding_count(&self) -> usize {
        match self {
            TypeLike::Type(t) => t.bindings().len(),
            TypeLike::Partial(p) => p.bindings().len(),
            TypeLike::Var(_) => 0,
        }
    }

    pub fn binding(&self, i: usize) -> Option<TypeLike> {
        match self {
            TypeLike::Type(t) => t.bindings().get(i).cloned().map(TypeLike::Type),
            TypeLike::Partial(p) => p.bindings().get(i).cloned(),
            TypeLike::Var(_) => None,
        }
    }

    pub fn bindings(&self) -> Vec<TypeLike> {
        match self {
            TypeLike::Type(t) => t.bindings().iter().cloned().map(TypeLike::Type).collect(),
            TypeLike::Partial(p) => p.bindings().to_vec(),
            TypeLike::Var(_) => Vec::new(),
        }
    }

    pub fn as_type(&self) -> Option<&Type> {
        match self {
            TypeLike::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_var(&self) -> Option<&TypeVarRef> {
        match self {
            TypeLike::Var(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn with_nullity(&self, nullity: Nullity) -> TypeLike {
        if self.nullity() == nullity {
            return self.clone();
        }
        match self {
            TypeLike::Type(t) => TypeLike::Type(t.with_nullity(nullity)),
            TypeLike::Partial(p) => PartialType::from(p.definition(), p.bindings().to_vec(), nullity),
            TypeLike::Var(r) => TypeLike::Var(TypeVarRef {
                var: r.var.clone(),
                nullity,
            }),
        }
    }

    #[must_use]
    pub fn non_null(&self) -> TypeLike {
        self.with_nullity(Nullity::NonNull)
    }

    /// Variables mentioned by this type-like: none for a type, itself for a
    /// reference.
    pub fn type_vars_used(&self) -> IndexSet<TypeVar> {
        match self {
            TypeLike::Type(_) => IndexSet::new(),
            TypeLike::Partial(p) => p.type_vars_used(),
            TypeLike::Var(r) => std::iter::once(r.var.clone()).collect(),
        }
    }
}

impl From<Type> for TypeLike {
    fn from(t: Type) -> Self {
        TypeLike::Type(t)
    }
}

impl From<TypeVarRef> for TypeLike {
    fn from(r: TypeVarRef) -> Self {
        TypeLike::Var(r)
    }
}

// =============================================================================
// Literal values
// =============================================================================

/// A literal whose type is derived from its runtime tag.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Boolean(bool),
    Float64(f64),
    Int(i32),
    Int64(i64),
    String(Arc<str>),
    Null,
    Void,
    List(Vec<Value>),
    ListBuilder(Vec<Value>),
    Map(Vec<(Value, Value)>),
    MapBuilder(Vec<(Value, Value)>),
    /// An instance of the class with this definition.
    Class(DefId),
    Function,
}

/// A literal used as a type boundary. Two bounds are equal only if they came
/// from the same construction. Ids come from a [`SolverVarNamer`], so bounds
/// are only comparable within one session.
#[derive(Clone, Debug)]
pub struct ValueBound {
    id: u64,
    value: Arc<Value>,
}

impl ValueBound {
    fn with_id(id: u64, value: Value) -> Self {
        Self {
            id,
            value: Arc::new(value),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl PartialEq for ValueBound {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ValueBound {}

impl Hash for ValueBound {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// =============================================================================
// Solvables and solutions
// =============================================================================

/// Something whose type the solver determines.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeBoundary {
    Var(TypeVar),
    Like(TypeLike),
    Value(ValueBound),
}

impl From<TypeVar> for TypeBoundary {
    fn from(v: TypeVar) -> Self {
        TypeBoundary::Var(v)
    }
}

impl From<TypeLike> for TypeBoundary {
    fn from(t: TypeLike) -> Self {
        TypeBoundary::Like(t)
    }
}

impl From<Type> for TypeBoundary {
    fn from(t: Type) -> Self {
        TypeBoundary::Like(TypeLike::Type(t))
    }
}

impl From<TypeVarRef> for TypeBoundary {
    fn from(r: TypeVarRef) -> Self {
        TypeBoundary::Like(TypeLike::Var(r))
    }
}

/// A node key in the constraint graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Solvable {
    Boundary(TypeBoundary),
    Simple(SimpleVar),
}

impl From<TypeBoundary> for Solvable {
    fn from(b: TypeBoundary) -> Self {
        Solvable::Boundary(b)
    }
}

impl From<TypeVar> for Solvable {
    fn from(v: TypeVar) -> Self {
        Solvable::Boundary(TypeBoundary::Var(v))
    }
}

impl From<TypeLike> for Solvable {
    fn from(t: TypeLike) -> Self {
        Solvable::Boundary(TypeBoundary::Like(t))
    }
}

impl From<SimpleVar> for Solvable {
    fn from(v: SimpleVar) -> Self {
        Solvable::Simple(v)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeSolution {
    Type(Type),
    Unsolvable,
}

impl TypeSolution {
    pub fn as_type(&self) -> Option<&Type> {
        match self {
            TypeSolution::Type(t) => Some(t),
            TypeSolution::Unsolvable => None,
        }
    }
}

/// What a node is chosen as.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Solution {
    Type(Type),
    Unsolvable,
    TypeList(Vec<TypeSolution>),
    /// An index, as in the chosen callee.
    Int(usize),
}

impl Solution {
    pub const fn is_unsolvable(&self) -> bool {
        matches!(self, Solution::Unsolvable)
    }

    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Solution::Type(t) => Some(t),
            _ => None,
        }
    }

    /// Narrows to a type solution; lists and integers give `None`.
    pub fn as_type_solution(&self) -> Option<TypeSolution> {
        match self {
            Solution::Type(t) => Some(TypeSolution::Type(t.clone())),
            Solution::Unsolvable => Some(TypeSolution::Unsolvable),
            Solution::TypeList(_) | Solution::Int(_) => None,
        }
    }
}

impl From<TypeSolution> for Solution {
    fn from(s: TypeSolution) -> Self {
        match s {
            TypeSolution::Type(t) => Solution::Type(t),
            TypeSolution::Unsolvable => Solution::Unsolvable,
        }
    }
}

// =============================================================================
// Variable naming
// =============================================================================

/// Hands out fresh variable names for one session.
#[derive(Debug, Default)]
pub struct SolverVarNamer {
    counter: u32,
    value_counter: u64,
}

impl SolverVarNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `ʼ{hint}{n}` for a counter `n` never reused by this namer.
    pub fn unused_name(&mut self, hint: &str) -> String {
        let n = self.counter;
        self.counter += 1;
        format!("{VAR_PREFIX_CHAR}{hint}{n}")
    }

    pub fn unused_type_var(&mut self, hint: &str) -> TypeVar {
        TypeVar::new(&self.unused_name(hint))
    }

    pub fn unused_simple_var(&mut self, hint: &str) -> SimpleVar {
        SimpleVar::new(&self.unused_name(hint))
    }

    /// A literal boundary distinct from every other one this namer made.
    pub fn value_bound(&mut self, value: Value) -> ValueBound {
        self.value_counter += 1;
        ValueBound::with_id(self.value_counter, value)
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Rendering that needs definition names.
pub trait Render {
    fn render(&self, store: &DefinitionStore, f: &mut fmt::Formatter<'_>) -> fmt::Result;

    fn display<'a>(&'a self, store: &'a DefinitionStore) -> Displayed<'a, Self>
    where
        Self: Sized,
    {
        Displayed { value: self, store }
    }
}

/// Adapter returned by `Render::display`.
pub struct Displayed<'a, T: Render> {
    value: &'a T,
    store: &'a DefinitionStore,
}

impl<T: Render> fmt::Display for Displayed<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.render(self.store, f)
    }
}

fn render_shape<B: Render>(
    store: &DefinitionStore,
    definition: DefId,
    bindings: &[B],
    nullity: Nullity,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.write_str(&store.name(definition))?;
    if !bindings.is_empty() {
        f.write_str("<")?;
        for (i, b) in bindings.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            b.render(store, f)?;
        }
        f.write_str(">")?;
    }
    if nullity.is_nullable() {
        f.write_str("?")?;
    }
    Ok(())
}

impl Render for Type {
    fn render(&self, store: &DefinitionStore, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render_shape(store, self.definition(), self.bindings(), self.nullity(), f)
    }
}

impl Render for PartialType {
    fn render(&self, store: &DefinitionStore, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render_shape(store, self.definition(), self.bindings(), self.nullity(), f)
    }
}

impl Render for TypeLike {
    fn render(&self, store: &DefinitionStore, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeLike::Type(t) => t.render(store, f),
            TypeLike::Partial(p) => p.render(store, f),
            TypeLike::Var(r) => {
                f.write_str(r.var.name())?;
                if r.nullity.is_nullable() {
                    f.write_str("?")?;
                }
                Ok(())
            }
        }
    }
}

impl Render for TypeSolution {
    fn render(&self, store: &DefinitionStore, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSolution::Type(t) => t.render(store, f),
            TypeSolution::Unsolvable => f.write_str("unsolvable"),
        }
    }
}

impl Render for Solution {
    fn render(&self, store: &DefinitionStore, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Solution::Type(t) => t.render(store, f),
            Solution::Unsolvable => f.write_str("unsolvable"),
            Solution::Int(n) => write!(f, "{n}"),
            Solution::TypeList(ts) => {
                f.write_str("[")?;
                for (i, t) in ts.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    t.render(store, f)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl Render for TypeBoundary {
    fn render(&self, store: &DefinitionStore, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeBoundary::Var(v) => f.write_str(v.name()),
            TypeBoundary::Like(t) => t.render(store, f),
            TypeBoundary::Value(v) => write!(f, "ValueBound({:?})", v.value()),
        }
    }
}

impl Render for Solvable {
    fn render(&self, store: &DefinitionStore, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Solvable::Boundary(b) => b.render(store, f),
            Solvable::Simple(v) => f.write_str(v.name()),
        }
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
