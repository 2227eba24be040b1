//! The immutable value tree.
//!
//! A [`Value`] is either an opaque scalar (`null`, boolean, number, string)
//! or one of four draftable containers: a record ([`Value::Object`]), an
//! ordered sequence ([`Value::Array`]), a key-set ([`Value::Set`]), or a
//! key/value container ([`Value::Map`]). Containers are reference-counted,
//! so cloning a `Value` is cheap and two clones share structure until one
//! of them is rebuilt.
//!
//! Two notions of equality coexist:
//!
//! - `==` is deep structural equality (floats compared by bit pattern, map
//!   and object comparison insensitive to entry order).
//! - [`Value::same`] is identity: pointer equality for containers, bit
//!   equality for scalars. This is what the draft engine uses to decide
//!   whether a child changed.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::error::ValueError;
use crate::key::Key;
use crate::number::Number;

/// Record storage: property name to value, insertion-ordered.
pub type ValueObject = IndexMap<String, Value>;
/// Key-set storage, insertion-ordered.
pub type ValueSet = IndexSet<Value>;
/// Key/value container storage with arbitrary value keys, insertion-ordered.
pub type ValueMap = IndexMap<Value, Value>;

// ── Sealed: container payload carrying the freeze bit ─────────────────────

/// Container payload with a host-level immutability flag.
///
/// The flag is observed through shared references, so freezing a value is
/// visible to every clone that still shares the payload. A payload copy
/// starts life thawed.
#[derive(Debug)]
pub struct Sealed<T> {
    frozen: AtomicBool,
    inner: T,
}

impl<T> Sealed<T> {
    pub(crate) fn new(inner: T) -> Self {
        Sealed {
            frozen: AtomicBool::new(false),
            inner,
        }
    }

    pub(crate) fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub(crate) fn frozen(&self) -> bool {
        self.frozen.load(Ordering::Relaxed)
    }

    pub(crate) fn set_frozen(&self) {
        self.frozen.store(true, Ordering::Relaxed);
    }
}

impl<T: Clone> Clone for Sealed<T> {
    fn clone(&self) -> Self {
        Sealed {
            frozen: AtomicBool::new(false),
            inner: self.inner.clone(),
        }
    }
}

impl<T> Deref for Sealed<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: PartialEq> PartialEq for Sealed<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

// ── Kind ──────────────────────────────────────────────────────────────────

/// Classification of a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
    Set,
    Map,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "sequence",
            Kind::Object => "record",
            Kind::Set => "set",
            Kind::Map => "map",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Value ─────────────────────────────────────────────────────────────────

/// An immutable value with structural sharing.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(Arc<str>),
    Array(Arc<Sealed<Vec<Value>>>),
    Object(Arc<Sealed<ValueObject>>),
    Set(Arc<Sealed<ValueSet>>),
    Map(Arc<Sealed<ValueMap>>),
}

impl Value {
    // ── Constructors ──────────────────────────────────────────────────────

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Arc::new(Sealed::new(items)))
    }

    pub fn object(entries: ValueObject) -> Value {
        Value::Object(Arc::new(Sealed::new(entries)))
    }

    pub fn set<I: IntoIterator<Item = Value>>(items: I) -> Value {
        Value::Set(Arc::new(Sealed::new(items.into_iter().collect())))
    }

    pub fn map<I: IntoIterator<Item = (Value, Value)>>(entries: I) -> Value {
        Value::Map(Arc::new(Sealed::new(entries.into_iter().collect())))
    }

    // ── Structural predicates ─────────────────────────────────────────────

    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
            Value::Set(_) => Kind::Set,
            Value::Map(_) => Kind::Map,
        }
    }

    /// True for the four container kinds a draft can wrap.
    pub fn is_draftable(&self) -> bool {
        matches!(
            self,
            Value::Array(_) | Value::Object(_) | Value::Set(_) | Value::Map(_)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Identity comparison: pointer equality for containers, bit equality
    /// for scalars (`NaN` equal to itself, `0.0` distinct from `-0.0`).
    ///
    /// # Example
    ///
    /// ```
    /// use drafty_value::value;
    ///
    /// let a = value!([1, 2]);
    /// let b = a.clone();
    /// assert!(a.same(&b));
    /// assert!(!a.same(&value!([1, 2])));
    /// ```
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// One-level copy of a container: a fresh payload whose children are
    /// shared with the original. Scalars are returned as-is.
    pub fn shallow_copy(&self) -> Value {
        match self {
            Value::Array(a) => Value::array(a.to_vec()),
            Value::Object(o) => {
                Value::object(o.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            }
            Value::Set(s) => Value::set(s.iter().cloned()),
            Value::Map(m) => Value::map(m.iter().map(|(k, v)| (k.clone(), v.clone()))),
            other => other.clone(),
        }
    }

    // ── Scalar accessors ──────────────────────────────────────────────────

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(Number::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    // ── Container accessors ───────────────────────────────────────────────

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ValueObject> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&ValueSet> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Mutable access to sequence storage. Copy-on-write: if the payload is
    /// shared (or frozen), it is cloned first and the clone starts thawed.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Some(Arc::make_mut(a).inner_mut()),
            _ => None,
        }
    }

    /// Mutable access to record storage; see [`Value::as_array_mut`].
    pub fn as_object_mut(&mut self) -> Option<&mut ValueObject> {
        match self {
            Value::Object(o) => Some(Arc::make_mut(o).inner_mut()),
            _ => None,
        }
    }

    /// Mutable access to set storage; see [`Value::as_array_mut`].
    pub fn as_set_mut(&mut self) -> Option<&mut ValueSet> {
        match self {
            Value::Set(s) => Some(Arc::make_mut(s).inner_mut()),
            _ => None,
        }
    }

    /// Mutable access to map storage; see [`Value::as_array_mut`].
    pub fn as_map_mut(&mut self) -> Option<&mut ValueMap> {
        match self {
            Value::Map(m) => Some(Arc::make_mut(m).inner_mut()),
            _ => None,
        }
    }

    // ── Keyed access ──────────────────────────────────────────────────────

    /// Number of children for containers, `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(a.len()),
            Value::Object(o) => Some(o.len()),
            Value::Set(s) => Some(s.len()),
            Value::Map(m) => Some(m.len()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len().map(|n| n == 0).unwrap_or(true)
    }

    /// Look up a child. A [`Key::Prop`] addresses the string-keyed entry
    /// when used against a map.
    pub fn get(&self, key: &Key) -> Option<&Value> {
        match (self, key) {
            (Value::Object(o), Key::Prop(s)) => o.get(s),
            (Value::Array(a), Key::Index(i)) => a.get(*i),
            (Value::Set(s), Key::Item(v)) => s.get(v),
            (Value::Map(m), Key::Item(v)) => m.get(v),
            (Value::Map(m), Key::Prop(s)) => m.get(&Value::from(s.as_str())),
            _ => None,
        }
    }

    /// Mutable child lookup (copy-on-write). Set members are not
    /// individually addressable and return `None`.
    pub fn get_mut(&mut self, key: &Key) -> Option<&mut Value> {
        match (self, key) {
            (Value::Object(o), Key::Prop(s)) => Arc::make_mut(o).inner_mut().get_mut(s),
            (Value::Array(a), Key::Index(i)) => Arc::make_mut(a).inner_mut().get_mut(*i),
            (Value::Map(m), Key::Item(v)) => Arc::make_mut(m).inner_mut().get_mut(v),
            (Value::Map(m), Key::Prop(s)) => {
                Arc::make_mut(m).inner_mut().get_mut(&Value::from(s.as_str()))
            }
            _ => None,
        }
    }

    pub fn has(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// All child keys, in container order.
    pub fn keys(&self) -> Vec<Key> {
        match self {
            Value::Object(o) => o.keys().map(|k| Key::Prop(k.clone())).collect(),
            Value::Array(a) => (0..a.len()).map(Key::Index).collect(),
            Value::Set(s) => s.iter().map(|v| Key::Item(v.clone())).collect(),
            Value::Map(m) => m.keys().map(|k| Key::Item(k.clone())).collect(),
            _ => Vec::new(),
        }
    }

    // ── Freezing ──────────────────────────────────────────────────────────

    /// Whether this value refuses edits. Scalars are inherently frozen.
    pub fn is_frozen(&self) -> bool {
        match self {
            Value::Array(a) => a.frozen(),
            Value::Object(o) => o.frozen(),
            Value::Set(s) => s.frozen(),
            Value::Map(m) => m.frozen(),
            _ => true,
        }
    }

    pub(crate) fn mark_frozen(&self) {
        match self {
            Value::Array(a) => a.set_frozen(),
            Value::Object(o) => o.set_frozen(),
            Value::Set(s) => s.set_frozen(),
            Value::Map(m) => m.set_frozen(),
            _ => {}
        }
    }

    fn check_thawed(&self, op: &'static str) -> Result<(), ValueError> {
        if !self.is_draftable() {
            return Err(ValueError::WrongKind {
                op,
                kind: self.kind(),
            });
        }
        if self.is_frozen() {
            return Err(ValueError::Frozen);
        }
        Ok(())
    }

    // ── Checked editing ───────────────────────────────────────────────────

    /// Insert or replace a child. Fails loudly on frozen containers.
    ///
    /// For sequences, an index equal to the current length appends.
    pub fn insert(&mut self, key: Key, value: Value) -> Result<Option<Value>, ValueError> {
        self.check_thawed("insert")?;
        match (&mut *self, key) {
            (Value::Object(o), Key::Prop(s)) => {
                Ok(Arc::make_mut(o).inner_mut().insert(s, value))
            }
            (Value::Map(m), Key::Item(k)) => Ok(Arc::make_mut(m).inner_mut().insert(k, value)),
            (Value::Map(m), Key::Prop(s)) => {
                Ok(Arc::make_mut(m).inner_mut().insert(Value::from(s), value))
            }
            (Value::Array(a), Key::Index(i)) => {
                let arr = Arc::make_mut(a).inner_mut();
                if i < arr.len() {
                    Ok(Some(std::mem::replace(&mut arr[i], value)))
                } else if i == arr.len() {
                    arr.push(value);
                    Ok(None)
                } else {
                    Err(ValueError::OutOfBounds {
                        index: i,
                        len: arr.len(),
                    })
                }
            }
            (this, _) => Err(ValueError::WrongKind {
                op: "insert",
                kind: this.kind(),
            }),
        }
    }

    /// Remove a child, returning it if present. Sequence removal shifts
    /// later elements down; record and map removal preserves entry order.
    pub fn remove_key(&mut self, key: &Key) -> Result<Option<Value>, ValueError> {
        self.check_thawed("remove")?;
        match (&mut *self, key) {
            (Value::Object(o), Key::Prop(s)) => {
                Ok(Arc::make_mut(o).inner_mut().shift_remove(s))
            }
            (Value::Map(m), Key::Item(v)) => Ok(Arc::make_mut(m).inner_mut().shift_remove(v)),
            (Value::Map(m), Key::Prop(s)) => Ok(Arc::make_mut(m)
                .inner_mut()
                .shift_remove(&Value::from(s.as_str()))),
            (Value::Array(a), Key::Index(i)) => {
                let arr = Arc::make_mut(a).inner_mut();
                if *i < arr.len() {
                    Ok(Some(arr.remove(*i)))
                } else {
                    Ok(None)
                }
            }
            (Value::Set(s), Key::Item(v)) => {
                Ok(Arc::make_mut(s).inner_mut().shift_take(v))
            }
            (this, _) => Err(ValueError::WrongKind {
                op: "remove",
                kind: this.kind(),
            }),
        }
    }

    /// Append to a sequence.
    pub fn push(&mut self, value: Value) -> Result<(), ValueError> {
        self.check_thawed("push")?;
        match self {
            Value::Array(a) => {
                Arc::make_mut(a).inner_mut().push(value);
                Ok(())
            }
            other => Err(ValueError::WrongKind {
                op: "push",
                kind: other.kind(),
            }),
        }
    }

    /// Add a member to a set. Returns whether the member was new.
    pub fn add_item(&mut self, value: Value) -> Result<bool, ValueError> {
        self.check_thawed("add")?;
        match self {
            Value::Set(s) => Ok(Arc::make_mut(s).inner_mut().insert(value)),
            other => Err(ValueError::WrongKind {
                op: "add",
                kind: other.kind(),
            }),
        }
    }
}

// ── Equality & hashing ────────────────────────────────────────────────────

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b) || **a == **b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b) || **a == **b,
            (Value::Set(a), Value::Set(b)) => Arc::ptr_eq(a, b) || **a == **b,
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b) || **a == **b,
            _ => false,
        }
    }
}

impl Eq for Value {}

fn entry_hash<T: Hash>(entry: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    entry.hash(&mut hasher);
    hasher.finish()
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => state.write_u8(0),
            Value::Bool(b) => {
                state.write_u8(1);
                b.hash(state);
            }
            Value::Number(n) => {
                state.write_u8(2);
                n.hash(state);
            }
            Value::String(s) => {
                state.write_u8(3);
                s.hash(state);
            }
            Value::Array(a) => {
                state.write_u8(4);
                state.write_usize(a.len());
                for v in a.iter() {
                    v.hash(state);
                }
            }
            // Unordered containers compare order-insensitively, so their
            // hashes must be order-independent: combine entry hashes with
            // a commutative fold.
            Value::Object(o) => {
                state.write_u8(5);
                state.write_usize(o.len());
                let mut acc = 0u64;
                for (k, v) in o.iter() {
                    acc = acc.wrapping_add(entry_hash(&(k, v)));
                }
                state.write_u64(acc);
            }
            Value::Set(s) => {
                state.write_u8(6);
                state.write_usize(s.len());
                let mut acc = 0u64;
                for v in s.iter() {
                    acc = acc.wrapping_add(entry_hash(v));
                }
                state.write_u64(acc);
            }
            Value::Map(m) => {
                state.write_u8(7);
                state.write_usize(m.len());
                let mut acc = 0u64;
                for (k, v) in m.iter() {
                    acc = acc.wrapping_add(entry_hash(&(k, v)));
                }
                state.write_u64(acc);
            }
        }
    }
}

// ── Display ───────────────────────────────────────────────────────────────

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{:?}", &**s),
            Value::Array(a) => {
                f.write_str("[")?;
                for (i, v) in a.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Object(o) => {
                f.write_str("{")?;
                for (i, (k, v)) in o.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Set(s) => {
                f.write_str("{")?;
                for (i, v) in s.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("}")
            }
            Value::Map(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

// ── Conversions ───────────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(Number::Int(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(Number::Int(v as i64))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(Number::Int(v as i64))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Number(Number::Int(v as i64))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(Number::Float(v))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Number(Number::Float(v as f64))
    }
}

impl From<Number> for Value {
    fn from(v: Number) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Arc::from(v.as_str()))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::array(v)
    }
}

impl From<ValueObject> for Value {
    fn from(v: ValueObject) -> Self {
        Value::object(v)
    }
}

impl From<ValueSet> for Value {
    fn from(v: ValueSet) -> Self {
        Value::Set(Arc::new(Sealed::new(v)))
    }
}

impl From<ValueMap> for Value {
    fn from(v: ValueMap) -> Self {
        Value::Map(Arc::new(Sealed::new(v)))
    }
}
