//! Frozen collections produced by materialization.
//!
//! Every frozen type has three representations: a canonical empty value
//! (no allocation), a canonical singleton, and a general `Arc`-backed
//! structure. None of them exposes a mutating API, so a product holding a
//! collection can never observe later builder mutations.

use crate::config::CollectionFamily;
use crate::schema::{ElementOrder, Shape};
use crate::value::Scalar;
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::sync::Arc;

/// Which materialization path produced a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Empty,
    Singleton,
    /// General structure; `capacity` is the backing storage's capacity.
    General {
        capacity: usize,
    },
    /// An `im` persistent structure.
    Persistent,
}

#[derive(Debug, Clone)]
enum ListRepr {
    Empty,
    Single(Scalar),
    General(Arc<[Scalar]>),
}

/// Immutable order-preserving list.
#[derive(Debug, Clone)]
pub struct FrozenList {
    repr: ListRepr,
}

impl FrozenList {
    pub(crate) fn empty() -> Self {
        Self {
            repr: ListRepr::Empty,
        }
    }

    pub(crate) fn single(item: Scalar) -> Self {
        Self {
            repr: ListRepr::Single(item),
        }
    }

    pub(crate) fn general(items: Arc<[Scalar]>) -> Self {
        Self {
            repr: ListRepr::General(items),
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&Scalar> {
        self.as_slice().get(index)
    }

    pub fn as_slice(&self) -> &[Scalar] {
        match &self.repr {
            ListRepr::Empty => &[],
            ListRepr::Single(item) => std::slice::from_ref(item),
            ListRepr::General(items) => items,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scalar> {
        self.as_slice().iter()
    }

    pub fn representation(&self) -> Representation {
        match &self.repr {
            ListRepr::Empty => Representation::Empty,
            ListRepr::Single(_) => Representation::Singleton,
            ListRepr::General(items) => Representation::General {
                capacity: items.len(),
            },
        }
    }
}

#[derive(Debug, Clone)]
enum SetRepr {
    Empty,
    Single(Scalar),
    General(Arc<IndexSet<Scalar>>),
}

/// Immutable insertion-ordered hash set.
#[derive(Debug, Clone)]
pub struct FrozenSet {
    repr: SetRepr,
}

impl FrozenSet {
    pub(crate) fn empty() -> Self {
        Self {
            repr: SetRepr::Empty,
        }
    }

    pub(crate) fn single(item: Scalar) -> Self {
        Self {
            repr: SetRepr::Single(item),
        }
    }

    pub(crate) fn general(items: IndexSet<Scalar>) -> Self {
        Self {
            repr: SetRepr::General(Arc::new(items)),
        }
    }

    pub fn len(&self) -> usize {
        match &self.repr {
            SetRepr::Empty => 0,
            SetRepr::Single(_) => 1,
            SetRepr::General(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, item: &Scalar) -> bool {
        match &self.repr {
            SetRepr::Empty => false,
            SetRepr::Single(only) => only == item,
            SetRepr::General(items) => items.contains(item),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &Scalar> + '_> {
        match &self.repr {
            SetRepr::Empty => Box::new(std::iter::empty()),
            SetRepr::Single(item) => Box::new(std::iter::once(item)),
            SetRepr::General(items) => Box::new(items.iter()),
        }
    }

    pub fn representation(&self) -> Representation {
        match &self.repr {
            SetRepr::Empty => Representation::Empty,
            SetRepr::Single(_) => Representation::Singleton,
            SetRepr::General(items) => Representation::General {
                capacity: items.capacity(),
            },
        }
    }
}

/// Immutable set kept sorted by its [`ElementOrder`].
#[derive(Debug, Clone)]
pub struct FrozenSortedSet {
    repr: ListRepr,
    order: ElementOrder,
}

impl FrozenSortedSet {
    pub(crate) fn empty(order: ElementOrder) -> Self {
        Self {
            repr: ListRepr::Empty,
            order,
        }
    }

    pub(crate) fn single(item: Scalar, order: ElementOrder) -> Self {
        Self {
            repr: ListRepr::Single(item),
            order,
        }
    }

    /// `items` must already be sorted and deduplicated under `order`.
    pub(crate) fn general(items: Arc<[Scalar]>, order: ElementOrder) -> Self {
        Self {
            repr: ListRepr::General(items),
            order,
        }
    }

    fn as_slice(&self) -> &[Scalar] {
        match &self.repr {
            ListRepr::Empty => &[],
            ListRepr::Single(item) => std::slice::from_ref(item),
            ListRepr::General(items) => items,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, item: &Scalar) -> bool {
        self.as_slice()
            .binary_search_by(|probe| self.order.compare(probe, item))
            .is_ok()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scalar> {
        self.as_slice().iter()
    }

    pub fn first(&self) -> Option<&Scalar> {
        self.as_slice().first()
    }

    pub fn representation(&self) -> Representation {
        match &self.repr {
            ListRepr::Empty => Representation::Empty,
            ListRepr::Single(_) => Representation::Singleton,
            ListRepr::General(items) => Representation::General {
                capacity: items.len(),
            },
        }
    }
}

#[derive(Debug, Clone)]
enum MapRepr {
    Empty,
    Single(Scalar, Scalar),
    General(Arc<IndexMap<Scalar, Scalar>>),
}

/// Immutable map iterating in first-insertion order of its keys.
#[derive(Debug, Clone)]
pub struct FrozenMap {
    repr: MapRepr,
}

impl FrozenMap {
    pub(crate) fn empty() -> Self {
        Self {
            repr: MapRepr::Empty,
        }
    }

    pub(crate) fn single(key: Scalar, value: Scalar) -> Self {
        Self {
            repr: MapRepr::Single(key, value),
        }
    }

    pub(crate) fn general(entries: IndexMap<Scalar, Scalar>) -> Self {
        Self {
            repr: MapRepr::General(Arc::new(entries)),
        }
    }

    pub fn len(&self) -> usize {
        match &self.repr {
            MapRepr::Empty => 0,
            MapRepr::Single(..) => 1,
            MapRepr::General(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &Scalar) -> Option<&Scalar> {
        match &self.repr {
            MapRepr::Empty => None,
            MapRepr::Single(k, v) => (k == key).then_some(v),
            MapRepr::General(entries) => entries.get(key),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = (&Scalar, &Scalar)> + '_> {
        match &self.repr {
            MapRepr::Empty => Box::new(std::iter::empty()),
            MapRepr::Single(k, v) => Box::new(std::iter::once((k, v))),
            MapRepr::General(entries) => Box::new(entries.iter()),
        }
    }

    pub fn representation(&self) -> Representation {
        match &self.repr {
            MapRepr::Empty => Representation::Empty,
            MapRepr::Single(..) => Representation::Singleton,
            MapRepr::General(entries) => Representation::General {
                capacity: entries.capacity(),
            },
        }
    }
}

/// A materialized immutable collection in one of the two families.
#[derive(Debug, Clone)]
pub enum Collection {
    List(FrozenList),
    Set(FrozenSet),
    SortedSet(FrozenSortedSet),
    Map(FrozenMap),
    PersistentList(im::Vector<Scalar>),
    PersistentSet(im::HashSet<Scalar>),
    PersistentSortedSet(im::OrdSet<Scalar>),
    PersistentMap(im::HashMap<Scalar, Scalar>),
}

#[derive(PartialEq, Eq)]
enum ShapeClass {
    List,
    Set,
    SortedSet,
    Map,
}

impl Collection {
    /// The canonical empty collection for `shape`; never allocates.
    pub fn empty(shape: &Shape, family: CollectionFamily) -> Self {
        match (family, shape) {
            (CollectionFamily::Frozen, Shape::List) => Collection::List(FrozenList::empty()),
            (CollectionFamily::Frozen, Shape::Set) => Collection::Set(FrozenSet::empty()),
            (CollectionFamily::Frozen, Shape::SortedSet(order)) => {
                Collection::SortedSet(FrozenSortedSet::empty(order.clone()))
            }
            (CollectionFamily::Frozen, Shape::Map) => Collection::Map(FrozenMap::empty()),
            (CollectionFamily::Persistent, Shape::List) => {
                Collection::PersistentList(im::Vector::new())
            }
            (CollectionFamily::Persistent, Shape::Set) => {
                Collection::PersistentSet(im::HashSet::new())
            }
            (CollectionFamily::Persistent, Shape::SortedSet(_)) => {
                Collection::PersistentSortedSet(im::OrdSet::new())
            }
            (CollectionFamily::Persistent, Shape::Map) => {
                Collection::PersistentMap(im::HashMap::new())
            }
        }
    }

    fn class(&self) -> ShapeClass {
        match self {
            Collection::List(_) | Collection::PersistentList(_) => ShapeClass::List,
            Collection::Set(_) | Collection::PersistentSet(_) => ShapeClass::Set,
            Collection::SortedSet(_) | Collection::PersistentSortedSet(_) => ShapeClass::SortedSet,
            Collection::Map(_) | Collection::PersistentMap(_) => ShapeClass::Map,
        }
    }

    pub fn shape_name(&self) -> &'static str {
        match self.class() {
            ShapeClass::List => "list",
            ShapeClass::Set => "set",
            ShapeClass::SortedSet => "sorted_set",
            ShapeClass::Map => "map",
        }
    }

    /// Whether this collection has the container shape `shape` (any family).
    pub fn conforms_to(&self, shape: &Shape) -> bool {
        let expected = match shape {
            Shape::List => ShapeClass::List,
            Shape::Set => ShapeClass::Set,
            Shape::SortedSet(_) => ShapeClass::SortedSet,
            Shape::Map => ShapeClass::Map,
        };
        self.class() == expected
    }

    pub fn family(&self) -> CollectionFamily {
        match self {
            Collection::List(_)
            | Collection::Set(_)
            | Collection::SortedSet(_)
            | Collection::Map(_) => CollectionFamily::Frozen,
            _ => CollectionFamily::Persistent,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Collection::List(c) => c.len(),
            Collection::Set(c) => c.len(),
            Collection::SortedSet(c) => c.len(),
            Collection::Map(c) => c.len(),
            Collection::PersistentList(c) => c.len(),
            Collection::PersistentSet(c) => c.len(),
            Collection::PersistentSortedSet(c) => c.len(),
            Collection::PersistentMap(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements in iteration order; for maps, the keys.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Scalar> + '_> {
        match self {
            Collection::List(c) => Box::new(c.iter()),
            Collection::Set(c) => c.iter(),
            Collection::SortedSet(c) => Box::new(c.iter()),
            Collection::Map(c) => Box::new(c.iter().map(|(k, _)| k)),
            Collection::PersistentList(c) => Box::new(c.iter()),
            Collection::PersistentSet(c) => Box::new(c.iter()),
            Collection::PersistentSortedSet(c) => Box::new(c.iter()),
            Collection::PersistentMap(c) => Box::new(c.keys()),
        }
    }

    /// Key/value pairs of a map; empty for every other shape.
    pub fn entries(&self) -> Box<dyn Iterator<Item = (&Scalar, &Scalar)> + '_> {
        match self {
            Collection::Map(c) => c.iter(),
            Collection::PersistentMap(c) => Box::new(c.iter()),
            _ => Box::new(std::iter::empty()),
        }
    }

    /// Membership test; for maps, key membership.
    pub fn contains(&self, item: &Scalar) -> bool {
        match self {
            Collection::List(c) => c.iter().any(|e| e == item),
            Collection::Set(c) => c.contains(item),
            Collection::SortedSet(c) => c.contains(item),
            Collection::Map(c) => c.get(item).is_some(),
            Collection::PersistentList(c) => c.iter().any(|e| e == item),
            Collection::PersistentSet(c) => c.contains(item),
            Collection::PersistentSortedSet(c) => c.contains(item),
            Collection::PersistentMap(c) => c.contains_key(item),
        }
    }

    pub fn get(&self, key: &Scalar) -> Option<&Scalar> {
        match self {
            Collection::Map(c) => c.get(key),
            Collection::PersistentMap(c) => c.get(key),
            _ => None,
        }
    }

    pub fn representation(&self) -> Representation {
        match self {
            Collection::List(c) => c.representation(),
            Collection::Set(c) => c.representation(),
            Collection::SortedSet(c) => c.representation(),
            Collection::Map(c) => c.representation(),
            _ => Representation::Persistent,
        }
    }
}

/// Equality follows each shape's contract: lists and sorted sets compare
/// in order, sets and maps by membership. The family does not matter.
impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        let class = self.class();
        if class != other.class() || self.len() != other.len() {
            return false;
        }
        match class {
            ShapeClass::List | ShapeClass::SortedSet => self.iter().eq(other.iter()),
            ShapeClass::Set => self.iter().all(|e| other.contains(e)),
            ShapeClass::Map => self.entries().all(|(k, v)| other.get(k) == Some(v)),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if matches!(self.class(), ShapeClass::Map) {
            let entries: Vec<String> = self
                .entries()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect();
            write!(f, "{{{}}}", entries.join(", "))
        } else {
            let items: Vec<String> = self.iter().map(|e| e.to_string()).collect();
            match self.class() {
                ShapeClass::List => write!(f, "[{}]", items.join(", ")),
                _ => write!(f, "{{{}}}", items.join(", ")),
            }
        }
    }
}
