//! Freezing accumulation buffers into immutable collections.
//!
//! Singular parameters append into a growable [`Buffer`] whose final size is
//! unknown until build time. [`materialize`] then picks the smallest
//! representation for that size: the canonical empty value, a singleton, or
//! a general structure allocated once with [`capacity`] so inserting every
//! buffered element never triggers a resize.
//!
//! Elements are always cloned out of the buffer, so a materialized
//! collection is a snapshot: later appends to the buffer cannot reach it.

use crate::collection::{Collection, FrozenList, FrozenMap, FrozenSet, FrozenSortedSet};
use crate::config::CollectionFamily;
use crate::schema::{ElementOrder, Shape};
use crate::value::Scalar;
use indexmap::{IndexMap, IndexSet};
use std::cmp::Ordering;
use tracing::trace;

/// Sizes at or above this use [`MAX_CAPACITY`] instead of the formula.
pub const CAPACITY_THRESHOLD: usize = 1 << 30;

pub const MAX_CAPACITY: usize = i32::MAX as usize;

/// Table capacity for `n` elements at a 0.75 load factor.
pub fn capacity(n: usize) -> usize {
    if n < CAPACITY_THRESHOLD {
        1 + n + n.saturating_sub(3) / 3
    } else {
        MAX_CAPACITY
    }
}

/// Accumulation buffer of a singular parameter. The variant fixes the
/// shape the buffer materializes into.
#[derive(Debug, Clone)]
pub enum Buffer {
    List(Vec<Scalar>),
    Set(Vec<Scalar>),
    SortedSet(Vec<Scalar>, ElementOrder),
    Map(Vec<(Scalar, Scalar)>),
}

impl Buffer {
    pub fn for_shape(shape: &Shape) -> Self {
        match shape {
            Shape::List => Buffer::List(Vec::new()),
            Shape::Set => Buffer::Set(Vec::new()),
            Shape::SortedSet(order) => Buffer::SortedSet(Vec::new(), order.clone()),
            Shape::Map => Buffer::Map(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Buffer::List(items) | Buffer::Set(items) | Buffer::SortedSet(items, _) => items.len(),
            Buffer::Map(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element storage, or `None` for a map buffer.
    pub fn elements_mut(&mut self) -> Option<&mut Vec<Scalar>> {
        match self {
            Buffer::List(items) | Buffer::Set(items) | Buffer::SortedSet(items, _) => Some(items),
            Buffer::Map(_) => None,
        }
    }

    /// Entry storage, or `None` for an element buffer.
    pub fn entries_mut(&mut self) -> Option<&mut Vec<(Scalar, Scalar)>> {
        match self {
            Buffer::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Freezes `buffer` into an immutable collection of `family`.
pub fn materialize(buffer: &Buffer, family: CollectionFamily) -> Collection {
    trace!(
        "Materializing {} buffered item(s) into {:?} collection",
        buffer.len(),
        family
    );
    match buffer {
        Buffer::List(items) => list(items, family),
        Buffer::Set(items) => set(items, family),
        Buffer::SortedSet(items, order) => sorted_set(items, order, family),
        Buffer::Map(entries) => map(entries, family),
    }
}

/// Materializes an iterator of elements into `shape`. Map shapes need
/// entries and yield the empty map here.
pub fn collect<I>(shape: &Shape, family: CollectionFamily, items: I) -> Collection
where
    I: IntoIterator<Item = Scalar>,
{
    let mut buffer = Buffer::for_shape(shape);
    if let Some(storage) = buffer.elements_mut() {
        storage.extend(items);
    }
    materialize(&buffer, family)
}

/// Materializes key/value pairs into a map.
pub fn collect_entries<I>(family: CollectionFamily, entries: I) -> Collection
where
    I: IntoIterator<Item = (Scalar, Scalar)>,
{
    map(&entries.into_iter().collect::<Vec<_>>(), family)
}

fn list(items: &[Scalar], family: CollectionFamily) -> Collection {
    match family {
        CollectionFamily::Frozen => Collection::List(match items {
            [] => FrozenList::empty(),
            [only] => FrozenList::single(only.clone()),
            _ => FrozenList::general(items.into()),
        }),
        CollectionFamily::Persistent => Collection::PersistentList(match items {
            [] => im::Vector::new(),
            [only] => im::Vector::unit(only.clone()),
            _ => items.iter().cloned().collect(),
        }),
    }
}

fn set(items: &[Scalar], family: CollectionFamily) -> Collection {
    match family {
        CollectionFamily::Frozen => Collection::Set(match items {
            [] => FrozenSet::empty(),
            [only] => FrozenSet::single(only.clone()),
            _ => {
                let mut general = IndexSet::with_capacity(capacity(items.len()));
                general.extend(items.iter().cloned());
                FrozenSet::general(general)
            }
        }),
        CollectionFamily::Persistent => Collection::PersistentSet(match items {
            [] => im::HashSet::new(),
            [only] => im::HashSet::unit(only.clone()),
            _ => items.iter().cloned().collect(),
        }),
    }
}

/// Duplicates under `order` collapse to the first one buffered. The
/// persistent family always orders naturally; synthesis rejects other
/// orders for it.
fn sorted_set(items: &[Scalar], order: &ElementOrder, family: CollectionFamily) -> Collection {
    match family {
        CollectionFamily::Frozen => Collection::SortedSet(match items {
            [] => FrozenSortedSet::empty(order.clone()),
            [only] => FrozenSortedSet::single(only.clone(), order.clone()),
            _ => {
                let mut sorted = items.to_vec();
                sorted.sort_by(|a, b| order.compare(a, b));
                sorted.dedup_by(|later, earlier| order.compare(later, earlier) == Ordering::Equal);
                FrozenSortedSet::general(sorted.into(), order.clone())
            }
        }),
        CollectionFamily::Persistent => Collection::PersistentSortedSet(match items {
            [] => im::OrdSet::new(),
            [only] => im::OrdSet::unit(only.clone()),
            _ => items.iter().cloned().collect(),
        }),
    }
}

/// Last write wins for a repeated key; iteration keeps the key's first
/// position.
fn map(entries: &[(Scalar, Scalar)], family: CollectionFamily) -> Collection {
    match family {
        CollectionFamily::Frozen => Collection::Map(match entries {
            [] => FrozenMap::empty(),
            [(key, value)] => FrozenMap::single(key.clone(), value.clone()),
            _ => {
                let mut general = IndexMap::with_capacity(capacity(entries.len()));
                for (key, value) in entries {
                    general.insert(key.clone(), value.clone());
                }
                FrozenMap::general(general)
            }
        }),
        CollectionFamily::Persistent => Collection::PersistentMap(match entries {
            [] => im::HashMap::new(),
            [(key, value)] => im::HashMap::unit(key.clone(), value.clone()),
            _ => entries.iter().cloned().collect(),
        }),
    }
}
