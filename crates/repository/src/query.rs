use std::cmp::Ordering;
use std::sync::Arc;

use crate::Entity;

type Predicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type Comparator<E> = Arc<dyn Fn(&E, &E) -> Ordering + Send + Sync>;

/// Builder for `find_all` queries.
///
/// Allows filtering by an arbitrary predicate, sorting by a comparator and
/// paging with skip/take. Stores evaluate the options in that order:
/// filter, then sort, then skip, then take.
pub struct FindOptions<E> {
    /// Keep only entities matching this predicate.
    filter: Option<Predicate<E>>,

    /// Sort matching entities with this comparator.
    order: Option<Comparator<E>>,

    /// Reverse the comparator's order.
    descending: bool,

    /// Number of entities to skip.
    skip: Option<usize>,

    /// Maximum number of entities to return.
    take: Option<usize>,

    /// Unique key lookup a store can answer from its key index.
    unique_key: Option<(&'static str, String)>,
}

impl<E> FindOptions<E> {
    /// Creates options that match everything in store order.
    pub fn new() -> Self {
        Self {
            filter: None,
            order: None,
            descending: false,
            skip: None,
            take: None,
            unique_key: None,
        }
    }

    /// Adds a predicate. Calling it again combines both with AND.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
        E: 'static,
    {
        self.filter = Some(match self.filter.take() {
            Some(existing) => Arc::new(move |e: &E| existing(e) && predicate(e)),
            None => Arc::new(predicate),
        });
        self
    }

    /// Sorts by a key extracted from each entity.
    pub fn order_by_key<K, F>(mut self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&E) -> K + Send + Sync + 'static,
    {
        self.order = Some(Arc::new(move |a: &E, b: &E| key(a).cmp(&key(b))));
        self
    }

    /// Sorts with an explicit comparator.
    pub fn order_by<F>(mut self, compare: F) -> Self
    where
        F: Fn(&E, &E) -> Ordering + Send + Sync + 'static,
    {
        self.order = Some(Arc::new(compare));
        self
    }

    /// Reverses the sort order.
    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    /// Skips the first `count` matches.
    pub fn skip(mut self, count: usize) -> Self {
        self.skip = Some(count);
        self
    }

    /// Returns at most `count` matches.
    pub fn take(mut self, count: usize) -> Self {
        self.take = Some(count);
        self
    }

    /// Returns true if the entity passes the filter.
    pub fn matches(&self, entity: &E) -> bool {
        self.filter.as_ref().is_none_or(|f| f(entity))
    }

    /// The unique key lookup, if [`unique_key`](Self::unique_key) was set.
    pub fn key_lookup(&self) -> Option<(&'static str, &str)> {
        self.unique_key
            .as_ref()
            .map(|(key, value)| (*key, value.as_str()))
    }

    /// True when results keep store order and only paging applies, so a
    /// store may page natively instead of loading every row.
    pub fn pages_in_store_order(&self) -> bool {
        self.filter.is_none() && self.order.is_none()
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    pub fn skip_count(&self) -> Option<usize> {
        self.skip
    }

    pub fn take_count(&self) -> Option<usize> {
        self.take
    }

    /// Applies filter, ordering and paging to a set of entities.
    pub fn apply(&self, entities: impl IntoIterator<Item = E>) -> Vec<E> {
        let mut matched: Vec<E> = entities.into_iter().filter(|e| self.matches(e)).collect();

        if let Some(ref compare) = self.order {
            if self.descending {
                matched.sort_by(|a, b| compare(b, a));
            } else {
                matched.sort_by(|a, b| compare(a, b));
            }
        } else if self.descending {
            matched.reverse();
        }

        let skip = self.skip.unwrap_or(0);
        let take = self.take.unwrap_or(usize::MAX);
        matched.into_iter().skip(skip).take(take).collect()
    }
}

impl<E: Entity> FindOptions<E> {
    /// Keeps only the aggregate holding `value` under the unique key `key`.
    ///
    /// Also installed as a predicate, so stores without a key index get
    /// the same answer.
    pub fn unique_key(self, key: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        let wanted = value.clone();
        let mut options = self.filter(move |e: &E| {
            e.unique_keys()
                .iter()
                .any(|(k, held)| *k == key && *held == wanted)
        });
        options.unique_key = Some((key, value));
        options
    }
}

impl<E> Default for FindOptions<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for FindOptions<E> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            order: self.order.clone(),
            descending: self.descending,
            skip: self.skip,
            take: self.take,
            unique_key: self.unique_key.clone(),
        }
    }
}

impl<E> std::fmt::Debug for FindOptions<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FindOptions")
            .field("filtered", &self.filter.is_some())
            .field("ordered", &self.order.is_some())
            .field("descending", &self.descending)
            .field("skip", &self.skip)
            .field("take", &self.take)
            .field("unique_key", &self.unique_key)
            .finish()
    }
}
