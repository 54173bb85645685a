//! Record stores.
//!
//! A store exclusively owns the loaded articles and is bounded by a record limit: once the limit
//! is reached further records are ignored. Two backends exist, the array-backed [`ArrayStore`] and
//! the linked [`ListStore`](crate::list::ListStore).

use log;

use crate::record::Article;

/// Default record limit.
pub const DEFAULT_CAPACITY: usize = 50_000;

/// Base record store interface.
pub trait RecordStore: Clone {
    /// Returns the maximum number of records the store accepts.
    fn limit(&self) -> usize;

    /// Returns the number of stored records.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if the store reached the limit.
    fn is_full(&self) -> bool {
        self.len() >= self.limit()
    }

    /// Appends a record. Returns `false` and drops the record if the store is full.
    fn push(&mut self, article: Article) -> bool;

    /// Visits the records in store order together with their position.
    fn for_each<F>(&self, f: F)
    where
        F: FnMut(usize, &Article);

    /// Appends records in bulk. Returns the number of accepted records.
    fn load<I>(&mut self, articles: I) -> usize
    where
        I: IntoIterator<Item = Article>,
    {
        let mut accepted = 0;
        let mut ignored = 0;
        for article in articles {
            if self.push(article) {
                accepted += 1;
            } else {
                ignored += 1;
            }
        }

        if ignored > 0 {
            log::warn!("record limit {} reached, {} records ignored", self.limit(), ignored);
        }
        log::debug!("{} records loaded", accepted);

        return accepted;
    }

    /// Returns a deep copy of the store. Destructive sorts run on copies so the original order
    /// survives repeated experiments.
    fn copy(&self) -> Self {
        log::debug!("copying store ({} records)", self.len());
        self.clone()
    }
}

/// Array backed store.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "memory-stats", derive(deepsize::DeepSizeOf))]
pub struct ArrayStore {
    limit: usize,
    inner: Vec<Article>,
}

impl ArrayStore {
    pub fn new(limit: usize) -> Self {
        ArrayStore {
            limit,
            inner: Vec::new(),
        }
    }

    /// Creates a store with memory reserved for `limit` records.
    pub fn with_capacity(limit: usize) -> Self {
        ArrayStore {
            limit,
            inner: Vec::with_capacity(limit),
        }
    }

    /// Creates a store and loads records into it.
    pub fn from_articles<I>(limit: usize, articles: I) -> Self
    where
        I: IntoIterator<Item = Article>,
    {
        let mut store = ArrayStore::new(limit);
        store.load(articles);
        return store;
    }

    pub fn get(&self, index: usize) -> Option<&Article> {
        self.inner.get(index)
    }

    pub fn as_slice(&self) -> &[Article] {
        self.inner.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [Article] {
        self.inner.as_mut_slice()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Article> {
        self.inner.iter()
    }

    pub fn into_vec(self) -> Vec<Article> {
        self.inner
    }
}

impl Default for ArrayStore {
    fn default() -> Self {
        ArrayStore::new(DEFAULT_CAPACITY)
    }
}

impl RecordStore for ArrayStore {
    fn limit(&self) -> usize {
        self.limit
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn push(&mut self, article: Article) -> bool {
        if self.is_full() {
            log::trace!("record ignored, store is full: {}", article.title());
            return false;
        }
        self.inner.push(article);
        return true;
    }

    fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(usize, &Article),
    {
        for (position, article) in self.inner.iter().enumerate() {
            f(position, article);
        }
    }
}

impl IntoIterator for ArrayStore {
    type Item = Article;
    type IntoIter = <Vec<Article> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}
