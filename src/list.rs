//! Singly linked record store.
//!
//! Nodes live in an arena and link to each other by index, so sorting only rewrites `next` links and
//! never moves a record. The list is terminated by a `None` link.

use std::cmp::Ordering;

use log;

use crate::compare::SortKey;
use crate::record::Article;
use crate::sort::{Algorithm, SortStats};
use crate::store::{RecordStore, DEFAULT_CAPACITY};

/// Index of a node in the list arena.
pub type NodeId = usize;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "memory-stats", derive(deepsize::DeepSizeOf))]
struct Node {
    article: Article,
    next: Option<NodeId>,
}

/// Head and tail of a detached chain of nodes.
#[derive(Default)]
struct Chain {
    head: Option<NodeId>,
    tail: Option<NodeId>,
}

/// Linked list backed store.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "memory-stats", derive(deepsize::DeepSizeOf))]
pub struct ListStore {
    limit: usize,
    nodes: Vec<Node>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
}

impl ListStore {
    pub fn new(limit: usize) -> Self {
        ListStore {
            limit,
            nodes: Vec::new(),
            head: None,
            tail: None,
        }
    }

    /// Creates a list and appends records to it.
    pub fn from_articles<I>(limit: usize, articles: I) -> Self
    where
        I: IntoIterator<Item = Article>,
    {
        let mut list = ListStore::new(limit);
        list.load(articles);
        return list;
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    /// Returns the node following `id`.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this list.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].next
    }

    /// Returns the record held by node `id`.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this list.
    pub fn article(&self, id: NodeId) -> &Article {
        &self.nodes[id].article
    }

    /// Iterates over records in link order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    /// Consumes the list and returns its records in link order.
    pub fn into_vec(self) -> Vec<Article> {
        let links: Vec<Option<NodeId>> = self.nodes.iter().map(|node| node.next).collect();
        let mut slots: Vec<Option<Article>> = self.nodes.into_iter().map(|node| Some(node.article)).collect();

        let mut articles = Vec::with_capacity(slots.len());
        let mut cursor = self.head;
        while let Some(id) = cursor {
            if let Some(article) = slots[id].take() {
                articles.push(article);
            }
            cursor = links[id];
        }
        return articles;
    }

    /// Sorts the list by `key` with `algorithm`.
    /// Returns [`None`] if the algorithm has no linked list implementation.
    pub fn sort(&mut self, algorithm: Algorithm, key: SortKey) -> Option<SortStats> {
        let stats = match algorithm {
            Algorithm::Quick => self.quick_sort_by(key.comparator(), |a| key.is_comparable(a)),
            Algorithm::Insertion => self.insertion_sort_by(key.comparator()),
            Algorithm::Merge => self.merge_sort_by(key.comparator()),
            Algorithm::Selection | Algorithm::Bubble => return None,
        };

        log::debug!(
            "list {} done (items: {}, comparisons: {}, max depth: {})",
            algorithm,
            self.len(),
            stats.comparisons,
            stats.max_depth
        );

        return Some(stats);
    }

    /// Quicksort by relinking. The pivot is the last node of every sub-list; nodes are spliced
    /// into a "less" chain, the pivot and a "greater or equal" chain.
    ///
    /// Nodes for which `comparable` is false are never passed to `compare`: they are routed to the
    /// "less" chain in arrival order, so they end up at the front of the list in input order.
    pub fn quick_sort_by<F, V>(&mut self, mut compare: F, comparable: V) -> SortStats
    where
        F: FnMut(&Article, &Article) -> Ordering,
        V: Fn(&Article) -> bool,
    {
        let mut stats = SortStats::default();
        if let Some(head) = self.head {
            let (head, tail) = self.quick_sort_chain(head, 1, &mut compare, &comparable, &mut stats);
            self.head = Some(head);
            self.tail = Some(tail);
        }
        return stats;
    }

    fn quick_sort_chain<F, V>(
        &mut self,
        head: NodeId,
        depth: usize,
        compare: &mut F,
        comparable: &V,
        stats: &mut SortStats,
    ) -> (NodeId, NodeId)
    where
        F: FnMut(&Article, &Article) -> Ordering,
        V: Fn(&Article) -> bool,
    {
        stats.enter(depth);

        let mut pivot = head;
        while let Some(next) = self.nodes[pivot].next {
            pivot = next;
        }
        if pivot == head {
            return (head, head);
        }

        let pivot_comparable = comparable(&self.nodes[pivot].article);
        let mut less = Chain::default();
        let mut greater = Chain::default();

        let mut cursor = Some(head);
        while let Some(id) = cursor {
            if id == pivot {
                break;
            }
            cursor = self.nodes[id].next;

            let goes_less = if !comparable(&self.nodes[id].article) {
                true
            } else if !pivot_comparable {
                false
            } else {
                stats.compare(compare, &self.nodes[id].article, &self.nodes[pivot].article) == Ordering::Less
            };

            if goes_less {
                self.append(&mut less, id);
            } else {
                self.append(&mut greater, id);
            }
        }
        self.nodes[pivot].next = None;

        let mut sorted_head = pivot;
        let mut sorted_tail = pivot;
        if let Some(less_head) = less.head {
            let (head, tail) = self.quick_sort_chain(less_head, depth + 1, compare, comparable, stats);
            self.nodes[tail].next = Some(pivot);
            sorted_head = head;
        }
        if let Some(greater_head) = greater.head {
            let (head, tail) = self.quick_sort_chain(greater_head, depth + 1, compare, comparable, stats);
            self.nodes[pivot].next = Some(head);
            sorted_tail = tail;
        }

        return (sorted_head, sorted_tail);
    }

    /// Stable insertion sort by splicing nodes into a growing sorted chain.
    /// Already sorted input costs one comparison per node.
    pub fn insertion_sort_by<F>(&mut self, mut compare: F) -> SortStats
    where
        F: FnMut(&Article, &Article) -> Ordering,
    {
        let mut stats = SortStats::default();
        let mut sorted = Chain::default();

        let mut cursor = self.head;
        while let Some(id) = cursor {
            cursor = self.nodes[id].next;

            let (sorted_head, sorted_tail) = match (sorted.head, sorted.tail) {
                (Some(head), Some(tail)) => (head, tail),
                _ => {
                    self.append(&mut sorted, id);
                    continue;
                }
            };

            if stats.compare(&mut compare, &self.nodes[id].article, &self.nodes[sorted_tail].article) != Ordering::Less {
                self.append(&mut sorted, id);
                continue;
            }

            if stats.compare(&mut compare, &self.nodes[id].article, &self.nodes[sorted_head].article) == Ordering::Less {
                self.nodes[id].next = Some(sorted_head);
                sorted.head = Some(id);
                continue;
            }

            // the tail compares greater, so the insertion point is strictly before it
            let mut prev = sorted_head;
            while let Some(next) = self.nodes[prev].next {
                if stats.compare(&mut compare, &self.nodes[id].article, &self.nodes[next].article) == Ordering::Less {
                    break;
                }
                prev = next;
            }
            self.nodes[id].next = self.nodes[prev].next;
            self.nodes[prev].next = Some(id);
        }

        self.head = sorted.head;
        self.tail = sorted.tail;
        return stats;
    }

    /// Stable merge sort. Halves are found with slow/fast pointers.
    pub fn merge_sort_by<F>(&mut self, mut compare: F) -> SortStats
    where
        F: FnMut(&Article, &Article) -> Ordering,
    {
        let mut stats = SortStats::default();
        if let Some(head) = self.head {
            self.head = Some(self.merge_sort_chain(head, 1, &mut compare, &mut stats));
            self.tail = self.find_tail();
        }
        return stats;
    }

    fn merge_sort_chain<F>(&mut self, head: NodeId, depth: usize, compare: &mut F, stats: &mut SortStats) -> NodeId
    where
        F: FnMut(&Article, &Article) -> Ordering,
    {
        stats.enter(depth);

        let second = match self.split(head) {
            Some(second) => second,
            None => return head,
        };

        let left = self.merge_sort_chain(head, depth + 1, compare, stats);
        let right = self.merge_sort_chain(second, depth + 1, compare, stats);

        return self.merge(left, right, compare, stats);
    }

    /// Cuts the chain starting at `head` in two halves and returns the head of the second one.
    fn split(&mut self, head: NodeId) -> Option<NodeId> {
        let mut slow = head;
        let mut fast = self.nodes[head].next.and_then(|n| self.nodes[n].next);
        while let Some(f) = fast {
            if let Some(s) = self.nodes[slow].next {
                slow = s;
            }
            fast = self.nodes[f].next.and_then(|n| self.nodes[n].next);
        }
        self.nodes[slow].next.take()
    }

    fn merge<F>(&mut self, left_head: NodeId, right_head: NodeId, compare: &mut F, stats: &mut SortStats) -> NodeId
    where
        F: FnMut(&Article, &Article) -> Ordering,
    {
        let mut merged = Chain::default();
        let mut left = Some(left_head);
        let mut right = Some(right_head);

        loop {
            match (left, right) {
                (Some(l), Some(r)) => {
                    if stats.compare(compare, &self.nodes[r].article, &self.nodes[l].article) == Ordering::Less {
                        right = self.nodes[r].next;
                        self.append(&mut merged, r);
                    } else {
                        left = self.nodes[l].next;
                        self.append(&mut merged, l);
                    }
                }
                (Some(rest), None) | (None, Some(rest)) => {
                    match merged.tail {
                        Some(tail) => self.nodes[tail].next = Some(rest),
                        None => merged.head = Some(rest),
                    }
                    break;
                }
                (None, None) => break,
            }
        }

        // both inputs are non-empty, so the merged chain always has a head
        merged.head.unwrap_or(left_head)
    }

    fn append(&mut self, chain: &mut Chain, id: NodeId) {
        self.nodes[id].next = None;
        match chain.tail {
            Some(tail) => self.nodes[tail].next = Some(id),
            None => chain.head = Some(id),
        }
        chain.tail = Some(id);
    }

    fn find_tail(&self) -> Option<NodeId> {
        let mut cursor = self.head?;
        while let Some(next) = self.nodes[cursor].next {
            cursor = next;
        }
        Some(cursor)
    }
}

impl Default for ListStore {
    fn default() -> Self {
        ListStore::new(DEFAULT_CAPACITY)
    }
}

impl RecordStore for ListStore {
    fn limit(&self) -> usize {
        self.limit
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn push(&mut self, article: Article) -> bool {
        if self.is_full() {
            log::trace!("record ignored, list is full: {}", article.title());
            return false;
        }

        let id = self.nodes.len();
        self.nodes.push(Node { article, next: None });
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);

        return true;
    }

    fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(usize, &Article),
    {
        for (position, article) in self.iter().enumerate() {
            f(position, article);
        }
    }
}

/// Iterator over list records in link order.
pub struct Iter<'a> {
    list: &'a ListStore,
    cursor: Option<NodeId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Article;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        self.cursor = self.list.nodes[id].next;
        Some(&self.list.nodes[id].article)
    }
}
