//! Linear and binary search over record stores.
//!
//! A miss is always an empty result. Binary searches expect input sorted by the searched key and
//! return the whole run of equal keys as a position range.

use std::cmp::Ordering;
use std::ops::Range;

use crate::list::{ListStore, NodeId};
use crate::record::Article;

/// Returns the positions of all items matching the predicate, in order.
pub fn linear_search_by<T, P>(items: &[T], mut predicate: P) -> Vec<usize>
where
    P: FnMut(&T) -> bool,
{
    let mut positions = Vec::new();
    for (position, item) in items.iter().enumerate() {
        if predicate(item) {
            positions.push(position);
        }
    }
    return positions;
}

/// Returns the positions of all articles published in `year`. Works on unsorted input.
pub fn linear_search_by_year(articles: &[Article], year: u16) -> Vec<usize> {
    linear_search_by(articles, |article| article.year() == year)
}

/// Finds the run of items for which `probe` returns [`Ordering::Equal`].
///
/// `probe` reports how an item orders relative to the target. Any matching item is located by
/// recursive halving, then the boundaries are widened to cover all equal neighbours.
pub fn binary_search_run_by<T, F>(items: &[T], mut probe: F) -> Range<usize>
where
    F: FnMut(&T) -> Ordering,
{
    let hit = match find_any(items, 0, items.len(), &mut probe) {
        Some(hit) => hit,
        None => return 0..0,
    };

    let mut start = hit;
    while start > 0 && probe(&items[start - 1]) == Ordering::Equal {
        start -= 1;
    }
    let mut end = hit + 1;
    while end < items.len() && probe(&items[end]) == Ordering::Equal {
        end += 1;
    }

    return start..end;
}

fn find_any<T, F>(items: &[T], lo: usize, hi: usize, probe: &mut F) -> Option<usize>
where
    F: FnMut(&T) -> Ordering,
{
    if lo >= hi {
        return None;
    }

    let mid = lo + (hi - lo) / 2;
    match probe(&items[mid]) {
        Ordering::Equal => Some(mid),
        Ordering::Less => find_any(items, mid + 1, hi, probe),
        Ordering::Greater => find_any(items, lo, mid, probe),
    }
}

/// Returns the position range of articles published in `year`.
/// The articles must be sorted by year.
pub fn binary_search_by_year(articles: &[Article], year: u16) -> Range<usize> {
    binary_search_run_by(articles, |article| article.year().cmp(&year))
}

/// Returns the position range of articles with exactly this title.
/// The articles must be sorted by title.
pub fn binary_search_by_title(articles: &[Article], title: &str) -> Range<usize> {
    binary_search_run_by(articles, |article| article.title().as_bytes().cmp(title.as_bytes()))
}

/// Returns the positions of all list records published in `year`.
pub fn linear_search_list_by_year(list: &ListStore, year: u16) -> Vec<usize> {
    let mut positions = Vec::new();
    for (position, article) in list.iter().enumerate() {
        if article.year() == year {
            positions.push(position);
        }
    }
    return positions;
}

/// Binary search over a list sorted by year.
///
/// The search keeps a `[start, end)` window of nodes and finds its middle with slow/fast pointers.
/// Once a node of the target year is hit, the window is scanned to collect the full run.
pub fn binary_search_list_by_year(list: &ListStore, year: u16) -> Range<usize> {
    let mut start = list.head();
    let mut start_position = 0;
    let mut end: Option<NodeId> = None;

    while let Some(first) = start {
        if start == end {
            break;
        }

        let (mid, offset) = middle(list, first, end);
        match list.article(mid).year().cmp(&year) {
            Ordering::Equal => return collect_run(list, first, start_position, end, year),
            Ordering::Less => {
                start = list.next(mid);
                start_position += offset + 1;
            }
            Ordering::Greater => end = Some(mid),
        }
    }

    return 0..0;
}

/// Returns the middle node of `[start, end)` and its offset from `start`.
fn middle(list: &ListStore, start: NodeId, end: Option<NodeId>) -> (NodeId, usize) {
    let mut slow = start;
    let mut offset = 0;
    let mut fast = Some(start);

    while let Some(f) = fast {
        if Some(f) == end {
            break;
        }
        let after = list.next(f);
        if after == end {
            break;
        }
        if let Some(next) = list.next(slow) {
            slow = next;
            offset += 1;
        }
        fast = after.and_then(|n| list.next(n));
    }

    (slow, offset)
}

fn collect_run(list: &ListStore, first: NodeId, first_position: usize, end: Option<NodeId>, year: u16) -> Range<usize> {
    let mut run: Option<Range<usize>> = None;
    let mut cursor = Some(first);
    let mut position = first_position;

    while cursor != end {
        let id = match cursor {
            Some(id) => id,
            None => break,
        };
        if list.article(id).year() == year {
            run = match run {
                Some(run) => Some(run.start..position + 1),
                None => Some(position..position + 1),
            };
        }
        cursor = list.next(id);
        position += 1;
    }

    run.unwrap_or(0..0)
}
