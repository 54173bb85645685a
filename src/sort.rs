//! In-place sorting algorithms over slices.
//!
//! All algorithms take an arbitrary comparator and report [`SortStats`] so that different strategies
//! can be compared on the same input. None of them delegate to the standard library sort.

use std::cmp::Ordering;
use std::fmt;
use std::fmt::{Display, Formatter};

use log;
use serde;

/// Sorting algorithm.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Algorithm {
    /// Lomuto quicksort, last element as pivot. O(n log n) average, O(n²) worst case.
    Quick,
    /// O(n²), O(n) on already sorted input. Stable.
    Insertion,
    /// O(n²) regardless of input.
    Selection,
    /// O(n log n) always. Stable.
    Merge,
    /// O(n²) with early exit. Stable.
    Bubble,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Quick,
        Algorithm::Insertion,
        Algorithm::Selection,
        Algorithm::Merge,
        Algorithm::Bubble,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Quick => "quick sort",
            Algorithm::Insertion => "insertion sort",
            Algorithm::Selection => "selection sort",
            Algorithm::Merge => "merge sort",
            Algorithm::Bubble => "bubble sort",
        }
    }

    /// Checks whether the algorithm has a linked list implementation.
    pub fn supports_list(&self) -> bool {
        matches!(self, Algorithm::Quick | Algorithm::Insertion | Algorithm::Merge)
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Counters collected during a single sort invocation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SortStats {
    /// Number of comparator calls.
    pub comparisons: u64,
    /// Deepest recursion level reached. Zero for iterative algorithms.
    pub max_depth: usize,
    /// Number of recursive calls, including the outermost one.
    pub recursive_calls: u64,
}

impl SortStats {
    pub(crate) fn enter(&mut self, depth: usize) {
        self.recursive_calls += 1;
        if depth > self.max_depth {
            self.max_depth = depth;
        }
    }

    pub(crate) fn compare<T, F>(&mut self, compare: &mut F, a: &T, b: &T) -> Ordering
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.comparisons += 1;
        compare(a, b)
    }
}

/// Sorts items with the chosen algorithm.
pub fn sort_by<T, F>(algorithm: Algorithm, items: &mut [T], compare: F) -> SortStats
where
    F: FnMut(&T, &T) -> Ordering,
{
    let stats = match algorithm {
        Algorithm::Quick => quick_sort_by(items, compare),
        Algorithm::Insertion => insertion_sort_by(items, compare),
        Algorithm::Selection => selection_sort_by(items, compare),
        Algorithm::Merge => merge_sort_by(items, compare),
        Algorithm::Bubble => bubble_sort_by(items, compare),
    };

    log::debug!(
        "{} done (items: {}, comparisons: {}, max depth: {})",
        algorithm,
        items.len(),
        stats.comparisons,
        stats.max_depth
    );

    return stats;
}

/// Checks that no adjacent pair compares [`Ordering::Greater`].
pub fn is_sorted_by<T, F>(items: &[T], mut compare: F) -> bool
where
    F: FnMut(&T, &T) -> Ordering,
{
    items.windows(2).all(|w| compare(&w[0], &w[1]) != Ordering::Greater)
}

/// Lomuto quicksort. Pivot is the last element of each range.
///
/// Recursion depth grows linearly on sorted input or long runs of equal keys.
pub fn quick_sort_by<T, F>(items: &mut [T], mut compare: F) -> SortStats
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut stats = SortStats::default();
    if items.len() > 1 {
        quick_sort_range(items, 0, items.len() - 1, 1, &mut compare, &mut stats);
    }
    return stats;
}

fn quick_sort_range<T, F>(items: &mut [T], lo: usize, hi: usize, depth: usize, compare: &mut F, stats: &mut SortStats)
where
    F: FnMut(&T, &T) -> Ordering,
{
    stats.enter(depth);
    if lo >= hi {
        return;
    }

    let pivot = partition(items, lo, hi, compare, stats);
    if pivot > lo {
        quick_sort_range(items, lo, pivot - 1, depth + 1, compare, stats);
    }
    quick_sort_range(items, pivot + 1, hi, depth + 1, compare, stats);
}

/// Partitions `items[lo..=hi]` around `items[hi]`.
/// Everything left of the returned index compares less than the pivot.
fn partition<T, F>(items: &mut [T], lo: usize, hi: usize, compare: &mut F, stats: &mut SortStats) -> usize
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut store = lo;
    for j in lo..hi {
        if stats.compare(compare, &items[j], &items[hi]) == Ordering::Less {
            items.swap(store, j);
            store += 1;
        }
    }
    items.swap(store, hi);

    return store;
}

/// Insertion sort by adjacent shifting.
pub fn insertion_sort_by<T, F>(items: &mut [T], mut compare: F) -> SortStats
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut stats = SortStats::default();
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && stats.compare(&mut compare, &items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
    return stats;
}

/// Selection sort. Picks the smallest remaining element on every pass;
/// pass a reversed comparator to sort in descending order.
pub fn selection_sort_by<T, F>(items: &mut [T], mut compare: F) -> SortStats
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut stats = SortStats::default();
    for i in 0..items.len() {
        let mut selected = i;
        for j in i + 1..items.len() {
            if stats.compare(&mut compare, &items[j], &items[selected]) == Ordering::Less {
                selected = j;
            }
        }
        if selected != i {
            items.swap(i, selected);
        }
    }
    return stats;
}

/// Top-down merge sort with a midpoint split.
///
/// The merge passes work on an index permutation; every element is moved once at the end.
pub fn merge_sort_by<T, F>(items: &mut [T], mut compare: F) -> SortStats
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut stats = SortStats::default();
    if items.len() > 1 {
        let mut order: Vec<usize> = (0..items.len()).collect();
        let sorted: &[T] = items;
        let mut compare_at = |a: &usize, b: &usize| compare(&sorted[*a], &sorted[*b]);
        merge_sort_range(&mut order, 1, &mut compare_at, &mut stats);

        apply_permutation(items, order);
    }
    return stats;
}

fn merge_sort_range<F>(order: &mut [usize], depth: usize, compare: &mut F, stats: &mut SortStats)
where
    F: FnMut(&usize, &usize) -> Ordering,
{
    stats.enter(depth);
    if order.len() <= 1 {
        return;
    }

    let mid = order.len() / 2;
    {
        let (left, right) = order.split_at_mut(mid);
        merge_sort_range(left, depth + 1, compare, stats);
        merge_sort_range(right, depth + 1, compare, stats);
    }
    merge(order, mid, compare, stats);
}

/// Merges the sorted halves `order[..mid]` and `order[mid..]`. Left items win ties.
fn merge<F>(order: &mut [usize], mid: usize, compare: &mut F, stats: &mut SortStats)
where
    F: FnMut(&usize, &usize) -> Ordering,
{
    let mut left = order[..mid].to_vec().into_iter().peekable();
    let mut right = order[mid..].to_vec().into_iter().peekable();

    for slot in order.iter_mut() {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => stats.compare(compare, r, l) == Ordering::Less,
            (None, Some(_)) => true,
            _ => false,
        };
        let next = if take_right { right.next() } else { left.next() };
        if let Some(index) = next {
            *slot = index;
        }
    }
}

/// Reorders `items` so that position `k` holds the element found at `order[k]`.
/// Follows every permutation cycle once, swapping elements into place.
fn apply_permutation<T>(items: &mut [T], mut order: Vec<usize>) {
    for start in 0..items.len() {
        let mut current = start;
        while order[current] != start {
            let next = order[current];
            items.swap(current, next);
            order[current] = current;
            current = next;
        }
        order[current] = current;
    }
}

/// Bubble sort. Stops after the first pass without swaps.
pub fn bubble_sort_by<T, F>(items: &mut [T], mut compare: F) -> SortStats
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut stats = SortStats::default();
    let mut unsorted = items.len();
    while unsorted > 1 {
        let mut swapped = false;
        for j in 0..unsorted - 1 {
            if stats.compare(&mut compare, &items[j], &items[j + 1]) == Ordering::Greater {
                items.swap(j, j + 1);
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
        unsorted -= 1;
    }
    return stats;
}

#[cfg(test)]
pub(crate) mod test {
    use std::collections::HashMap;

    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use rstest::*;

    use super::{apply_permutation, is_sorted_by, merge_sort_by, quick_sort_by, selection_sort_by, sort_by, Algorithm};
    use crate::compare::SortKey;
    use crate::record::{Article, Label};

    /// Random articles with few distinct years and titles, and some missing dates.
    pub(crate) fn random_articles(count: usize, seed: u64) -> Vec<Article> {
        let mut rng = StdRng::seed_from_u64(seed);
        let titles = ["Alpha", "beta", "Gamma", "delta", "Epsilon", "zeta"];

        (0..count)
            .map(|i| {
                let date = if rng.gen_ratio(1, 10) {
                    "NA".to_string()
                } else {
                    format!(
                        "{:02}-{:02}-{}",
                        rng.gen_range(1..=28),
                        rng.gen_range(1..=12),
                        rng.gen_range(2015..=2017)
                    )
                };
                let label = if rng.gen_bool(0.5) { Label::Fake } else { Label::True };
                let title = titles.choose(&mut rng).unwrap();
                Article::new(*title, format!("body {}", i), "politics", date, label)
            })
            .collect()
    }

    pub(crate) fn multiset(articles: &[Article]) -> HashMap<&Article, usize> {
        let mut counts = HashMap::new();
        for article in articles {
            *counts.entry(article).or_insert(0) += 1;
        }
        counts
    }

    #[rstest]
    fn test_sort_orders_and_permutes(
        #[values(
            Algorithm::Quick,
            Algorithm::Insertion,
            Algorithm::Selection,
            Algorithm::Merge,
            Algorithm::Bubble
        )]
        algorithm: Algorithm,
        #[values(SortKey::Year, SortKey::Title, SortKey::Date)] key: SortKey,
    ) {
        let original = random_articles(300, 7);
        let mut sorted = original.clone();

        sort_by(algorithm, &mut sorted, key.comparator());

        assert!(is_sorted_by(&sorted, key.comparator()));
        assert_eq!(sorted.len(), original.len());
        assert_eq!(multiset(&sorted), multiset(&original));
    }

    #[rstest]
    fn test_sort_idempotent(
        #[values(
            Algorithm::Quick,
            Algorithm::Insertion,
            Algorithm::Selection,
            Algorithm::Merge,
            Algorithm::Bubble
        )]
        algorithm: Algorithm,
    ) {
        let mut once = random_articles(100, 11);
        sort_by(Algorithm::Merge, &mut once, SortKey::Date.comparator());
        let mut twice = once.clone();

        sort_by(algorithm, &mut twice, SortKey::Date.comparator());

        assert!(is_sorted_by(&twice, SortKey::Date.comparator()));
        // the Lomuto partition moves the pivot in front of its equal keys
        if algorithm != Algorithm::Quick {
            assert_eq!(twice, once);
        }
    }

    #[test]
    fn test_quick_sort_idempotent_on_distinct_keys() {
        let once: Vec<Article> = (0..60)
            .map(|i| Article::new(format!("title {:03}", i), format!("body {}", i), "News", "NA", Label::True))
            .collect();
        let mut twice = once.clone();

        sort_by(Algorithm::Quick, &mut twice, SortKey::Title.comparator());

        assert_eq!(twice, once);
    }

    #[test]
    fn test_merge_sort_moves_without_clone() {
        #[derive(Debug, PartialEq)]
        struct Owned(Box<i32>);

        let mut items: Vec<Owned> = vec![5, 3, 9, 1, 3, 7].into_iter().map(|v| Owned(Box::new(v))).collect();

        merge_sort_by(&mut items, |a: &Owned, b: &Owned| a.0.cmp(&b.0));

        let values: Vec<i32> = items.iter().map(|o| *o.0).collect();
        assert_eq!(values, vec![1, 3, 3, 5, 7, 9]);
    }

    #[rstest]
    #[case(vec![2, 0, 1], vec!['c', 'a', 'b'])]
    #[case(vec![0, 1, 2], vec!['a', 'b', 'c'])]
    #[case(vec![2, 1, 0], vec!['c', 'b', 'a'])]
    #[case(vec![1, 2, 0], vec!['b', 'c', 'a'])]
    fn test_apply_permutation(#[case] order: Vec<usize>, #[case] expected: Vec<char>) {
        let mut items = vec!['a', 'b', 'c'];

        apply_permutation(&mut items, order);

        assert_eq!(items, expected);
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![42])]
    #[case(vec![2, 1])]
    #[case(vec![5, 5, 5, 5])]
    #[case(vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0])]
    fn test_sort_small_inputs(#[case] input: Vec<i32>) {
        let mut expected = input.clone();
        expected.sort();

        for algorithm in Algorithm::ALL {
            let mut actual = input.clone();
            sort_by(algorithm, &mut actual, |a: &i32, b: &i32| a.cmp(b));
            assert_eq!(actual, expected, "{}", algorithm);
        }
    }

    #[test]
    fn test_sort_shuffled_numbers() {
        let expected = Vec::from_iter(0..500);

        for algorithm in Algorithm::ALL {
            let mut actual = expected.clone();
            actual.shuffle(&mut StdRng::seed_from_u64(3));
            sort_by(algorithm, &mut actual, |a: &i32, b: &i32| a.cmp(b));
            assert_eq!(actual, expected, "{}", algorithm);
        }
    }

    #[rstest]
    #[case(Algorithm::Insertion)]
    #[case(Algorithm::Merge)]
    #[case(Algorithm::Bubble)]
    fn test_sort_stability(#[case] algorithm: Algorithm) {
        let expected = Vec::from_iter((0..20).flat_map(|x| (0..5).map(move |y| (x, y))));

        let mut actual = expected.clone();
        actual.shuffle(&mut StdRng::seed_from_u64(5));
        // sort by the second field first so a stable sort by the first field restores the input
        actual.sort_by(|a: &(i32, i32), b: &(i32, i32)| a.1.cmp(&b.1));

        sort_by(algorithm, &mut actual, |a: &(i32, i32), b: &(i32, i32)| a.0.cmp(&b.0));

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_quick_sort_worst_case_depth() {
        let mut items = Vec::from_iter(0..50);

        let stats = quick_sort_by(&mut items, |a: &i32, b: &i32| a.cmp(b));

        assert_eq!(stats.max_depth, 50);
        assert_eq!(stats.comparisons, 49 * 50 / 2);
    }

    #[test]
    fn test_insertion_sort_best_case() {
        let mut items = Vec::from_iter(0..100);

        let stats = sort_by(Algorithm::Insertion, &mut items, |a: &i32, b: &i32| a.cmp(b));

        assert_eq!(stats.comparisons, 99);
        assert_eq!(stats.max_depth, 0);
    }

    #[test]
    fn test_merge_sort_depth_is_logarithmic() {
        let mut items = Vec::from_iter((0..1024).rev());

        let stats = sort_by(Algorithm::Merge, &mut items, |a: &i32, b: &i32| a.cmp(b));

        assert_eq!(stats.max_depth, 11);
        assert!(is_sorted_by(&items, |a: &i32, b: &i32| a.cmp(b)));
    }

    #[test]
    fn test_selection_sort_descending() {
        let mut items = vec![3, 9, 1, 9, 4];

        selection_sort_by(&mut items, |a: &i32, b: &i32| a.cmp(b).reverse());

        assert_eq!(items, vec![9, 9, 4, 3, 1]);
    }
}
