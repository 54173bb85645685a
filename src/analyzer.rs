//! Dataset analyzer: owns the loaded records and runs measured operations over them.

use std::fmt;
use std::fmt::{Display, Formatter};
use std::io::BufRead;
use std::path::Path;

use log;
use serde;

use crate::aggregate::{
    count_labels_iterative, count_labels_recursive, fake_by_month, fake_by_month_grouped, government_word_table,
    LabelCounts, MonthlyReport,
};
use crate::compare::{by_title, by_year, SortKey};
use crate::frequency::WordCount;
use crate::list::ListStore;
use crate::loader::{load_into, LoadError, LoadSummary};
use crate::metrics::{measure, Measured, Metrics};
use crate::record::Article;
use crate::search::{
    binary_search_by_title, binary_search_by_year, binary_search_list_by_year, linear_search_by_year,
    linear_search_list_by_year,
};
use crate::snapshot::{write_snapshot, SnapshotError, SnapshotReader};
use crate::sort::{merge_sort_by, sort_by, Algorithm, SortStats};
use crate::store::{ArrayStore, RecordStore, DEFAULT_CAPACITY};

#[cfg(feature = "memory-stats")]
use crate::metrics::{measure_footprint, Footprint};

/// Record store backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Backend {
    /// Contiguous array, see [`ArrayStore`].
    Array,
    /// Singly linked list, see [`ListStore`].
    List,
}

impl Display for Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Array => f.write_str("array"),
            Backend::List => f.write_str("linked list"),
        }
    }
}

/// Search strategy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SearchMethod {
    /// Scan of the records in store order.
    Linear,
    /// Binary search over a copy sorted by the searched key.
    Binary,
}

/// Result of a sort.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SortOutcome {
    pub algorithm: Algorithm,
    pub key: SortKey,
    /// Records in sorted order.
    pub articles: Vec<Article>,
    pub stats: SortStats,
    pub metrics: Metrics,
}

/// Result of a search.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchOutcome {
    pub method: SearchMethod,
    /// Positions of the matches in the searched sequence: the store for a linear search,
    /// the sorted copy for a binary search.
    pub positions: Vec<usize>,
    pub articles: Vec<Article>,
    pub metrics: Metrics,
}

/// Analyzer builder. Provides methods for [`Analyzer`] initialization.
#[derive(Debug, Clone)]
pub struct AnalyzerBuilder {
    /// Maximum number of records to load.
    capacity_limit: usize,
    /// Number of words in a frequency report.
    top_n: usize,
    /// Year of the monthly report.
    target_year: u16,
    /// Subject filter of the monthly report.
    political_subject: String,
    /// Subject filter of the word frequency report.
    government_keyword: String,
    /// Skip stop words in word frequency reports.
    stop_words: bool,
    backend: Backend,
}

impl AnalyzerBuilder {
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        AnalyzerBuilder::default()
    }

    /// Sets the maximum number of records to load. Records beyond the limit are ignored.
    pub fn with_capacity_limit(mut self, capacity_limit: usize) -> AnalyzerBuilder {
        self.capacity_limit = capacity_limit;
        return self;
    }

    /// Sets the number of words in a frequency report.
    pub fn with_top_n(mut self, top_n: usize) -> AnalyzerBuilder {
        self.top_n = top_n;
        return self;
    }

    /// Sets the year of the monthly report.
    pub fn with_target_year(mut self, target_year: u16) -> AnalyzerBuilder {
        self.target_year = target_year;
        return self;
    }

    /// Sets the subject filter of the monthly report.
    pub fn with_political_subject(mut self, subject: &str) -> AnalyzerBuilder {
        self.political_subject = subject.to_string();
        return self;
    }

    /// Sets the subject filter of the word frequency report.
    pub fn with_government_keyword(mut self, keyword: &str) -> AnalyzerBuilder {
        self.government_keyword = keyword.to_string();
        return self;
    }

    /// Enables or disables stop word filtering in word frequency reports.
    pub fn with_stop_words(mut self, stop_words: bool) -> AnalyzerBuilder {
        self.stop_words = stop_words;
        return self;
    }

    /// Sets the record store backend.
    pub fn with_backend(mut self, backend: Backend) -> AnalyzerBuilder {
        self.backend = backend;
        return self;
    }

    /// Builds an [`Analyzer`] over a cleaned CSV dataset.
    pub fn load<R: BufRead>(self, reader: R) -> Result<Analyzer, LoadError> {
        let mut records = self.empty_records();
        let measured = measure_records("dataset load", &mut records, |records| match records {
            Records::Array(store) => load_into(store, reader),
            Records::List(store) => load_into(store, reader),
        });
        let summary = measured.value?;

        return Ok(self.finish(records, summary, measured.metrics));
    }

    /// Builds an [`Analyzer`] over already parsed articles.
    pub fn from_articles<I>(self, articles: I) -> Analyzer
    where
        I: IntoIterator<Item = Article>,
    {
        let mut records = self.empty_records();
        let measured = measure_records("record import", &mut records, |records| {
            let mut summary = LoadSummary::default();
            for article in articles {
                let accepted = match records {
                    Records::Array(store) => store.push(article),
                    Records::List(store) => store.push(article),
                };
                if accepted {
                    summary.accepted += 1;
                } else {
                    summary.ignored += 1;
                }
            }
            summary
        });
        let summary = measured.value;
        if summary.ignored > 0 {
            log::warn!("record limit {} reached, {} records ignored", self.capacity_limit, summary.ignored);
        }

        return self.finish(records, summary, measured.metrics);
    }

    /// Builds an [`Analyzer`] over a store snapshot.
    pub fn from_snapshot<P: AsRef<Path>>(self, path: P) -> Result<Analyzer, SnapshotError> {
        let articles: Result<Vec<Article>, SnapshotError> = SnapshotReader::open(path)?.collect();
        return Ok(self.from_articles(articles?));
    }

    fn empty_records(&self) -> Records {
        match self.backend {
            Backend::Array => Records::Array(ArrayStore::new(self.capacity_limit)),
            Backend::List => Records::List(ListStore::new(self.capacity_limit)),
        }
    }

    fn finish(self, records: Records, summary: LoadSummary, load_metrics: Metrics) -> Analyzer {
        log::info!(
            "{} store created ({} records, limit {})",
            self.backend,
            summary.accepted,
            self.capacity_limit
        );

        Analyzer {
            top_n: self.top_n,
            target_year: self.target_year,
            political_subject: self.political_subject,
            government_keyword: self.government_keyword,
            stop_words: self.stop_words,
            records,
            summary,
            load_metrics,
        }
    }
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        AnalyzerBuilder {
            capacity_limit: DEFAULT_CAPACITY,
            top_n: 10,
            target_year: 2016,
            political_subject: "politics".to_string(),
            government_keyword: "government".to_string(),
            stop_words: false,
            backend: Backend::Array,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "memory-stats", derive(deepsize::DeepSizeOf))]
enum Records {
    Array(ArrayStore),
    List(ListStore),
}

/// Dataset analyzer.
///
/// Holds the canonical record store. Sorts and binary searches work on copies, so the store keeps
/// its load order across operations.
#[derive(Debug, Clone)]
pub struct Analyzer {
    top_n: usize,
    target_year: u16,
    political_subject: String,
    government_keyword: String,
    stop_words: bool,

    records: Records,
    summary: LoadSummary,
    load_metrics: Metrics,
}

impl Analyzer {
    pub fn backend(&self) -> Backend {
        match self.records {
            Records::Array(_) => Backend::Array,
            Records::List(_) => Backend::List,
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        match &self.records {
            Records::Array(store) => store.len(),
            Records::List(store) => store.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counters of the load that built the analyzer.
    pub fn load_summary(&self) -> LoadSummary {
        self.summary
    }

    /// Duration of the load that built the analyzer and, with memory stats, the store growth.
    pub fn load_metrics(&self) -> &Metrics {
        &self.load_metrics
    }

    /// Returns the stored records in store order.
    pub fn articles(&self) -> Vec<&Article> {
        match &self.records {
            Records::Array(store) => store.iter().collect(),
            Records::List(store) => store.iter().collect(),
        }
    }

    /// Deep memory footprint of the record store.
    #[cfg(feature = "memory-stats")]
    pub fn footprint(&self) -> usize {
        match &self.records {
            Records::Array(store) => store.footprint(),
            Records::List(store) => store.footprint(),
        }
    }

    /// Writes the stored records to a snapshot file.
    pub fn write_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<usize, SnapshotError> {
        match &self.records {
            Records::Array(store) => write_snapshot(path, store.iter()),
            Records::List(store) => write_snapshot(path, store.iter()),
        }
    }

    /// Sorts a copy of the store. Returns [`None`] if the algorithm is not available for the backend.
    pub fn sort(&self, algorithm: Algorithm, key: SortKey) -> Option<SortOutcome> {
        let operation = format!("{} by {:?} ({})", algorithm, key, self.backend());

        let (articles, stats, metrics) = match &self.records {
            Records::Array(store) => {
                let measured = measure(&operation, || {
                    let mut copy = store.copy();
                    let stats = sort_by(algorithm, copy.as_mut_slice(), key.comparator());
                    (copy, stats)
                });
                let (copy, stats) = measured.value;
                let metrics = account_working_copy(measured.metrics, &copy);
                (copy.into_vec(), stats, metrics)
            }
            Records::List(store) => {
                if !algorithm.supports_list() {
                    log::warn!("{} is not available for linked lists", algorithm);
                    return None;
                }
                let measured = measure(&operation, || {
                    let mut copy = store.copy();
                    let stats = copy.sort(algorithm, key);
                    (copy, stats)
                });
                let (copy, stats) = measured.value;
                let metrics = account_working_copy(measured.metrics, &copy);
                (copy.into_vec(), stats?, metrics)
            }
        };

        Some(SortOutcome {
            algorithm,
            key,
            articles,
            stats,
            metrics,
        })
    }

    /// Finds all articles published in `year`.
    pub fn search_year(&self, year: u16, method: SearchMethod) -> SearchOutcome {
        let operation = format!("{:?} search for {} ({})", method, year, self.backend());

        let measured = match (&self.records, method) {
            (Records::Array(store), SearchMethod::Linear) => measure(&operation, || {
                let positions = linear_search_by_year(store.as_slice(), year);
                let articles: Vec<Article> = positions.iter().filter_map(|&p| store.get(p)).cloned().collect();
                (positions, articles)
            }),
            (Records::Array(store), SearchMethod::Binary) => {
                let mut sorted = store.copy();
                merge_sort_by(sorted.as_mut_slice(), by_year);
                measure(&operation, || {
                    let run = binary_search_by_year(sorted.as_slice(), year);
                    let articles = sorted.as_slice()[run.clone()].to_vec();
                    (run.collect::<Vec<usize>>(), articles)
                })
            }
            (Records::List(store), SearchMethod::Linear) => measure(&operation, || {
                let positions = linear_search_list_by_year(store, year);
                let articles: Vec<Article> = store.iter().filter(|a| a.year() == year).cloned().collect();
                (positions, articles)
            }),
            (Records::List(store), SearchMethod::Binary) => {
                let mut sorted = store.copy();
                sorted.merge_sort_by(by_year);
                measure(&operation, || {
                    let run = binary_search_list_by_year(&sorted, year);
                    let articles: Vec<Article> = sorted.iter().skip(run.start).take(run.len()).cloned().collect();
                    (run.collect::<Vec<usize>>(), articles)
                })
            }
        };

        let (positions, articles): (Vec<usize>, Vec<Article>) = measured.value;
        log::debug!("{} matches for year {}", positions.len(), year);

        SearchOutcome {
            method,
            positions,
            articles,
            metrics: measured.metrics,
        }
    }

    /// Finds articles with exactly this title with a binary search over a title-sorted copy.
    pub fn search_title(&self, title: &str) -> SearchOutcome {
        let mut sorted: Vec<Article> = self.articles().into_iter().cloned().collect();
        merge_sort_by(&mut sorted, by_title);

        let measured = measure(&format!("title search ({})", self.backend()), || {
            let run = binary_search_by_title(&sorted, title);
            let articles = sorted[run.clone()].to_vec();
            (run.collect::<Vec<usize>>(), articles)
        });
        let (positions, articles) = measured.value;

        SearchOutcome {
            method: SearchMethod::Binary,
            positions,
            articles,
            metrics: measured.metrics,
        }
    }

    /// Counts TRUE and FAKE articles. The recursive count needs contiguous storage and returns
    /// [`None`] for the linked list backend.
    pub fn count_labels(&self, recursive: bool) -> Option<Measured<LabelCounts>> {
        match (&self.records, recursive) {
            (Records::Array(store), false) => {
                Some(measure("iterative label count", || count_labels_iterative(store.iter())))
            }
            (Records::Array(store), true) => {
                Some(measure("recursive label count", || count_labels_recursive(store.as_slice())))
            }
            (Records::List(store), false) => {
                Some(measure("iterative label count", || count_labels_iterative(store.iter())))
            }
            (Records::List(_), true) => {
                log::warn!("recursive label count is not available for linked lists");
                None
            }
        }
    }

    /// Builds the monthly fake percentage report of the target year over political articles.
    /// With `grouping` the report is built by sorting the candidates by month with that algorithm.
    pub fn political_report(&self, grouping: Option<Algorithm>) -> Measured<MonthlyReport> {
        let year = self.target_year;
        let subject = self.political_subject.as_str();

        match (&self.records, grouping) {
            (Records::Array(store), None) => measure("monthly report", || fake_by_month(store.iter(), year, subject)),
            (Records::List(store), None) => measure("monthly report", || fake_by_month(store.iter(), year, subject)),
            (Records::Array(store), Some(algorithm)) => measure("grouped monthly report", || {
                fake_by_month_grouped(store.iter(), year, subject, algorithm)
            }),
            (Records::List(store), Some(algorithm)) => measure("grouped monthly report", || {
                fake_by_month_grouped(store.iter(), year, subject, algorithm)
            }),
        }
    }

    /// Returns the most frequent words of fake government articles.
    pub fn government_words(&self) -> Measured<Vec<WordCount>> {
        let keyword = self.government_keyword.as_str();
        let stop_words = self.stop_words;
        let top_n = self.top_n;

        let measured = match &self.records {
            Records::Array(store) => measure("government word count", || {
                government_word_table(store.iter(), keyword, stop_words).top(top_n)
            }),
            Records::List(store) => measure("government word count", || {
                government_word_table(store.iter(), keyword, stop_words).top(top_n)
            }),
        };

        return measured;
    }
}

/// Runs a store-filling operation, accounting the store growth when memory stats are enabled.
#[cfg(feature = "memory-stats")]
fn measure_records<T, F>(operation: &str, records: &mut Records, f: F) -> Measured<T>
where
    F: FnOnce(&mut Records) -> T,
{
    measure_footprint(operation, records, f)
}

#[cfg(not(feature = "memory-stats"))]
fn measure_records<T, F>(operation: &str, records: &mut Records, f: F) -> Measured<T>
where
    F: FnOnce(&mut Records) -> T,
{
    measure(operation, || f(records))
}

/// Attributes the working copy footprint to the operation that made it.
#[cfg(feature = "memory-stats")]
fn account_working_copy<S: Footprint>(metrics: Metrics, working: &S) -> Metrics {
    metrics.with_memory_delta(working.footprint() as i64)
}

#[cfg(not(feature = "memory-stats"))]
fn account_working_copy<S>(metrics: Metrics, _working: &S) -> Metrics {
    metrics
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use rstest::*;

    use super::{AnalyzerBuilder, Backend, SearchMethod};
    use crate::compare::SortKey;
    use crate::record::{Article, Label};
    use crate::sort::test::{multiset, random_articles};
    use crate::sort::{is_sorted_by, Algorithm};

    const DATASET: &str = "title,text,subject,date,label\n\
                           Lies,the government lies and the government hides,Government News,01-03-2016,FAKE\n\
                           Vote,senate vote,politicsNews,15-03-2016,TRUE\n\
                           Hoax,\"government hoax, government cover\",politics,20-03-2016,FAKE\n\
                           Old,old news,politics,01-01-2015,FAKE\n\
                           Broken,record\n";

    #[rstest]
    fn test_load(#[values(Backend::Array, Backend::List)] backend: Backend) {
        let analyzer = AnalyzerBuilder::new()
            .with_backend(backend)
            .load(Cursor::new(DATASET))
            .unwrap();

        assert_eq!(analyzer.backend(), backend);
        assert_eq!(analyzer.len(), 4);
        assert_eq!(analyzer.load_summary().dropped, 1);
        assert_eq!(analyzer.articles()[0].title(), "Lies");
    }

    #[test]
    fn test_load_metrics() {
        let analyzer = AnalyzerBuilder::new().load(Cursor::new(DATASET)).unwrap();
        let metrics = analyzer.load_metrics();

        assert_eq!(metrics.operation(), "dataset load");
        if cfg!(feature = "memory-stats") {
            assert!(matches!(metrics.memory_delta_bytes(), Some(delta) if delta > 0));
        } else {
            assert_eq!(metrics.memory_delta_bytes(), None);
        }
    }

    #[test]
    fn test_capacity_limit() {
        let analyzer = AnalyzerBuilder::new()
            .with_capacity_limit(3)
            .from_articles(random_articles(10, 1));

        assert_eq!(analyzer.len(), 3);
        assert_eq!(analyzer.load_summary().ignored, 7);
    }

    #[rstest]
    fn test_sort_keeps_store_order(
        #[values(Backend::Array, Backend::List)] backend: Backend,
        #[values(Algorithm::Quick, Algorithm::Insertion, Algorithm::Merge)] algorithm: Algorithm,
        #[values(SortKey::Year, SortKey::Title, SortKey::Date)] key: SortKey,
    ) {
        let articles = random_articles(120, 5);
        let analyzer = AnalyzerBuilder::new()
            .with_backend(backend)
            .from_articles(articles.clone());

        let outcome = analyzer.sort(algorithm, key).unwrap();

        assert!(is_sorted_by(&outcome.articles, key.comparator()));
        assert_eq!(multiset(&outcome.articles), multiset(&articles));
        assert!(outcome.stats.comparisons > 0);

        let stored: Vec<Article> = analyzer.articles().into_iter().cloned().collect();
        assert_eq!(stored, articles);
    }

    #[rstest]
    #[case(Algorithm::Selection)]
    #[case(Algorithm::Bubble)]
    fn test_sort_unavailable_for_list(#[case] algorithm: Algorithm) {
        let analyzer = AnalyzerBuilder::new()
            .with_backend(Backend::List)
            .from_articles(random_articles(10, 2));

        assert!(analyzer.sort(algorithm, SortKey::Year).is_none());
    }

    #[rstest]
    fn test_search_year(
        #[values(Backend::Array, Backend::List)] backend: Backend,
        #[values(SearchMethod::Linear, SearchMethod::Binary)] method: SearchMethod,
        #[values(2015, 2016, 2017, 1999)] year: u16,
    ) {
        let articles = random_articles(150, 8);
        let expected = articles.iter().filter(|a| a.year() == year).count();
        let analyzer = AnalyzerBuilder::new()
            .with_backend(backend)
            .from_articles(articles);

        let outcome = analyzer.search_year(year, method);

        assert_eq!(outcome.positions.len(), expected);
        assert_eq!(outcome.articles.len(), expected);
        assert!(outcome.articles.iter().all(|a| a.year() == year));
        assert_eq!(outcome.method, method);
    }

    #[test]
    fn test_search_title() {
        let analyzer = AnalyzerBuilder::new().load(Cursor::new(DATASET)).unwrap();

        assert_eq!(analyzer.search_title("Hoax").articles.len(), 1);
        assert!(analyzer.search_title("hoax").articles.is_empty());
    }

    #[rstest]
    fn test_count_labels(#[values(Backend::Array, Backend::List)] backend: Backend) {
        let analyzer = AnalyzerBuilder::new()
            .with_backend(backend)
            .load(Cursor::new(DATASET))
            .unwrap();

        let counts = analyzer.count_labels(false).unwrap().value;

        assert_eq!((counts.total, counts.fake, counts.real), (4, 3, 1));
        match backend {
            Backend::Array => assert_eq!(analyzer.count_labels(true).unwrap().value, counts),
            Backend::List => assert!(analyzer.count_labels(true).is_none()),
        }
    }

    #[rstest]
    fn test_political_report(
        #[values(Backend::Array, Backend::List)] backend: Backend,
        #[values(None, Some(Algorithm::Merge), Some(Algorithm::Selection))] grouping: Option<Algorithm>,
    ) {
        let analyzer = AnalyzerBuilder::new()
            .with_backend(backend)
            .load(Cursor::new(DATASET))
            .unwrap();

        let report = analyzer.political_report(grouping).value;

        assert_eq!(report.year, 2016);
        assert_eq!(report.bucket(3).map(|b| (b.total, b.fake)), Some((2, 1)));
        assert_eq!(report.bucket(3).and_then(|b| b.percentage()), Some(50.0));
        assert_eq!(report.bucket(1).and_then(|b| b.percentage()), None);
    }

    #[test]
    fn test_political_report_target_year() {
        let analyzer = AnalyzerBuilder::new()
            .with_target_year(2015)
            .load(Cursor::new(DATASET))
            .unwrap();

        let report = analyzer.political_report(None).value;

        assert_eq!(report.bucket(1).and_then(|b| b.percentage()), Some(100.0));
        assert_eq!(report.total(), 1);
    }

    #[rstest]
    fn test_government_words(#[values(Backend::Array, Backend::List)] backend: Backend) {
        let analyzer = AnalyzerBuilder::new()
            .with_backend(backend)
            .with_top_n(2)
            .with_stop_words(true)
            .load(Cursor::new(DATASET))
            .unwrap();

        let top = analyzer.government_words().value;

        assert_eq!(top.len(), 2);
        assert_eq!((top[0].word.as_str(), top[0].count), ("government", 2));
        assert_eq!((top[1].word.as_str(), top[1].count), ("lies", 2));
    }

    #[test]
    fn test_custom_filters() {
        let articles = vec![
            Article::new("a", "b", "Crime", "01-02-2016", Label::Fake),
            Article::new("Crime wave", "crime", "crime", "NA", Label::Fake),
        ];
        let analyzer = AnalyzerBuilder::new()
            .with_political_subject("crime")
            .with_government_keyword("crime")
            .from_articles(articles);

        assert_eq!(analyzer.political_report(None).value.total(), 1);
        assert_eq!(analyzer.government_words().value[0].word, "crime");
    }

    #[test]
    fn test_empty_dataset() {
        let analyzer = AnalyzerBuilder::new().from_articles(Vec::new());

        assert!(analyzer.is_empty());
        assert!(analyzer.sort(Algorithm::Quick, SortKey::Year).unwrap().articles.is_empty());
        assert!(analyzer.search_year(2016, SearchMethod::Binary).positions.is_empty());
        assert_eq!(analyzer.political_report(None).value.overall_percentage(), None);
        assert!(analyzer.government_words().value.is_empty());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analyzer.snapshot");
        let analyzer = AnalyzerBuilder::new().load(Cursor::new(DATASET)).unwrap();

        assert_eq!(analyzer.write_snapshot(&path).unwrap(), 4);
        let restored = AnalyzerBuilder::new()
            .with_backend(Backend::List)
            .from_snapshot(&path)
            .unwrap();

        assert_eq!(restored.articles(), analyzer.articles());
    }
}
