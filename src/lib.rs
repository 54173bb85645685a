//! `news-analysis` is a toolkit of classic sorting, searching and counting algorithms applied to a labeled
//! news article dataset.
//!
//! Each article carries a title, a body, a subject, a publication date and a `TRUE`/`FAKE` label. The dataset
//! is loaded into one of two record stores, a contiguous array or a singly linked list, and the same questions
//! are answered with different algorithms on both so their cost can be compared.
//!
//! # Overview
//!
//! `news-analysis` supports the following features:
//!
//! * **Two storage backends:**
//!   an array store and an index-linked list store, both bounded by a record limit.
//! * **Sorting:**
//!   quick, insertion, selection, merge and bubble sort by year, title or full date. Every sort reports the
//!   number of comparisons and the recursion depth it reached.
//! * **Searching:**
//!   linear and binary search by year; binary search returns the whole run of matching records.
//! * **Aggregation:**
//!   label totals, monthly fake percentages of political news and word frequencies of fake government news.
//! * **Metrics:**
//!   every analyzer operation is timed; the memory footprint is tracked with the `memory-stats` feature.
//! * **Ingestion:**
//!   cleaning and merging of raw CSV sources, tolerant CSV loading and MessagePack store snapshots.
//!
//! # Example
//!
//! ```no_run
//! use std::fs;
//! use std::io;
//!
//! use news_analysis::{AnalyzerBuilder, Algorithm, Backend, SortKey};
//!
//! fn main() {
//!     let input_reader = io::BufReader::new(fs::File::open("DataCleaned.csv").unwrap());
//!
//!     let analyzer = AnalyzerBuilder::new()
//!         .with_backend(Backend::List)
//!         .with_capacity_limit(50_000)
//!         .load(input_reader)
//!         .unwrap();
//!
//!     let sorted = analyzer.sort(Algorithm::Merge, SortKey::Year).unwrap();
//!     println!("{} comparisons in {}us", sorted.stats.comparisons, sorted.metrics.duration_micros());
//!
//!     let report = analyzer.political_report(None).value;
//!     for bucket in report.buckets.iter() {
//!         match bucket.percentage() {
//!             Some(percentage) => println!("month {}: {:.2}%", bucket.month, percentage),
//!             None => println!("month {}: no data", bucket.month),
//!         }
//!     }
//! }
//! ```

pub mod aggregate;
pub mod analyzer;
pub mod compare;
pub mod frequency;
pub mod list;
pub mod loader;
pub mod metrics;
pub mod record;
pub mod search;
pub mod snapshot;
pub mod sort;
pub mod store;

pub use analyzer::{Analyzer, AnalyzerBuilder, Backend, SearchMethod, SearchOutcome, SortOutcome};
pub use compare::SortKey;
pub use list::ListStore;
pub use loader::{LoadError, LoadSummary};
pub use metrics::{Measured, Metrics};
pub use record::{Article, Date, Label};
pub use snapshot::{SnapshotError, SnapshotReader};
pub use sort::{Algorithm, SortStats};
pub use store::{ArrayStore, RecordStore};
