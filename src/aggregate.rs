//! Aggregate reports: label totals, monthly fake percentages and government word counts.

use std::ops::Add;

use log;
use serde;

use crate::frequency::FrequencyTable;
use crate::record::Article;
use crate::sort::{sort_by, Algorithm};

/// Number of TRUE and FAKE articles.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct LabelCounts {
    pub total: u64,
    pub fake: u64,
    pub real: u64,
}

impl LabelCounts {
    fn of(article: &Article) -> Self {
        if article.is_fake() {
            LabelCounts { total: 1, fake: 1, real: 0 }
        } else {
            LabelCounts { total: 1, fake: 0, real: 1 }
        }
    }
}

impl Add for LabelCounts {
    type Output = LabelCounts;

    fn add(self, other: LabelCounts) -> LabelCounts {
        LabelCounts {
            total: self.total + other.total,
            fake: self.fake + other.fake,
            real: self.real + other.real,
        }
    }
}

/// Counts labels in a single pass.
pub fn count_labels_iterative<'a, I>(articles: I) -> LabelCounts
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut counts = LabelCounts::default();
    for article in articles {
        counts = counts + LabelCounts::of(article);
    }
    return counts;
}

/// Counts labels recursively by halving the slice, so the recursion depth is logarithmic.
pub fn count_labels_recursive(articles: &[Article]) -> LabelCounts {
    match articles.len() {
        0 => LabelCounts::default(),
        1 => LabelCounts::of(&articles[0]),
        len => {
            let (left, right) = articles.split_at(len / 2);
            count_labels_recursive(left) + count_labels_recursive(right)
        }
    }
}

/// Articles of one month.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct MonthBucket {
    pub month: u8,
    pub total: u64,
    pub fake: u64,
}

impl MonthBucket {
    /// Share of fake articles in percent, [`None`] if the bucket is empty.
    pub fn percentage(&self) -> Option<f64> {
        percentage(self.fake, self.total)
    }
}

/// Fake article share per month of one year.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MonthlyReport {
    pub year: u16,
    pub buckets: [MonthBucket; 12],
}

impl MonthlyReport {
    fn empty(year: u16) -> Self {
        let mut buckets = [MonthBucket::default(); 12];
        for (i, bucket) in buckets.iter_mut().enumerate() {
            bucket.month = i as u8 + 1;
        }
        MonthlyReport { year, buckets }
    }

    /// Returns the bucket for a month in 1..=12.
    pub fn bucket(&self, month: u8) -> Option<&MonthBucket> {
        if (1..=12).contains(&month) {
            self.buckets.get(month as usize - 1)
        } else {
            None
        }
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|b| b.total).sum()
    }

    pub fn fake(&self) -> u64 {
        self.buckets.iter().map(|b| b.fake).sum()
    }

    /// Share of fake articles over the whole year, [`None`] if nothing qualified.
    pub fn overall_percentage(&self) -> Option<f64> {
        percentage(self.fake(), self.total())
    }

    fn record(&mut self, article: &Article) {
        let index = (article.month() as usize).checked_sub(1);
        if let Some(bucket) = index.and_then(|i| self.buckets.get_mut(i)) {
            bucket.total += 1;
            if article.is_fake() {
                bucket.fake += 1;
            }
        }
    }
}

fn percentage(part: u64, whole: u64) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 / whole as f64 * 100.0)
    }
}

/// Checks whether an article belongs to the monthly report: published in `year` with a valid date
/// and a subject containing `subject` (case-insensitive).
pub fn is_monthly_candidate(article: &Article, year: u16, subject: &str) -> bool {
    article.parsed_date().is_some() && article.year() == year && article.subject_contains(subject)
}

/// Builds the monthly report with one pass over the articles.
pub fn fake_by_month<'a, I>(articles: I, year: u16, subject: &str) -> MonthlyReport
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut report = MonthlyReport::empty(year);
    for article in articles {
        if is_monthly_candidate(article, year, subject) {
            report.record(article);
        }
    }

    log::debug!("monthly report for {}: {} of {} articles fake", year, report.fake(), report.total());
    return report;
}

/// Builds the monthly report by filtering, sorting the candidates by month with `algorithm`
/// and counting each run of equal months.
pub fn fake_by_month_grouped<'a, I>(articles: I, year: u16, subject: &str, algorithm: Algorithm) -> MonthlyReport
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut candidates: Vec<&Article> = articles
        .into_iter()
        .filter(|article| is_monthly_candidate(article, year, subject))
        .collect();
    sort_by(algorithm, &mut candidates, |a, b| a.month().cmp(&b.month()));

    let mut report = MonthlyReport::empty(year);
    let mut start = 0;
    while start < candidates.len() {
        let month = candidates[start].month();
        let mut end = start;
        while end < candidates.len() && candidates[end].month() == month {
            report.record(candidates[end]);
            end += 1;
        }
        start = end;
    }

    return report;
}

/// Checks whether an article is fake and its subject contains `keyword` (case-insensitive).
pub fn is_fake_government(article: &Article, keyword: &str) -> bool {
    article.is_fake() && article.subject_contains(keyword)
}

/// Counts title and body words of every fake article whose subject contains `keyword`.
pub fn government_word_table<'a, I>(articles: I, keyword: &str, skip_stop_words: bool) -> FrequencyTable
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut table = if skip_stop_words {
        FrequencyTable::with_stop_words()
    } else {
        FrequencyTable::new()
    };

    let mut matched = 0;
    for article in articles {
        if is_fake_government(article, keyword) {
            table.add_text(article.title());
            table.add_text(article.text());
            matched += 1;
        }
    }

    log::debug!("{} articles counted, {} distinct words", matched, table.len());
    return table;
}

#[cfg(test)]
mod test {
    use rstest::*;

    use super::{
        count_labels_iterative, count_labels_recursive, fake_by_month, fake_by_month_grouped, government_word_table,
        is_fake_government, LabelCounts,
    };
    use crate::list::ListStore;
    use crate::record::{Article, Label};
    use crate::sort::test::random_articles;
    use crate::sort::Algorithm;

    fn political(date: &str, label: Label) -> Article {
        Article::new("title", "text", "politics", date, label)
    }

    #[test]
    fn test_count_labels() {
        let articles = random_articles(301, 17);
        let list = ListStore::from_articles(1000, articles.clone());

        let iterative = count_labels_iterative(&articles);

        assert_eq!(iterative.total, 301);
        assert_eq!(iterative.fake + iterative.real, 301);
        assert_eq!(count_labels_recursive(&articles), iterative);
        assert_eq!(count_labels_iterative(list.iter()), iterative);
    }

    #[test]
    fn test_count_labels_empty() {
        assert_eq!(count_labels_iterative(&Vec::new()), LabelCounts::default());
        assert_eq!(count_labels_recursive(&[]), LabelCounts::default());
    }

    #[test]
    fn test_fake_month_single_bucket() {
        let mut articles = vec![
            political("01-03-2016", Label::Fake),
            political("15-03-2016", Label::Fake),
            political("31-03-2016", Label::Fake),
        ];
        // undated political articles never reach a bucket
        articles.extend((0..7).map(|_| political("NA", Label::True)));

        let report = fake_by_month(&articles, 2016, "politics");

        assert_eq!(report.bucket(3).and_then(|b| b.percentage()), Some(100.0));
        for month in (1..=12).filter(|m| *m != 3) {
            assert_eq!(report.bucket(month).and_then(|b| b.percentage()), None);
        }
        assert_eq!(report.overall_percentage(), Some(100.0));
    }

    #[test]
    fn test_fake_month_mixed() {
        let articles = vec![
            political("01-01-2016", Label::Fake),
            political("02-01-2016", Label::True),
            political("03-01-2016", Label::True),
            political("04-01-2016", Label::True),
            political("05-02-2016", Label::True),
            political("06-02-2017", Label::Fake),
            Article::new("t", "x", "worldnews", "07-02-2016", Label::Fake),
            Article::new("t", "x", "politicsNews", "08-12-2016", Label::Fake),
        ];

        let report = fake_by_month(&articles, 2016, "politics");

        assert_eq!(report.bucket(1).and_then(|b| b.percentage()), Some(25.0));
        assert_eq!(report.bucket(2).and_then(|b| b.percentage()), Some(0.0));
        assert_eq!(report.bucket(12).and_then(|b| b.percentage()), Some(100.0));
        assert_eq!(report.total(), 6);
        assert_eq!(report.fake(), 2);
        assert_eq!(report.overall_percentage(), Some(2.0 / 6.0 * 100.0));
        assert_eq!(report.bucket(0), None);
        assert_eq!(report.bucket(13), None);
    }

    #[rstest]
    fn test_fake_month_grouped_agrees(
        #[values(Algorithm::Quick, Algorithm::Insertion, Algorithm::Merge, Algorithm::Bubble)] algorithm: Algorithm,
    ) {
        let articles = random_articles(400, 19);

        let linear = fake_by_month(&articles, 2016, "POLITICS");
        let grouped = fake_by_month_grouped(&articles, 2016, "POLITICS", algorithm);

        assert_eq!(grouped, linear);
        assert!(linear.total() > 0);
    }

    #[test]
    fn test_fake_month_empty() {
        let report = fake_by_month(&Vec::new(), 2016, "politics");

        assert!(report.buckets.iter().all(|b| b.percentage().is_none()));
        assert_eq!(report.overall_percentage(), None);
    }

    #[test]
    fn test_government_words() {
        let articles = vec![
            Article::new("Government lies", "the government hides the truth", "Government News", "NA", Label::Fake),
            Article::new("Truth", "government truth exposed", "government", "NA", Label::Fake),
            Article::new("Government", "government", "Government News", "NA", Label::True),
            Article::new("Government", "government", "politics", "NA", Label::Fake),
        ];

        assert!(is_fake_government(&articles[0], "government"));
        assert!(!is_fake_government(&articles[2], "government"));
        assert!(!is_fake_government(&articles[3], "government"));

        let table = government_word_table(&articles, "government", false);
        assert_eq!(table.get("government"), Some(3));
        assert_eq!(table.get("truth"), Some(3));
        assert_eq!(table.get("the"), Some(2));

        let table = government_word_table(&articles, "government", true);
        assert_eq!(table.get("the"), None);
        assert_eq!(table.top(1)[0].word, "government");
    }

    #[test]
    fn test_government_words_empty() {
        assert!(government_word_table(&Vec::new(), "government", false).is_empty());
    }
}
