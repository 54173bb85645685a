//! Article comparators.
//!
//! Every comparator is a pure total order usable by any sorting or searching routine.

use std::cmp::Ordering;

use serde;

use crate::record::Article;

/// Compares articles by publication year. Invalid dates have year `0` and sort first.
pub fn by_year(a: &Article, b: &Article) -> Ordering {
    a.year().cmp(&b.year())
}

/// Compares articles by title, byte-wise and case-sensitive.
pub fn by_title(a: &Article, b: &Article) -> Ordering {
    a.title().as_bytes().cmp(b.title().as_bytes())
}

/// Compares articles by full date: year, then month, then day.
/// Articles without a valid date sort before every dated article and are equal to each other.
pub fn by_date(a: &Article, b: &Article) -> Ordering {
    a.parsed_date().cmp(&b.parsed_date())
}

/// Ordering key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SortKey {
    Year,
    Title,
    Date,
}

impl SortKey {
    /// Returns the comparator for the key.
    pub fn comparator(self) -> fn(&Article, &Article) -> Ordering {
        match self {
            SortKey::Year => by_year,
            SortKey::Title => by_title,
            SortKey::Date => by_date,
        }
    }

    pub fn compare(self, a: &Article, b: &Article) -> Ordering {
        (self.comparator())(a, b)
    }

    /// Checks whether the article carries a usable value for the key.
    /// Only full-date ordering has invalid values.
    pub fn is_comparable(self, article: &Article) -> bool {
        match self {
            SortKey::Year | SortKey::Title => true,
            SortKey::Date => article.parsed_date().is_some(),
        }
    }
}

#[cfg(test)]
mod test {
    use std::cmp::Ordering;

    use rstest::*;

    use super::{by_date, by_title, by_year, SortKey};
    use crate::record::{Article, Label};

    fn article(title: &str, date: &str) -> Article {
        Article::new(title, "text", "News", date, Label::True)
    }

    #[rstest]
    #[case("01-01-2016", "31-12-2015", Ordering::Greater)]
    #[case("01-01-2016", "05-07-2016", Ordering::Equal)]
    #[case("NA", "01-01-2016", Ordering::Less)]
    fn test_by_year(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(by_year(&article("a", a), &article("b", b)), expected);
    }

    #[rstest]
    #[case("Zebra", "apple", Ordering::Less)]
    #[case("apple", "apple", Ordering::Equal)]
    #[case("apple", "apples", Ordering::Less)]
    fn test_by_title(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(by_title(&article(a, "NA"), &article(b, "NA")), expected);
    }

    #[rstest]
    #[case("02-03-2016", "01-04-2016", Ordering::Less)]
    #[case("02-03-2016", "01-03-2016", Ordering::Greater)]
    #[case("02-03-2016", "02-03-2016", Ordering::Equal)]
    #[case("01-01-2017", "31-12-2016", Ordering::Greater)]
    #[case("garbage", "01-01-1900", Ordering::Less)]
    #[case("garbage", "NA", Ordering::Equal)]
    fn test_by_date(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(by_date(&article("a", a), &article("b", b)), expected);
    }

    #[test]
    fn test_sort_key_comparability() {
        let undated = article("a", "NA");

        assert!(SortKey::Year.is_comparable(&undated));
        assert!(SortKey::Title.is_comparable(&undated));
        assert!(!SortKey::Date.is_comparable(&undated));
        assert!(SortKey::Date.is_comparable(&article("a", "01-01-2016")));
    }
}
