use std::collections::HashSet;

use chrono::NaiveDate;

use crate::record::Record;

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Constraints on which records are visible. A `None` field places no
/// constraint on its dimension.
///
/// `allowed_sources: Some(empty)` is a real constraint that nothing passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub date_range: Option<DateRange>,
    pub allowed_sources: Option<HashSet<String>>,
    pub keyword: Option<String>,
}

impl FilterCriteria {
    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some(DateRange::new(start, end));
        self
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// True when `record` satisfies every constraint.
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(range) = &self.date_range {
            if !range.contains(record.date) {
                return false;
            }
        }

        if let Some(sources) = &self.allowed_sources {
            if !sources.contains(&record.source) {
                return false;
            }
        }

        match self.keyword.as_deref() {
            Some(keyword) if !keyword.is_empty() => {
                let needle = keyword.to_lowercase();
                record.title.to_lowercase().contains(&needle)
                    || record.source.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }

    /// Keeps the records that match, preserving their relative order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a Record>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn sample() -> Vec<Record> {
        vec![
            Record::new(date(1), "u1", "Rust 1.85 released", "Rust Blog"),
            Record::new(date(3), "u2", "東京に来たんやが臭くて草", "ハムスター速報"),
            Record::new(date(5), "u3", "Async closures", "Rust Blog"),
            Record::new(date(5), "u4", "Weekly roundup", "This Week in Rust"),
            Record::new(date(9), "u5", "スタバの店員さん", "ハムスター速報"),
        ]
    }

    fn urls(records: &[&Record]) -> Vec<String> {
        records.iter().map(|r| r.url.clone()).collect()
    }

    mod date_range_tests {
        use super::*;

        #[test]
        fn test_inclusive_bounds() {
            let records = sample();
            let criteria = FilterCriteria::default().with_date_range(date(3), date(5));
            assert_eq!(urls(&criteria.apply(&records)), vec!["u2", "u3", "u4"]);
        }

        #[test]
        fn test_single_day() {
            let records = sample();
            let criteria = FilterCriteria::default().with_date_range(date(9), date(9));
            assert_eq!(urls(&criteria.apply(&records)), vec!["u5"]);
        }

        #[test]
        fn test_inverted_range_matches_nothing() {
            let records = sample();
            let criteria = FilterCriteria::default().with_date_range(date(9), date(1));
            assert!(criteria.apply(&records).is_empty());
        }
    }

    mod source_tests {
        use super::*;

        #[test]
        fn test_absent_means_unfiltered() {
            let records = sample();
            let criteria = FilterCriteria::default();
            assert_eq!(criteria.apply(&records).len(), records.len());
        }

        #[test]
        fn test_present_but_empty_excludes_everything() {
            let records = sample();
            let criteria = FilterCriteria::default().with_sources(Vec::<String>::new());
            assert!(criteria.apply(&records).is_empty());
        }

        #[test]
        fn test_exact_membership() {
            let records = sample();
            let criteria = FilterCriteria::default().with_sources(["Rust Blog"]);
            assert_eq!(urls(&criteria.apply(&records)), vec!["u1", "u3"]);
        }

        #[test]
        fn test_membership_is_not_substring() {
            let records = sample();
            let criteria = FilterCriteria::default().with_sources(["Rust"]);
            assert!(criteria.apply(&records).is_empty());
        }
    }

    mod keyword_tests {
        use super::*;

        #[test]
        fn test_case_insensitive_title_match() {
            let records = sample();
            let criteria = FilterCriteria::default().with_keyword("ASYNC");
            assert_eq!(urls(&criteria.apply(&records)), vec!["u3"]);
        }

        #[test]
        fn test_matches_source_too() {
            let records = sample();
            let criteria = FilterCriteria::default().with_keyword("week in");
            assert_eq!(urls(&criteria.apply(&records)), vec!["u4"]);
        }

        #[test]
        fn test_title_or_source() {
            let records = sample();
            let criteria = FilterCriteria::default().with_keyword("rust");
            assert_eq!(urls(&criteria.apply(&records)), vec!["u1", "u3", "u4"]);
        }

        #[test]
        fn test_unicode_keyword() {
            let records = sample();
            let criteria = FilterCriteria::default().with_keyword("速報");
            assert_eq!(urls(&criteria.apply(&records)), vec!["u2", "u5"]);
        }

        #[test]
        fn test_empty_keyword_is_no_constraint() {
            let records = sample();
            let criteria = FilterCriteria::default().with_keyword("");
            assert_eq!(criteria.apply(&records).len(), records.len());
        }
    }

    mod combination_tests {
        use super::*;

        #[test]
        fn test_dimensions_are_anded() {
            let records = sample();
            let criteria = FilterCriteria::default()
                .with_date_range(date(4), date(9))
                .with_sources(["Rust Blog", "This Week in Rust"])
                .with_keyword("rust");
            assert_eq!(urls(&criteria.apply(&records)), vec!["u3", "u4"]);
        }

        #[test]
        fn test_filtering_is_idempotent() {
            let records = sample();
            let criteria = FilterCriteria::default()
                .with_date_range(date(2), date(9))
                .with_keyword("s");
            let once = criteria.apply(&records);
            let twice = criteria.apply(once.iter().copied());
            assert_eq!(once, twice);
        }

        #[test]
        fn test_result_is_subsequence_of_input() {
            let records = sample();
            let criteria = FilterCriteria::default().with_sources(["ハムスター速報", "Rust Blog"]);
            let filtered = criteria.apply(&records);

            let mut cursor = records.iter();
            for kept in filtered {
                assert!(cursor.any(|r| std::ptr::eq(r, kept)));
            }
        }
    }
}
