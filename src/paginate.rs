use std::borrow::Borrow;

use crate::record::Record;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Newest,
    Oldest,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Newest => "newest",
            SortDirection::Oldest => "oldest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub sort_direction: SortDirection,
    pub page_size: usize,
    /// 1-based.
    pub page_index: usize,
}

impl PageRequest {
    pub fn new(sort_direction: SortDirection, page_size: usize, page_index: usize) -> Self {
        Self {
            sort_direction,
            page_size: page_size.max(1),
            page_index,
        }
    }
}

/// One slice of a sorted sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_count: usize,
}

impl<T> Page<'_, T> {
    pub fn has_prev(&self) -> bool {
        self.page_index > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_index < self.total_pages
    }
}

/// Sorts by date. Same-day records keep their incoming order in both
/// directions.
pub fn sort_by_date<R>(records: &mut [R], direction: SortDirection)
where
    R: Borrow<Record>,
{
    match direction {
        SortDirection::Oldest => records.sort_by(|a, b| a.borrow().date.cmp(&b.borrow().date)),
        SortDirection::Newest => records.sort_by(|a, b| b.borrow().date.cmp(&a.borrow().date)),
    }
}

/// `ceil(count / page_size)`, never less than 1.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Clamps a requested page number into `[1, total_pages]`.
pub fn clamp_page_index(page_index: usize, total_pages: usize) -> usize {
    page_index.clamp(1, total_pages.max(1))
}

/// Slices out page `page_index` of an already sorted sequence.
///
/// An index past the end yields an empty page rather than an error.
pub fn paginate<T>(sorted: &[T], page_size: usize, page_index: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let len = sorted.len();
    let start = page_index.saturating_sub(1).saturating_mul(page_size).min(len);
    let end = page_index.saturating_mul(page_size).min(len).max(start);

    Page {
        items: &sorted[start..end],
        page_index,
        page_size,
        total_pages: total_pages(len, page_size),
        total_count: len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(day: u32, title: &str) -> Record {
        Record::new(
            NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            format!("https://example.com/{}", title),
            title,
            "Blog",
        )
    }

    fn titles<R: Borrow<Record>>(records: &[R]) -> Vec<String> {
        records.iter().map(|r| r.borrow().title.clone()).collect()
    }

    mod sort_tests {
        use super::*;

        #[test]
        fn test_newest_first() {
            let mut records = vec![record(3, "c"), record(9, "i"), record(1, "a")];
            sort_by_date(&mut records, SortDirection::Newest);
            assert_eq!(titles(&records), vec!["i", "c", "a"]);
        }

        #[test]
        fn test_oldest_first() {
            let mut records = vec![record(3, "c"), record(9, "i"), record(1, "a")];
            sort_by_date(&mut records, SortDirection::Oldest);
            assert_eq!(titles(&records), vec!["a", "c", "i"]);
        }

        #[test]
        fn test_same_day_order_is_stable_newest_first() {
            let mut records = vec![record(4, "x"), record(5, "A"), record(6, "y"), record(5, "B")];
            sort_by_date(&mut records, SortDirection::Newest);
            assert_eq!(titles(&records), vec!["y", "A", "B", "x"]);
        }

        #[test]
        fn test_same_day_order_is_stable_oldest_first() {
            let mut records = vec![record(4, "x"), record(5, "A"), record(6, "y"), record(5, "B")];
            sort_by_date(&mut records, SortDirection::Oldest);
            assert_eq!(titles(&records), vec!["x", "A", "B", "y"]);
        }

        #[test]
        fn test_sorts_borrowed_records() {
            let owned = vec![record(2, "b"), record(1, "a")];
            let mut borrowed: Vec<&Record> = owned.iter().collect();
            sort_by_date(&mut borrowed, SortDirection::Oldest);
            assert_eq!(titles(&borrowed), vec!["a", "b"]);
        }
    }

    mod total_pages_tests {
        use super::*;

        #[test]
        fn test_exact_multiple() {
            assert_eq!(total_pages(100, 50), 2);
        }

        #[test]
        fn test_partial_last_page() {
            assert_eq!(total_pages(120, 50), 3);
        }

        #[test]
        fn test_empty_is_one_page() {
            assert_eq!(total_pages(0, 50), 1);
        }

        #[test]
        fn test_zero_page_size_treated_as_one() {
            assert_eq!(total_pages(3, 0), 3);
        }
    }

    mod paginate_tests {
        use super::*;

        #[test]
        fn test_last_partial_page() {
            let items: Vec<usize> = (1..=120).collect();
            let page = paginate(&items, 50, 3);
            assert_eq!(page.total_pages, 3);
            assert_eq!(page.items.len(), 20);
            assert_eq!(page.items.first(), Some(&101));
            assert_eq!(page.items.last(), Some(&120));
            assert!(page.has_prev());
            assert!(!page.has_next());
        }

        #[test]
        fn test_page_past_end_is_empty() {
            let items: Vec<usize> = (1..=10).collect();
            let page = paginate(&items, 5, 7);
            assert!(page.items.is_empty());
            assert_eq!(page.total_pages, 2);
        }

        #[test]
        fn test_page_zero_is_empty() {
            let items: Vec<usize> = (1..=10).collect();
            assert!(paginate(&items, 5, 0).items.is_empty());
        }

        #[test]
        fn test_empty_collection() {
            let items: Vec<usize> = Vec::new();
            let page = paginate(&items, 50, 1);
            assert!(page.items.is_empty());
            assert_eq!(page.total_pages, 1);
            assert_eq!(page.total_count, 0);
        }

        #[test]
        fn test_pages_cover_everything_once() {
            let items: Vec<usize> = (0..37).collect();
            let pages = total_pages(items.len(), 8);

            let mut seen = Vec::new();
            for index in 1..=pages {
                seen.extend_from_slice(paginate(&items, 8, index).items);
            }
            assert_eq!(seen, items);
        }

        #[test]
        fn test_clamp_page_index() {
            assert_eq!(clamp_page_index(0, 3), 1);
            assert_eq!(clamp_page_index(2, 3), 2);
            assert_eq!(clamp_page_index(9, 3), 3);
            assert_eq!(clamp_page_index(4, 0), 1);
        }
    }
}
