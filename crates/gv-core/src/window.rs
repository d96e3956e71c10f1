//! Cumulative offset index and one-dimensional windowing
//!
//! Used for both axes: row heights for vertical virtualization, column
//! widths for horizontal virtualization.

use std::ops::RangeInclusive;

/// Extra space materialized around the viewport, in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Margins {
    pub before: f64,
    pub after: f64,
}

impl Margins {
    pub fn new(before: f64, after: f64) -> Self {
        Self { before, after }
    }
}

/// Contiguous inclusive range of materialized entries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowRange {
    pub first: usize,
    pub last: usize,
    /// Pixel offset where `first` begins
    pub leading_offset: f64,
}

impl WindowRange {
    /// Number of entries in the window. A window is only produced for a
    /// non-empty index, so this is at least one.
    pub fn count(&self) -> usize {
        self.last + 1 - self.first
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.first..=self.last).contains(&index)
    }

    pub fn indices(&self) -> RangeInclusive<usize> {
        self.first..=self.last
    }
}

/// Running sum of entry sizes. `offsets[i]` is where entry `i` ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffsetIndex {
    offsets: Vec<f64>,
}

impl OffsetIndex {
    /// Build from entry sizes. Negative or non-finite sizes count as zero.
    pub fn from_sizes<I>(sizes: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut cursor = 0.0;
        let offsets = sizes
            .into_iter()
            .map(|size| {
                if size.is_finite() && size > 0.0 {
                    cursor += size;
                }
                cursor
            })
            .collect();
        Self { offsets }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    /// Total extent; zero when empty
    pub fn total(&self) -> f64 {
        self.offsets.last().copied().unwrap_or(0.0)
    }

    /// Offset where entry `index` begins
    pub fn start_of(&self, index: usize) -> f64 {
        match index {
            0 => 0.0,
            i => self.offsets.get(i - 1).copied().unwrap_or_else(|| self.total()),
        }
    }

    pub fn size_of(&self, index: usize) -> Option<f64> {
        let end = *self.offsets.get(index)?;
        Some(end - self.start_of(index))
    }

    /// First entry whose end offset reaches `offset`
    fn first_reaching(&self, offset: f64) -> Option<usize> {
        let index = self.offsets.partition_point(|&end| end < offset);
        (index < self.offsets.len()).then_some(index)
    }

    /// Entries to materialize for a viewport of `extent` pixels scrolled to
    /// `position`, widened by `margins`. `None` when there are no entries.
    pub fn window(&self, position: f64, extent: f64, margins: Margins) -> Option<WindowRange> {
        if self.offsets.is_empty() {
            return None;
        }
        let begin_offset = (position - margins.before).max(0.0);
        let first = self.first_reaching(begin_offset).unwrap_or(0);

        let end_offset = (position + extent + margins.after).min(self.total());
        let last = self
            .first_reaching(end_offset)
            .unwrap_or(self.offsets.len() - 1)
            .max(first);

        Some(WindowRange {
            first,
            last,
            leading_offset: self.start_of(first),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_offsets_and_total() {
        let index = OffsetIndex::from_sizes([20.0, 30.0, 10.0]);
        assert_eq!(index.offsets(), &[20.0, 50.0, 60.0]);
        assert_eq!(index.total(), 60.0);
        assert_eq!(index.start_of(1), 20.0);
        assert_eq!(index.size_of(1), Some(30.0));
        assert_eq!(OffsetIndex::default().total(), 0.0);
    }

    #[test]
    fn test_window_without_margins() {
        let index = OffsetIndex::from_sizes([20.0, 20.0, 20.0]);
        let range = index.window(25.0, 20.0, Margins::default()).unwrap();
        assert_eq!(range.first, 1);
        assert_eq!(range.last, 2);
        assert_eq!(range.leading_offset, 20.0);
    }

    #[test]
    fn test_window_before_margin_reaches_back() {
        let index = OffsetIndex::from_sizes([20.0, 20.0, 20.0]);
        let range = index.window(25.0, 20.0, Margins::new(10.0, 0.0)).unwrap();
        assert_eq!(range.first, 0);
        assert!(range.contains(1));
    }

    #[test]
    fn test_window_bounded_by_viewport() {
        let index = OffsetIndex::from_sizes(std::iter::repeat(25.0).take(100_000));
        let range = index.window(50_000.0, 500.0, Margins::new(200.0, 300.0)).unwrap();
        assert!(range.count() <= 42);
        assert_eq!(range.first, 1991);
    }

    #[test]
    fn test_single_entry_window() {
        let range = OffsetIndex::from_sizes([30.0]).window(500.0, 100.0, Margins::default()).unwrap();
        assert_eq!(range.count(), 1);
        assert_eq!(range.indices().count(), range.count());
    }

    #[test]
    fn test_empty_window() {
        assert!(OffsetIndex::default().window(0.0, 100.0, Margins::default()).is_none());
    }

    proptest! {
        #[test]
        fn offsets_are_monotonic(sizes in prop::collection::vec(0.0f64..200.0, 0..200)) {
            let index = OffsetIndex::from_sizes(sizes.iter().copied());
            for pair in index.offsets().windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
            let sum: f64 = sizes.iter().sum();
            prop_assert!((index.total() - sum).abs() < 1e-6);
        }

        #[test]
        fn window_covers_viewport(
            sizes in prop::collection::vec(1.0f64..80.0, 1..200),
            fraction in 0.0f64..=1.0,
            extent in 1.0f64..500.0,
        ) {
            let index = OffsetIndex::from_sizes(sizes.iter().copied());
            let top = index.total() * fraction;
            let range = index.window(top, extent, Margins::default()).unwrap();
            for i in 0..index.len() {
                let start = index.start_of(i);
                let end = index.offsets()[i];
                if end > top && start < top + extent {
                    prop_assert!(range.contains(i), "row {} [{}, {}) skipped for top {}", i, start, end, top);
                }
            }
        }
    }
}
