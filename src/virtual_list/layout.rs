//! Index and offset math for virtualized lists
//!
//! Pure functions over item heights; no rendering concerns live here.

use std::fmt;
use std::ops::RangeInclusive;

/// Height of each row: one constant, or a per-index function
pub enum ItemHeight {
    Fixed(f64),
    Variable(Box<dyn Fn(usize) -> f64>),
}

impl ItemHeight {
    pub fn variable(f: impl Fn(usize) -> f64 + 'static) -> Self {
        ItemHeight::Variable(Box::new(f))
    }
}

impl fmt::Debug for ItemHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemHeight::Fixed(h) => f.debug_tuple("Fixed").field(h).finish(),
            ItemHeight::Variable(_) => f.write_str("Variable(..)"),
        }
    }
}

/// Fixed heights must be positive and finite; anything else becomes 1.0
fn sanitize_fixed(height: f64) -> f64 {
    if height.is_finite() && height > 0.0 {
        height
    } else {
        1.0
    }
}

/// Variable heights may be zero, but never negative or NaN
fn sanitize_variable(height: f64) -> f64 {
    if height.is_finite() && height > 0.0 {
        height
    } else {
        0.0
    }
}

/// Precomputed geometry for one item set
#[derive(Debug, Clone, PartialEq)]
pub enum ListLayout {
    Fixed { item_count: usize, item_height: f64 },
    /// `offsets[i]` is the top of item `i`; `offsets[item_count]` is the total height
    Variable { offsets: Vec<f64> },
}

impl ListLayout {
    pub fn new(item_height: &ItemHeight, item_count: usize) -> Self {
        match item_height {
            ItemHeight::Fixed(h) => ListLayout::Fixed {
                item_count,
                item_height: sanitize_fixed(*h),
            },
            ItemHeight::Variable(f) => {
                let mut offsets = Vec::with_capacity(item_count + 1);
                let mut top = 0.0;
                offsets.push(top);
                for index in 0..item_count {
                    top += sanitize_variable(f(index));
                    offsets.push(top);
                }
                ListLayout::Variable { offsets }
            }
        }
    }

    pub fn item_count(&self) -> usize {
        match self {
            ListLayout::Fixed { item_count, .. } => *item_count,
            ListLayout::Variable { offsets } => offsets.len() - 1,
        }
    }

    /// Top offset of `index`
    pub fn offset(&self, index: usize) -> f64 {
        match self {
            ListLayout::Fixed { item_height, .. } => index as f64 * item_height,
            ListLayout::Variable { offsets } => offsets[index.min(offsets.len() - 1)],
        }
    }

    /// Logical height of the whole list
    pub fn total_height(&self) -> f64 {
        match self {
            ListLayout::Fixed {
                item_count,
                item_height,
            } => *item_count as f64 * item_height,
            ListLayout::Variable { offsets } => offsets[offsets.len() - 1],
        }
    }

    /// Indices to materialize for the given scroll position, including `buffer`
    /// extra rows on each side; `None` when nothing is in range
    pub fn window(&self, scroll_top: f64, viewport_height: f64, buffer: usize) -> Option<RangeInclusive<usize>> {
        let count = self.item_count();
        if count == 0 {
            return None;
        }

        let scroll_top = if scroll_top.is_finite() { scroll_top.max(0.0) } else { 0.0 };
        let viewport_height = if viewport_height.is_finite() {
            viewport_height.max(0.0)
        } else {
            0.0
        };
        let bottom_edge = scroll_top + viewport_height;

        let (first, last) = match self {
            ListLayout::Fixed { item_height, .. } => (
                (scroll_top / item_height).floor() as usize,
                (bottom_edge / item_height).ceil() as usize,
            ),
            ListLayout::Variable { offsets } => {
                let bottoms = &offsets[1..];
                let tops = &offsets[..count];
                let first = bottoms.partition_point(|&bottom| bottom <= scroll_top);
                let last = tops
                    .partition_point(|&top| top <= bottom_edge)
                    .saturating_sub(1);
                (first, last)
            }
        };

        let start = first.saturating_sub(buffer);
        let end = last.saturating_add(buffer).min(count - 1);

        (start <= end).then_some(start..=end)
    }
}
