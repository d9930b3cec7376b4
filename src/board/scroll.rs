//! Auto-scroll cursor for one overview quadrant.

/// Tracks which card a quadrant is scrolled to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuadrantScroller {
    index: usize,
}

impl QuadrantScroller {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.index
    }

    /// Advance to the next card worth scrolling to.
    ///
    /// Starting after the current card and wrapping around, picks the first
    /// card `is_visible` reports as hidden; when every card is visible, steps
    /// to the next one. Returns `None` and stays put when the quadrant is
    /// empty.
    pub fn advance(&mut self, total: usize, is_visible: impl Fn(usize) -> bool) -> Option<usize> {
        if total == 0 {
            return None;
        }
        let next = (0..total)
            .map(|offset| (self.index + 1 + offset) % total)
            .find(|&candidate| !is_visible(candidate))
            .unwrap_or((self.index + 1) % total);
        self.index = next;
        Some(next)
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

#[cfg(test)]
#[path = "scroll_test.rs"]
mod scroll_test;
