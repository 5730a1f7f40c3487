//! Fixed-size flash segment.
//!
//! A segment is 256 KiB of pages filled append-only: a current-page index
//! advances when the current page cannot take the next object, and never
//! moves backwards. Pages before the index are closed (not necessarily full
//! in bytes), pages after it are untouched. The segment as a whole is
//! reclaimed in one shot by [`Segment::clear`], which is what models the
//! erase-block behavior of flash.

use super::page::Page;
use crate::entry::FifoEntry;

pub(crate) struct Segment {
    seg_id: u32,
    page_idx: usize,
    pages: Vec<Page>,
}

impl Segment {
    /// Segment capacity in bytes.
    pub(crate) const SIZE: u32 = 256 * 1024;

    /// Pages per segment.
    pub(crate) const PAGES_PER_SEGMENT: u32 = Self::SIZE / Page::SIZE;

    /// Creates an empty segment whose pages carry globally unique ids.
    pub(crate) fn new(seg_id: u32) -> Self {
        let start = seg_id * Self::PAGES_PER_SEGMENT;
        let end = (seg_id + 1) * Self::PAGES_PER_SEGMENT;
        Self {
            seg_id,
            page_idx: 0,
            pages: (start..end).map(|page_id| Page::new(seg_id, page_id)).collect(),
        }
    }

    /// True iff the segment cannot accept an object of `size` bytes: the
    /// page index ran past the last page, or it sits on the last page and
    /// that page is full for `size`.
    pub(crate) fn is_full(&self, size: u32) -> bool {
        self.page_idx == self.pages.len()
            || (self.page_idx == self.pages.len() - 1 && self.pages[self.page_idx].is_full(size))
    }

    /// Appends an object, advancing the page index if the current page is
    /// full, and returns the global id of the page written.
    ///
    /// The caller must have checked `is_full` first.
    pub(crate) fn insert(&mut self, key: &str, size: u32) -> u32 {
        assert!(
            self.page_idx < self.pages.len(),
            "segment {} write index ran past its last page",
            self.seg_id
        );
        if self.pages[self.page_idx].is_full(size) {
            self.page_idx += 1;
        }
        self.pages[self.page_idx].insert(key, size)
    }

    /// Looks up a key in the page addressed by a global page id.
    pub(crate) fn lookup(&mut self, key: &str, page_id: u32) -> Option<FifoEntry> {
        let target = (page_id % Self::PAGES_PER_SEGMENT) as usize;
        self.pages[target].lookup(key)
    }

    /// Soft-deletes a key in the page addressed by a global page id.
    pub(crate) fn remove(&mut self, key: &str, page_id: u32) {
        let target = (page_id % Self::PAGES_PER_SEGMENT) as usize;
        assert!(target < self.pages.len());
        self.pages[target].remove(key);
    }

    /// Collects the live entries of every page, resets all pages and the
    /// page index. An untouched segment yields an empty list.
    pub(crate) fn clear(&mut self) -> Vec<FifoEntry> {
        let num_victims: usize = self.pages.iter().map(Page::len).sum();
        if num_victims == 0 {
            debug_assert_eq!(self.page_idx, 0);
            return Vec::new();
        }

        let mut victims = Vec::with_capacity(num_victims);
        for page in &mut self.pages {
            page.clear(&mut victims);
        }

        self.page_idx = 0;
        victims
    }
}
