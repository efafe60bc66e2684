//! `Page` value and page-key arithmetic.

/// One page of items produced by a network fetch.
///
/// Pages are transient: only their items become cached rows and only their
/// derived next-page number is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items in upstream order.
    pub items: Vec<T>,
    /// 1-based page number reported by the source.
    pub page_number: u32,
    /// Total number of pages reported by the source.
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Creates a page.
    #[must_use]
    pub const fn new(items: Vec<T>, page_number: u32, total_pages: u32) -> Self {
        Self {
            items,
            page_number,
            total_pages,
        }
    }

    /// Returns `true` if the page carries no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Key of the page after this one, `None` once `total_pages` is reached.
    #[must_use]
    pub const fn next_key(&self) -> Option<u32> {
        next_key(self.page_number, self.total_pages)
    }

    /// Converts every item, keeping the page boundaries.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            total_pages: self.total_pages,
        }
    }

    /// Drops items rejected by `keep`. Page numbers are left untouched so
    /// pagination still follows the upstream boundaries.
    #[must_use]
    pub fn retain(mut self, keep: impl FnMut(&T) -> bool) -> Self {
        self.items.retain(keep);
        self
    }
}

/// Previous key for a requested page. The first page has none.
#[must_use]
pub const fn prev_key(requested: u32) -> Option<u32> {
    if requested <= 1 {
        None
    } else {
        requested.checked_sub(1)
    }
}

/// Next key after `current`, or `None` when `current + 1` exceeds `total_pages`.
#[must_use]
pub const fn next_key(current: u32, total_pages: u32) -> Option<u32> {
    match current.checked_add(1) {
        Some(next) if next <= total_pages => Some(next),
        _ => None,
    }
}
