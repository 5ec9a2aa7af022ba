//! Offset pagination.

/// Row offset of the first item on a 1-based `page`.
///
/// `None` when the offset does not fit a signed 64-bit SQL `OFFSET`.
pub fn page_offset(page: u64, limit: u64) -> Option<u64> {
    page.checked_sub(1)?
        .checked_mul(limit)
        .filter(|offset| i64::try_from(*offset).is_ok())
}

/// One page of a larger result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Count of all matching records, not just this page
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        Self {
            items,
            total,
            page,
            limit,
        }
    }

    /// `ceil(total / limit)`
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}
