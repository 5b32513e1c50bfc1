pub const PAGE_SIZE: u32 = 10;

/// Rows to skip and take for one result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u32,
}

impl PageWindow {
    /// Window of the 1-indexed `page`; `page` 0 is treated as 1.
    pub fn for_page(page: u32) -> Self {
        Self::sized(page, PAGE_SIZE)
    }

    pub fn sized(page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        PageWindow {
            offset: u64::from(page - 1) * u64::from(page_size),
            limit: page_size,
        }
    }

    /// Every row from the first one on.
    pub fn unbounded() -> Self {
        PageWindow {
            offset: 0,
            limit: u32::MAX,
        }
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.offset)
            .unwrap_or(usize::MAX)
            .min(items.len());
        let end = start.saturating_add(self.limit as usize).min(items.len());
        &items[start..end]
    }
}

/// Missing, zero and negative page numbers become page 1.
pub fn clamp_page(page: Option<i64>) -> u32 {
    match page {
        Some(page) if page > 1 => u32::try_from(page).unwrap_or(u32::MAX),
        _ => 1,
    }
}

pub fn total_pages(total_results: u64) -> u64 {
    pages_for(total_results, PAGE_SIZE)
}

pub fn pages_for(total_results: u64, page_size: u32) -> u64 {
    total_results.div_ceil(u64::from(page_size.max(1)))
}
