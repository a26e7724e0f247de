//! Pagination parameters for list projections.

use serde::{Deserialize, Serialize};

/// Page selector shared across list endpoints.
///
/// - `page_size`: 1–200, default 50
/// - `page`: ≥ 1, default 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size", rename = "page-size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    50
}

pub const MAX_PAGE_SIZE: u32 = 200;

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PageRequest {
    /// Clamp `page_size` to 1–200 and `page` to ≥ 1.
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip for this page (after clamping).
    pub fn offset(self) -> u64 {
        let PageRequest { page, page_size } = self.clamped();
        u64::from(page - 1) * u64::from(page_size)
    }
}
