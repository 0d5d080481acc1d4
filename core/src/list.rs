//! Headless model of the paginated student list.
//!
//! # Design
//! `ListView` owns only the current page and the page whose rows should stay
//! on screen while a new page loads. Everything fetched lives in the
//! `QueryCache`; `snapshot` reads both and produces what a renderer needs.

use std::time::Duration;

use crate::error::ApiError;
use crate::query::{QueryCache, QueryKey, QueryStatus};
use crate::route::Route;
use crate::types::{Student, StudentId, StudentPage};

/// Rows per page.
pub const PAGE_LIMIT: u32 = 10;

/// A list request is aborted if it has not completed within this window.
pub const LIST_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// `ceil(total_count / limit)`. A zero limit yields zero pages.
pub fn total_pages(total_count: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(u64::from(limit));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub number: u32,
    pub active: bool,
}

impl PageLink {
    pub fn route(&self) -> Route {
        Route::Students { page: self.number }
    }
}

/// Pager controls for one page of a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub previous_enabled: bool,
    pub next_enabled: bool,
    pub links: Vec<PageLink>,
}

impl Pagination {
    /// Previous is disabled exactly on page 1 and Next exactly on the last
    /// page. With zero pages no links are produced.
    pub fn new(page: u32, total_count: u64, limit: u32) -> Self {
        let total_pages = total_pages(total_count, limit);
        let links = (1..=total_pages)
            .map(|number| PageLink {
                number,
                active: number == page,
            })
            .collect();
        Self {
            page,
            total_pages,
            previous_enabled: page != 1,
            next_enabled: page != total_pages,
            links,
        }
    }

    pub fn previous(&self) -> Option<Route> {
        self.previous_enabled.then(|| Route::Students {
            page: self.page.saturating_sub(1).max(1),
        })
    }

    pub fn next(&self) -> Option<Route> {
        self.next_enabled.then(|| Route::Students {
            page: self.page.saturating_add(1),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListPhase {
    /// A request for the current page is outstanding.
    Loading,
    /// The current page's rows are on screen.
    Ready,
    /// The last request for the current page failed.
    Failed(ApiError),
}

/// Everything a renderer needs for one frame of the list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<'a> {
    pub phase: ListPhase,
    /// Rows to show. While loading this may be the previous page's rows.
    pub students: &'a [Student],
    /// True when `students` belong to a page other than the current one.
    pub placeholder: bool,
    pub pagination: Pagination,
}

impl ListSnapshot<'_> {
    /// Loading with nothing to show yet.
    pub fn is_initial_loading(&self) -> bool {
        self.phase == ListPhase::Loading && self.students.is_empty() && self.pagination.total_pages == 0
    }
}

#[derive(Debug, Clone)]
pub struct ListView {
    page: u32,
    limit: u32,
    placeholder_page: Option<u32>,
}

impl Default for ListView {
    fn default() -> Self {
        Self::new(PAGE_LIMIT)
    }
}

impl ListView {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            placeholder_page: None,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::students(self.page)
    }

    /// Switch pages. The old page becomes the placeholder source. Returns
    /// whether the page actually changed.
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if page == self.page {
            return false;
        }
        self.placeholder_page = Some(self.page);
        self.page = page;
        true
    }

    pub fn snapshot<'a>(&self, cache: &'a QueryCache<StudentPage>) -> ListSnapshot<'a> {
        let current = cache.get(&self.key());
        let own_data = current.and_then(|s| s.data.as_ref());
        let placeholder_data = self
            .placeholder_page
            .and_then(|p| cache.data(&QueryKey::students(p)));

        let phase = match current.map(|s| (s.status, s.error.clone())) {
            Some((QueryStatus::Success, _)) => ListPhase::Ready,
            Some((QueryStatus::Error, Some(err))) => ListPhase::Failed(err),
            _ => ListPhase::Loading,
        };

        let (shown, placeholder) = match (own_data, &phase) {
            (Some(data), _) => (Some(data), false),
            (None, ListPhase::Loading) => (placeholder_data, placeholder_data.is_some()),
            (None, _) => (None, false),
        };

        let total_count = shown.map_or(0, |p| p.total_count);
        ListSnapshot {
            phase,
            students: shown.map_or(&[][..], |p| p.students.as_slice()),
            placeholder,
            pagination: Pagination::new(self.page, total_count, self.limit),
        }
    }

    /// Record a successful delete: invalidate the current page so the next
    /// read re-fetches it. Returns the confirmation message.
    pub fn delete_succeeded(&self, cache: &mut QueryCache<StudentPage>, id: &StudentId) -> String {
        cache.invalidate(&self.key());
        format!("Deleted student {id}")
    }
}
