//! List/pagination view-model for the user-files table.
//!
//! Holds the page cursor, sort order and checkbox selection, and turns server
//! pages into render-ready snapshots. No markup lives here; a front-end walks
//! [`PageView`] and [`Pagination`] and draws whatever it wants.

use crate::error::RequestError;
use crate::models::{PageResult, SortOrder, UserRow};
use crate::services::client::PanelApi;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Checked user ids. Survives page navigation; only dropping the model
/// clears it.
#[derive(Debug, Default, Clone)]
pub struct Selection {
    ids: HashSet<i64>,
}

impl Selection {
    /// Flip membership for one id, returning the new membership.
    pub fn toggle(&mut self, user_id: i64) -> bool {
        if self.ids.remove(&user_id) {
            false
        } else {
            self.ids.insert(user_id);
            true
        }
    }

    pub fn set(&mut self, user_id: i64, selected: bool) {
        if selected {
            self.ids.insert(user_id);
        } else {
            self.ids.remove(&user_id);
        }
    }

    pub fn contains(&self, user_id: i64) -> bool {
        self.ids.contains(&user_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in ascending order, so bulk operations run deterministically.
    pub fn ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// One entry of the pagination strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page { number: u32, active: bool },
    Ellipsis,
}

/// Render-ready pagination strip: previous/next enablement plus at most five
/// numbered links in a window centered on the current page, with first/last
/// shortcuts and ellipsis markers when the window misses an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub items: Vec<PageItem>,
}

const MAX_PAGE_LINKS: u32 = 5;

impl Pagination {
    pub fn build(current: u32, total_pages: u32) -> Self {
        let mut items = Vec::new();
        if total_pages == 0 {
            return Self {
                prev_enabled: false,
                next_enabled: false,
                items,
            };
        }

        let mut start = current.saturating_sub(MAX_PAGE_LINKS / 2).max(1);
        let end = total_pages.min(start.saturating_add(MAX_PAGE_LINKS - 1));
        // Re-anchor when the window collides with the high edge (or when
        // `current` points past the last page entirely).
        if start > end || end - start + 1 < MAX_PAGE_LINKS {
            start = end.saturating_sub(MAX_PAGE_LINKS - 1).max(1);
        }

        if start > 1 {
            items.push(PageItem::Page {
                number: 1,
                active: false,
            });
            if start > 2 {
                items.push(PageItem::Ellipsis);
            }
        }

        for number in start..=end {
            items.push(PageItem::Page {
                number,
                active: number == current,
            });
        }

        if end < total_pages {
            if end < total_pages - 1 {
                items.push(PageItem::Ellipsis);
            }
            items.push(PageItem::Page {
                number: total_pages,
                active: false,
            });
        }

        Self {
            prev_enabled: current > 1,
            next_enabled: current < total_pages,
            items,
        }
    }
}

/// One table row plus its client-side checkbox state.
#[derive(Debug, Clone)]
pub struct RowView {
    pub user: UserRow,
    pub selected: bool,
}

/// Snapshot of everything a front-end needs to draw the table.
#[derive(Debug, Clone)]
pub struct PageView {
    pub rows: Vec<RowView>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub sort_order: SortOrder,
    pub pagination: Pagination,
}

struct ListState {
    current_page: u32,
    sort_order: SortOrder,
    selection: Selection,
    page: Option<PageResult>,
    error: Option<String>,
    /// Request generation; a response is applied only if no newer load
    /// started while it was in flight.
    generation: u64,
}

pub struct UserListModel {
    api: Arc<dyn PanelApi>,
    per_page: u32,
    state: Mutex<ListState>,
}

impl UserListModel {
    pub fn new(api: Arc<dyn PanelApi>, per_page: u32) -> Self {
        Self {
            api,
            per_page,
            state: Mutex::new(ListState {
                current_page: 1,
                sort_order: SortOrder::default(),
                selection: Selection::default(),
                page: None,
                error: None,
                generation: 0,
            }),
        }
    }

    pub fn current_page(&self) -> u32 {
        self.state.lock().unwrap().current_page
    }

    pub fn sort_order(&self) -> SortOrder {
        self.state.lock().unwrap().sort_order
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().unwrap().error.clone()
    }

    pub fn selected_ids(&self) -> Vec<i64> {
        self.state.lock().unwrap().selection.ids()
    }

    pub fn selection_len(&self) -> usize {
        self.state.lock().unwrap().selection.len()
    }

    /// Load page `n` and make it the current snapshot.
    ///
    /// The page cursor moves immediately; the fetched result is applied only
    /// if it is still the newest request when it lands, so a slow response
    /// from a rapid double click cannot clobber a newer page.
    pub async fn load_page(&self, page: u32) -> Result<(), RequestError> {
        let (generation, sort_order) = {
            let mut state = self.state.lock().unwrap();
            state.generation += 1;
            state.current_page = page;
            (state.generation, state.sort_order)
        };

        let result = self
            .api
            .fetch_user_page(page, self.per_page, sort_order)
            .await;

        let mut state = self.state.lock().unwrap();
        if state.generation != generation {
            tracing::debug!(page, "dropping stale page response");
            return Ok(());
        }

        match result {
            Ok(page_result) => {
                state.current_page = page_result.page;
                // The server normalizes the sort order; take its word for it.
                state.sort_order = page_result.sort_order;
                state.page = Some(page_result);
                state.error = None;
                Ok(())
            }
            Err(err) => {
                tracing::error!(page, error = %err, "failed to load user page");
                state.error = Some(err.to_string());
                state.page = None;
                Err(err)
            }
        }
    }

    /// Flip the sort order and reload from the first page. Sorting always
    /// resets pagination.
    pub async fn toggle_sort(&self) -> Result<(), RequestError> {
        {
            let mut state = self.state.lock().unwrap();
            state.sort_order = state.sort_order.flip();
        }
        self.load_page(1).await
    }

    /// Flip one row's checkbox, returning its new state.
    pub fn toggle_selection(&self, user_id: i64) -> bool {
        self.state.lock().unwrap().selection.toggle(user_id)
    }

    /// Drive every row on the current page to `checked`. Rows on other pages
    /// keep their selection.
    pub fn toggle_select_all(&self, checked: bool) {
        let state = &mut *self.state.lock().unwrap();
        if let Some(page) = &state.page {
            for row in &page.data {
                state.selection.set(row.user_id, checked);
            }
        }
    }

    /// Render snapshot of the current page, or `None` when the last load
    /// failed (the table is suppressed and [`error`] carries the message).
    ///
    /// [`error`]: UserListModel::error
    pub fn page_view(&self) -> Option<PageView> {
        let state = self.state.lock().unwrap();
        let page = state.page.as_ref()?;
        let rows = page
            .data
            .iter()
            .map(|user| RowView {
                selected: state.selection.contains(user.user_id),
                user: user.clone(),
            })
            .collect();
        Some(PageView {
            rows,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
            sort_order: page.sort_order,
            pagination: Pagination::build(page.page, page.total_pages),
        })
    }
}
