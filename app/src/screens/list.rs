//! The student list screen: drives `ListView` and the list cache.
//!
//! # Design
//! Each fetch runs in its own task so the screen stays responsive. The task
//! reports back over a channel tagged with its `FetchTicket`; its
//! `AbortHandle` is kept so a superseded or cancelled fetch is aborted, not
//! just ignored. At most one list fetch is alive at a time.

use std::collections::HashMap;
use std::time::Instant;

use student_core::{
    ApiError, FetchTicket, ListSnapshot, ListView, QueryCache, QueryKey, StudentId, StudentPage,
};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::api::StudentsApi;
use crate::render;

type FetchResult = (FetchTicket, Result<StudentPage, ApiError>);

/// Reports a fetch task's result. A task that ends without sending, by
/// panic or abort, still resolves its ticket when this is dropped.
struct Reply {
    ticket: FetchTicket,
    tx: mpsc::UnboundedSender<FetchResult>,
    sent: bool,
}

impl Reply {
    fn send(mut self, outcome: Result<StudentPage, ApiError>) {
        self.sent = true;
        // The receiver lives as long as the screen.
        let _ = self.tx.send((self.ticket.clone(), outcome));
    }
}

impl Drop for Reply {
    fn drop(&mut self) {
        if !self.sent {
            let lost = ApiError::Transport("list fetch ended without a response".to_string());
            let _ = self.tx.send((self.ticket.clone(), Err(lost)));
        }
    }
}

pub struct StudentsScreen {
    api: StudentsApi,
    view: ListView,
    cache: QueryCache<StudentPage>,
    tasks: HashMap<u64, AbortHandle>,
    results_tx: mpsc::UnboundedSender<FetchResult>,
    results_rx: mpsc::UnboundedReceiver<FetchResult>,
    notice: Option<String>,
}

impl StudentsScreen {
    pub fn new(api: StudentsApi, limit: u32) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            api,
            view: ListView::new(limit),
            cache: QueryCache::new(),
            tasks: HashMap::new(),
            results_tx,
            results_rx,
            notice: None,
        }
    }

    pub fn page(&self) -> u32 {
        self.view.page()
    }

    pub fn cache(&self) -> &QueryCache<StudentPage> {
        &self.cache
    }

    pub fn snapshot(&self) -> ListSnapshot<'_> {
        self.view.snapshot(&self.cache)
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Show `page`, cancelling any fetch still running for the old page. A
    /// changed page is always re-fetched; its cached rows stay visible while
    /// it loads. Staying on the same page only fetches if it has no valid
    /// data.
    pub fn show_page(&mut self, page: u32) -> Option<FetchTicket> {
        let old_key = self.view.key();
        if !self.view.set_page(page) {
            return self.fetch_if_needed();
        }
        self.abort_in_flight(&old_key);
        if self.cache.in_flight(&self.view.key()).is_some() {
            return None;
        }
        Some(self.spawn_fetch())
    }

    /// Fetch the current page if it has no valid data and nothing in flight.
    pub fn fetch_if_needed(&mut self) -> Option<FetchTicket> {
        let key = self.view.key();
        let cached_ok = self
            .cache
            .get(&key)
            .is_some_and(|s| s.is_success() && !s.invalidated);
        if cached_ok || self.cache.in_flight(&key).is_some() {
            return None;
        }
        Some(self.spawn_fetch())
    }

    /// Re-enter loading for the current page, superseding any fetch in flight.
    pub fn refetch(&mut self) -> FetchTicket {
        self.spawn_fetch()
    }

    /// Abort the current page's fetch and restore what was shown before it.
    pub fn cancel(&mut self) -> Option<FetchTicket> {
        let key = self.view.key();
        self.abort_in_flight(&key)
    }

    /// Delete `id`, then invalidate and re-fetch the current page.
    pub async fn delete(&mut self, id: &StudentId) -> Result<String, ApiError> {
        self.api.delete(id).await?;
        let message = self.view.delete_succeeded(&mut self.cache, id);
        info!(%id, page = self.view.page(), "student deleted");
        self.notice = Some(message.clone());
        self.fetch_if_needed();
        Ok(message)
    }

    /// Mark every cached page stale, refreshing the visible one.
    pub fn invalidate_pages(&mut self) {
        self.cache.invalidate_where(QueryKey::is_list);
        self.fetch_if_needed();
    }

    /// Wait for the next fetch result and apply it. Returns `false` if it was
    /// stale. Must only be awaited while a fetch is outstanding.
    pub async fn settle(&mut self) -> bool {
        let Some((ticket, outcome)) = self.results_rx.recv().await else {
            return false;
        };
        self.tasks.remove(&ticket.generation);
        self.cache.resolve(&ticket, outcome, Instant::now())
    }

    /// Apply results until the current page has no fetch in flight.
    pub async fn wait_idle(&mut self) {
        while self.cache.in_flight(&self.view.key()).is_some() {
            self.settle().await;
        }
    }

    pub fn render(&self) -> String {
        render::list(&self.snapshot(), self.notice.as_deref())
    }

    fn spawn_fetch(&mut self) -> FetchTicket {
        let key = self.view.key();
        let begin = self.cache.begin_fetch(key);
        if let Some(old) = begin.superseded {
            self.abort_task(&old);
        }

        let ticket = begin.ticket;
        let api = self.api.clone();
        let tx = self.results_tx.clone();
        let (page, limit) = (self.view.page(), self.view.limit());
        let reply = Reply {
            ticket: ticket.clone(),
            tx,
            sent: false,
        };
        let handle = tokio::spawn(async move {
            let outcome = api.list(page, limit).await;
            reply.send(outcome);
        });
        self.tasks.insert(ticket.generation, handle.abort_handle());
        debug!(page, generation = ticket.generation, "list fetch spawned");
        ticket
    }

    fn abort_in_flight(&mut self, key: &QueryKey) -> Option<FetchTicket> {
        let ticket = self.cache.cancel(key)?;
        self.abort_task(&ticket);
        Some(ticket)
    }

    fn abort_task(&mut self, ticket: &FetchTicket) {
        if let Some(handle) = self.tasks.remove(&ticket.generation) {
            handle.abort();
            debug!(key = %ticket.key, generation = ticket.generation, "list fetch aborted");
        }
    }
}
