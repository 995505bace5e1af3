//! Cursor-paginated lists with a load-more guard.
//!
//! # Design
//! `PagedList` is the plain state a list screen keeps: the items shown so
//! far, the cursor for the next page and whether one exists. Every fetch is
//! started by taking a `PageTicket` and finished by handing the ticket back
//! with the result. Tickets carry the filter generation they were issued
//! under, so a page that arrives after the filter changed (or after a newer
//! refresh started) is dropped instead of being mixed into the new list.
//!
//! Items are not de-duplicated across pages. If the server's data shifts
//! between requests, an item may show twice or be skipped.
//!
//! `PagedFeed` wraps the state in `Arc<Mutex<_>>` and drives fetches from
//! async code. The lock is never held across an await.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::types::Page;

/// Permission to run one page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket<F> {
    generation: u64,
    cursor: Option<i64>,
    filter: F,
}

impl<F> PageTicket<F> {
    /// `None` for the first page.
    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn is_first_page(&self) -> bool {
        self.cursor.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct PagedList<T, F = ()> {
    filter: F,
    items: Vec<T>,
    next_cursor: Option<i64>,
    has_next: bool,
    loading: bool,
    generation: u64,
    fallback: Vec<T>,
    last_error: Option<ApiError>,
}

impl<T: Clone, F: Clone + Default> Default for PagedList<T, F> {
    fn default() -> Self {
        Self::new(F::default())
    }
}

impl<T: Clone, F: Clone> PagedList<T, F> {
    pub fn new(filter: F) -> Self {
        Self {
            filter,
            items: Vec::new(),
            next_cursor: None,
            has_next: false,
            loading: false,
            generation: 0,
            fallback: Vec::new(),
            last_error: None,
        }
    }

    /// Items shown when the first page cannot be loaded.
    pub fn with_fallback(mut self, fallback: Vec<T>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn next_cursor(&self) -> Option<i64> {
        self.next_cursor
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Error from the most recent completed fetch, if it failed.
    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    /// Start over from the first page. Any fetch still in flight becomes
    /// stale.
    pub fn begin_refresh(&mut self) -> PageTicket<F> {
        self.generation += 1;
        self.loading = true;
        PageTicket {
            generation: self.generation,
            cursor: None,
            filter: self.filter.clone(),
        }
    }

    /// Next page, unless a fetch is already running or there is nothing more
    /// to load.
    pub fn begin_load_more(&mut self) -> Option<PageTicket<F>> {
        if self.loading || !self.has_next {
            return None;
        }
        let cursor = self.next_cursor?;
        self.loading = true;
        Some(PageTicket {
            generation: self.generation,
            cursor: Some(cursor),
            filter: self.filter.clone(),
        })
    }

    /// Switch filter. Prior pages are discarded and a first-page ticket for
    /// the new filter is returned.
    pub fn set_filter(&mut self, filter: F) -> PageTicket<F> {
        self.filter = filter;
        self.items.clear();
        self.next_cursor = None;
        self.has_next = false;
        self.last_error = None;
        self.begin_refresh()
    }

    /// Give up on a fetch that will never complete. Clears `loading` unless a
    /// newer ticket has been issued since.
    fn abandon(&mut self, generation: u64) {
        if generation == self.generation && self.loading {
            debug!(generation, "page fetch abandoned");
            self.loading = false;
        }
    }

    /// Apply the outcome of the fetch `ticket` was issued for. Returns
    /// `false` when the ticket was stale and the result was ignored.
    pub fn complete(&mut self, ticket: PageTicket<F>, result: Result<Page<T>, ApiError>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale page"
            );
            return false;
        }
        self.loading = false;

        match result {
            Ok(page) => {
                if ticket.is_first_page() {
                    self.items = page.items;
                } else {
                    self.items.extend(page.items);
                }
                self.next_cursor = page.next_cursor_id;
                self.has_next = page.has_next;
                self.last_error = None;
            }
            Err(err) => {
                warn!(error = %err, first_page = ticket.is_first_page(), "page fetch failed");
                if ticket.is_first_page() {
                    self.items = self.fallback.clone();
                    self.next_cursor = None;
                    self.has_next = false;
                }
                self.last_error = Some(err);
            }
        }
        true
    }
}

/// Shareable async driver around a `PagedList`.
#[derive(Debug)]
pub struct PagedFeed<T, F = ()> {
    state: Arc<Mutex<PagedList<T, F>>>,
}

impl<T, F> Clone for PagedFeed<T, F> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Clone, F: Clone> PagedFeed<T, F> {
    pub fn new(list: PagedList<T, F>) -> Self {
        Self {
            state: Arc::new(Mutex::new(list)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PagedList<T, F>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the current state.
    pub fn with<R>(&self, read: impl FnOnce(&PagedList<T, F>) -> R) -> R {
        read(&self.lock())
    }

    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    /// Fetch the first page for the current filter.
    pub async fn refresh<Fetch, Fut>(&self, fetch: Fetch) -> bool
    where
        Fetch: FnOnce(F, Option<i64>) -> Fut,
        Fut: Future<Output = Result<Page<T>, ApiError>>,
    {
        let ticket = self.lock().begin_refresh();
        self.run(ticket, fetch).await
    }

    /// Fetch the next page. Returns `false` without calling `fetch` when a
    /// fetch is already running or the list is exhausted.
    pub async fn load_more<Fetch, Fut>(&self, fetch: Fetch) -> bool
    where
        Fetch: FnOnce(F, Option<i64>) -> Fut,
        Fut: Future<Output = Result<Page<T>, ApiError>>,
    {
        let Some(ticket) = self.lock().begin_load_more() else {
            return false;
        };
        self.run(ticket, fetch).await
    }

    pub async fn set_filter<Fetch, Fut>(&self, filter: F, fetch: Fetch) -> bool
    where
        Fetch: FnOnce(F, Option<i64>) -> Fut,
        Fut: Future<Output = Result<Page<T>, ApiError>>,
    {
        let ticket = self.lock().set_filter(filter);
        self.run(ticket, fetch).await
    }

    async fn run<Fetch, Fut>(&self, ticket: PageTicket<F>, fetch: Fetch) -> bool
    where
        Fetch: FnOnce(F, Option<i64>) -> Fut,
        Fut: Future<Output = Result<Page<T>, ApiError>>,
    {
        let mut guard = InFlight {
            feed: self,
            generation: ticket.generation,
            armed: true,
        };
        let result = fetch(ticket.filter.clone(), ticket.cursor).await;
        guard.armed = false;
        self.lock().complete(ticket, result)
    }
}

/// Releases the loading flag when a fetch future is dropped before it
/// finishes (view torn down, caller timeout).
struct InFlight<'a, T: Clone, F: Clone> {
    feed: &'a PagedFeed<T, F>,
    generation: u64,
    armed: bool,
}

impl<T: Clone, F: Clone> Drop for InFlight<'_, T, F> {
    fn drop(&mut self) {
        if self.armed {
            self.feed.lock().abandon(self.generation);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::types::Theme;

    fn page(items: &[u32], next: Option<i64>, has_next: bool) -> Result<Page<u32>, ApiError> {
        Ok(Page::new(items.to_vec(), next, has_next))
    }

    #[test]
    fn first_page_replaces_and_next_page_appends() {
        let mut list: PagedList<u32> = PagedList::default();
        let t = list.begin_refresh();
        assert!(list.complete(t, page(&[1, 2], Some(2), true)));

        let t = list.begin_load_more().unwrap();
        assert_eq!(t.cursor(), Some(2));
        list.complete(t, page(&[3, 4], Some(4), true));
        assert_eq!(list.items(), &[1, 2, 3, 4]);

        let t = list.begin_refresh();
        list.complete(t, page(&[9], None, false));
        assert_eq!(list.items(), &[9]);
    }

    #[test]
    fn exhausted_list_issues_no_more_tickets() {
        let mut list: PagedList<u32> = PagedList::default();
        let t = list.begin_refresh();
        list.complete(t, page(&[1], Some(1), false));
        assert!(!list.has_next());
        assert!(list.begin_load_more().is_none());
    }

    #[test]
    fn nothing_to_load_before_first_page() {
        let mut list: PagedList<u32> = PagedList::default();
        assert!(list.begin_load_more().is_none());
    }

    #[test]
    fn second_load_more_is_suppressed_while_loading() {
        let mut list: PagedList<u32> = PagedList::default();
        let t = list.begin_refresh();
        list.complete(t, page(&[1], Some(1), true));

        let first = list.begin_load_more();
        assert!(first.is_some());
        assert!(list.begin_load_more().is_none());
        list.complete(first.unwrap(), page(&[2], None, false));
        assert!(!list.is_loading());
    }

    #[test]
    fn filter_change_discards_in_flight_page() {
        let mut list = PagedList::<u32, Option<Theme>>::new(None);
        let t = list.begin_refresh();
        list.complete(t, page(&[1, 2], Some(2), true));

        let stale = list.begin_load_more().unwrap();
        let fresh = list.set_filter(Some(Theme::Sea));
        assert!(list.items().is_empty());
        assert_eq!(fresh.filter(), &Some(Theme::Sea));

        assert!(!list.complete(stale, page(&[3], Some(3), true)));
        assert!(list.is_loading());
        assert!(list.complete(fresh, page(&[10], None, false)));
        assert_eq!(list.items(), &[10]);
    }

    #[test]
    fn failed_first_page_uses_fallback() {
        let mut list: PagedList<u32> = PagedList::default().with_fallback(vec![100, 101]);
        let t = list.begin_refresh();
        list.complete(t, Err(ApiError::Transport("offline".into())));
        assert_eq!(list.items(), &[100, 101]);
        assert!(!list.has_next());
        assert!(matches!(list.last_error(), Some(ApiError::Transport(_))));
    }

    #[test]
    fn failed_load_more_keeps_items_and_allows_retry() {
        let mut list: PagedList<u32> = PagedList::default();
        let t = list.begin_refresh();
        list.complete(t, page(&[1], Some(1), true));

        let t = list.begin_load_more().unwrap();
        list.complete(
            t,
            Err(ApiError::Timeout {
                after: Duration::from_secs(10),
            }),
        );
        assert_eq!(list.items(), &[1]);
        assert!(list.begin_load_more().is_some());
    }

    #[test]
    fn duplicates_across_pages_are_kept() {
        let mut list: PagedList<u32> = PagedList::default();
        let t = list.begin_refresh();
        list.complete(t, page(&[1, 2], Some(2), true));
        let t = list.begin_load_more().unwrap();
        list.complete(t, page(&[2, 3], None, false));
        assert_eq!(list.items(), &[1, 2, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_load_more_issues_one_fetch() {
        let feed = PagedFeed::new(PagedList::<u32>::default());
        feed.refresh(|_, _| async { page(&[1], Some(1), true) })
            .await;

        let calls = AtomicUsize::new(0);
        let fetch = |_: (), cursor: Option<i64>| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                assert_eq!(cursor, Some(1));
                page(&[2], None, false)
            }
        };

        let (a, b) = tokio::join!(feed.load_more(fetch), feed.load_more(fetch));
        assert!(a ^ b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(feed.items(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_load_more_can_be_retried() {
        let feed = PagedFeed::new(PagedList::<u32>::default());
        feed.refresh(|_, _| async { page(&[1], Some(1), true) })
            .await;

        let slow = feed.load_more(|_, _| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            page(&[2], None, false)
        });
        assert!(tokio::time::timeout(Duration::from_millis(10), slow)
            .await
            .is_err());
        assert!(!feed.with(PagedList::is_loading));

        assert!(feed.load_more(|_, _| async { page(&[2], None, false) }).await);
        assert_eq!(feed.items(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_stale_fetch_leaves_newer_one_loading() {
        let feed = PagedFeed::new(PagedList::<u32>::default());
        feed.refresh(|_, _| async { page(&[1], Some(1), true) })
            .await;

        let mut slow = Box::pin(feed.load_more(|_, _| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            page(&[2], None, false)
        }));
        assert!(tokio::time::timeout(Duration::from_millis(10), &mut slow)
            .await
            .is_err());

        let ticket = feed.lock().begin_refresh();
        drop(slow);
        assert!(feed.with(PagedList::is_loading));

        assert!(feed.lock().complete(ticket, page(&[5], None, false)));
        assert_eq!(feed.items(), vec![5]);
    }

    #[tokio::test]
    async fn feed_filter_switch_refetches() {
        let feed = PagedFeed::new(PagedList::<u32, Option<Theme>>::new(None));
        feed.refresh(|_, _| async { page(&[1, 2], Some(2), true) })
            .await;

        let applied = feed
            .set_filter(Some(Theme::History), |filter, cursor| async move {
                assert_eq!(filter, Some(Theme::History));
                assert_eq!(cursor, None);
                page(&[7], None, false)
            })
            .await;
        assert!(applied);
        assert_eq!(feed.items(), vec![7]);
        assert!(!feed.load_more(|_, _| async { page(&[8], None, false) }).await);
    }
}
