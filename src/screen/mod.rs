//! Per-screen state: the fetched records, the filters typed so far and the
//! page being viewed, plus the cancellation scope tied to the view.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::table::{
    clamp_page, filter_paginate, page_count, FilterSet, Filterable, Page, TableError,
};

/// State behind one data table.
///
/// Unlike [`filter_paginate`], the screen keeps the page valid: any filter
/// change sends it back to page 1, and replacing the records or navigating
/// clamps it into `1..=max(1, total_pages)`.
#[derive(Clone, Debug)]
pub struct TableScreen<T> {
    records: Vec<T>,
    filters: FilterSet,
    page: usize,
    page_size: usize,
}

impl<T: Filterable> TableScreen<T> {
    pub fn new(page_size: usize) -> Result<Self, TableError> {
        if page_size == 0 {
            return Err(TableError::InvalidPageSize);
        }
        Ok(Self {
            records: Vec::new(),
            filters: FilterSet::new(),
            page: 1,
            page_size,
        })
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Replaces everything fetched so far; there is no incremental merge.
    pub fn replace_records(&mut self, records: Vec<T>) {
        self.records = records;
        self.page = clamp_page(self.page, self.total_pages());
    }

    pub fn set_filter(&mut self, field: &str, value: impl Into<String>) -> Result<(), TableError> {
        self.filters.set::<T>(field, value)?;
        self.page = 1;
        Ok(())
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.page = 1;
    }

    pub fn total_pages(&self) -> usize {
        let filtered = self
            .records
            .iter()
            .filter(|r| self.filters.matches(*r))
            .count();
        page_count(filtered, self.page_size)
    }

    pub fn go_to(&mut self, page: usize) {
        self.page = clamp_page(page, self.total_pages());
    }

    pub fn next_page(&mut self) {
        self.go_to(self.page.saturating_add(1));
    }

    pub fn previous_page(&mut self) {
        self.go_to(self.page.saturating_sub(1));
    }

    pub fn view(&self) -> Result<Page<'_, T>, TableError> {
        filter_paginate(&self.records, &self.filters, self.page, self.page_size)
    }

    /// Refetches the records under `scope`. Returns `None`, leaving the screen
    /// untouched, when the scope is cancelled before the fetch completes.
    pub async fn refresh<F, E>(&mut self, scope: &ViewScope, fetch: F) -> Option<Result<(), E>>
    where
        F: Future<Output = Result<Vec<T>, E>>,
    {
        let fetched = scope.run(fetch).await?;
        Some(fetched.map(|records| self.replace_records(records)))
    }
}

/// Cancellation token for everything a view has in flight. Dropping the
/// scope cancels it.
#[derive(Debug)]
pub struct ViewScope {
    tx: Arc<watch::Sender<bool>>,
}

/// Cloneable handle that can cancel a [`ViewScope`] from another task.
#[derive(Clone, Debug)]
pub struct Canceller {
    tx: Arc<watch::Sender<bool>>,
}

impl Canceller {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn canceller(&self) -> Canceller {
        Canceller {
            tx: Arc::clone(&self.tx),
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Drives `fut` to completion unless the scope is cancelled first.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        let mut rx = self.tx.subscribe();
        if *rx.borrow_and_update() {
            return None;
        }
        tokio::select! {
            out = fut => Some(out),
            _ = cancelled(&mut rx) => None,
        }
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.tx.send_replace(true);
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::table::MatchRule;

    #[derive(Clone, Debug, PartialEq)]
    struct Item(u32);

    impl Filterable for Item {
        const FILTER_FIELDS: &'static [(&'static str, MatchRule)] = &[("id", MatchRule::Contains)];

        fn field_text(&self, field: &str) -> Option<String> {
            (field == "id").then(|| self.0.to_string())
        }
    }

    fn screen_with(n: u32, page_size: usize) -> TableScreen<Item> {
        let mut screen = TableScreen::new(page_size).unwrap();
        screen.replace_records((1..=n).map(Item).collect());
        screen
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert_eq!(
            TableScreen::<Item>::new(0).unwrap_err(),
            TableError::InvalidPageSize
        );
    }

    #[test]
    fn filter_change_resets_page() {
        let mut screen = screen_with(30, 10);
        screen.go_to(3);
        assert_eq!(screen.page(), 3);
        screen.set_filter("id", "1").unwrap();
        assert_eq!(screen.page(), 1);
        let view = screen.view().unwrap();
        // 1, 10..=19, 21
        assert_eq!(view.filtered_count, 12);
        assert_eq!(view.total_pages, 2);
    }

    #[test]
    fn navigation_is_clamped() {
        let mut screen = screen_with(12, 10);
        screen.go_to(5);
        assert_eq!(screen.page(), 2);
        screen.next_page();
        assert_eq!(screen.page(), 2);
        screen.previous_page();
        screen.previous_page();
        assert_eq!(screen.page(), 1);
    }

    #[test]
    fn shrinking_refetch_pulls_page_back() {
        let mut screen = screen_with(25, 10);
        screen.go_to(3);
        screen.replace_records((1..=4).map(Item).collect());
        assert_eq!(screen.page(), 1);
        assert_eq!(screen.view().unwrap().items.len(), 4);
    }

    #[test]
    fn huge_page_size_keeps_a_single_page() {
        let mut screen = screen_with(3, usize::MAX);
        assert_eq!(screen.total_pages(), 1);
        screen.go_to(4);
        assert_eq!(screen.page(), 1);
        assert_eq!(screen.view().unwrap().items.len(), 3);
    }

    #[test]
    fn clear_filters_resets_page() {
        let mut screen = screen_with(25, 10);
        screen.set_filter("id", "2").unwrap();
        screen.go_to(2);
        screen.clear_filters();
        assert!(screen.filters().is_empty());
        assert_eq!(screen.page(), 1);
    }

    #[tokio::test]
    async fn refresh_replaces_records() {
        let scope = ViewScope::new();
        let mut screen = screen_with(3, 10);
        let result = screen
            .refresh(&scope, async { Ok::<_, String>(vec![Item(8), Item(9)]) })
            .await;
        assert_eq!(result, Some(Ok(())));
        assert_eq!(screen.records(), &[Item(8), Item(9)]);
    }

    #[tokio::test]
    async fn cancelled_scope_skips_fetch_and_keeps_records() {
        let scope = ViewScope::new();
        scope.cancel();
        let mut screen = screen_with(3, 10);
        let result = screen
            .refresh(&scope, async { Ok::<_, String>(Vec::new()) })
            .await;
        assert_eq!(result, None);
        assert_eq!(screen.records().len(), 3);
    }

    #[tokio::test]
    async fn canceller_interrupts_pending_work() {
        let scope = ViewScope::new();
        let canceller = scope.canceller();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let out = scope
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                1
            })
            .await;
        assert_eq!(out, None);
        assert!(scope.is_cancelled());
    }
}
