use async_trait::async_trait;

use crate::Error;

/// Every list view in the bot shows this many items per page
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// A paged read over some backing collection
///
/// `fetch_page` must return the total count alongside the items so the pager
/// can clamp its cursor against a count that is fresh for every load
#[async_trait]
pub trait PageSource {
    type Item: Send + Sync;

    async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Self::Item>, usize), Error>;
}

/// What went wrong with a user supplied list position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionError {
    /// The input couldn't be parsed as a position number list
    Invalid,
    /// The position is outside `1..=total_count`
    NotFound(usize),
}

/// Cursor state for browsing a collection in fixed-size pages
///
/// Navigation clamps rather than errors; affordances (`has_previous`,
/// `has_next`) are derived from the cursor on demand so they can't drift
/// from it. `load_page` must run before the first render and again after
/// every mutation of the backing collection
pub struct Pager<S: PageSource> {
    source: S,
    page_size: usize,
    page_index: usize,
    total_count: usize,
    items: Vec<S::Item>,
}

/// Display payload for one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageRender {
    pub fields: Vec<(String, String)>,
    pub footer: String,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<S: PageSource> Pager<S> {
    pub fn new(source: S, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            page_index: 0,
            total_count: 0,
            items: Vec::new(),
        }
    }

    fn max_index(total_count: usize, page_size: usize) -> usize {
        if total_count == 0 {
            0
        } else {
            (total_count + page_size - 1) / page_size - 1
        }
    }

    /// Fetches the requested page, clamping the index against the freshly
    /// fetched total. When clamping moved the index the page is re-fetched
    /// at the clamped offset
    pub async fn load_page(&mut self, index: usize) -> Result<(), Error> {
        let (mut items, mut total_count) = self
            .source
            .fetch_page(index * self.page_size, self.page_size)
            .await?;

        let clamped = index.min(Self::max_index(total_count, self.page_size));
        if clamped != index {
            (items, total_count) = self
                .source
                .fetch_page(clamped * self.page_size, self.page_size)
                .await?;
        }

        self.page_index = clamped;
        self.total_count = total_count;
        self.items = items;
        Ok(())
    }

    pub async fn next(&mut self) -> Result<(), Error> {
        self.load_page(self.page_index + 1).await
    }

    pub async fn previous(&mut self) -> Result<(), Error> {
        self.load_page(self.page_index.saturating_sub(1)).await
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn max_page_index(&self) -> usize {
        Self::max_index(self.total_count, self.page_size)
    }

    pub fn has_previous(&self) -> bool {
        self.page_index > 0
    }

    pub fn has_next(&self) -> bool {
        self.page_index < self.max_page_index()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// Items of the current page with their 1-based absolute positions
    pub fn items(&self) -> impl Iterator<Item = (usize, &S::Item)> {
        let first = self.page_index * self.page_size + 1;
        self.items
            .iter()
            .enumerate()
            .map(move |(i, item)| (first + i, item))
    }

    /// The item at the given absolute position if it is on the current page
    pub fn item_at(&self, position: usize) -> Option<&S::Item> {
        let first = self.page_index * self.page_size + 1;
        position
            .checked_sub(first)
            .and_then(|local| self.items.get(local))
    }

    /// Resolves an absolute position through the source, for positions that
    /// aren't on the current page
    pub async fn fetch_item(&self, position: usize) -> Result<Option<S::Item>, Error> {
        if position < 1 {
            return Ok(None);
        }
        let (items, _) = self.source.fetch_page(position - 1, 1).await?;
        Ok(items.into_iter().next())
    }

    pub fn validate_position(&self, position: usize) -> Result<(), PositionError> {
        if position >= 1 && position <= self.total_count {
            Ok(())
        } else {
            Err(PositionError::NotFound(position))
        }
    }

    pub fn position_label(&self) -> String {
        format!("Page {}/{}", self.page_index + 1, self.max_page_index() + 1)
    }

    pub fn render<F>(&self, format_item: F) -> PageRender
    where
        F: Fn(usize, &S::Item) -> (String, String),
    {
        PageRender {
            fields: self
                .items()
                .map(|(position, item)| format_item(position, item))
                .collect(),
            footer: self.position_label(),
            has_previous: self.has_previous(),
            has_next: self.has_next(),
        }
    }
}

/// Parses a comma separated list of 1-based positions ("1,3,6")
pub fn parse_positions(input: &str) -> Result<Vec<usize>, PositionError> {
    let positions = input
        .split(',')
        .map(|part| part.trim().parse::<usize>().map_err(|_| PositionError::Invalid))
        .collect::<Result<Vec<_>, _>>()?;

    if positions.is_empty() {
        return Err(PositionError::Invalid);
    }
    Ok(positions)
}

/// Outcome of a batch action where each item is attempted independently
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub deleted: usize,
    pub failed: Vec<usize>,
}

impl BatchSummary {
    pub fn succeeded(&mut self) {
        self.deleted += 1;
    }

    pub fn failed(&mut self, position: usize) {
        self.failed.push(position);
    }

    pub fn describe(&self, noun: &str) -> String {
        let mut parts = Vec::new();
        if self.deleted > 0 {
            parts.push(format!(
                "Successfully deleted {} {}{}.",
                self.deleted,
                noun,
                if self.deleted != 1 { "s" } else { "" }
            ));
        }
        if !self.failed.is_empty() {
            let failed = self
                .failed
                .iter()
                .map(|position| format!("#{}", position))
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(format!("Failed to delete {}s: {}", noun, failed));
        }
        if parts.is_empty() {
            parts.push(format!("No {}s deleted.", noun));
        }
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct VecSource {
        items: Mutex<Vec<String>>,
    }

    impl VecSource {
        fn with_count(count: usize) -> Self {
            Self {
                items: Mutex::new((1..=count).map(|i| format!("item {}", i)).collect()),
            }
        }

        fn delete(&self, value: &str) -> bool {
            let mut items = self.items.lock().unwrap();
            let before = items.len();
            items.retain(|item| item != value);
            items.len() != before
        }
    }

    #[async_trait]
    impl PageSource for &VecSource {
        type Item = String;

        async fn fetch_page(
            &self,
            offset: usize,
            limit: usize,
        ) -> Result<(Vec<String>, usize), Error> {
            let items = self.items.lock().unwrap();
            let page = items.iter().skip(offset).take(limit).cloned().collect();
            Ok((page, items.len()))
        }
    }

    #[tokio::test]
    async fn next_clamps_at_the_last_page() {
        let source = VecSource::with_count(12);
        let mut pager = Pager::new(&source, 5);
        pager.load_page(0).await.unwrap();

        assert_eq!(pager.max_page_index(), 2);

        for _ in 0..5 {
            pager.next().await.unwrap();
        }
        assert_eq!(pager.page_index(), 2);
        assert!(pager.has_previous());
        assert!(!pager.has_next());
    }

    #[tokio::test]
    async fn load_page_beyond_bounds_clamps_and_fetches_the_last_page() {
        let source = VecSource::with_count(12);
        let mut pager = Pager::new(&source, 5);
        pager.load_page(10).await.unwrap();

        assert_eq!(pager.page_index(), 2);
        let positions = pager.items().map(|(p, _)| p).collect::<Vec<_>>();
        assert_eq!(positions, vec![11, 12]);
    }

    #[tokio::test]
    async fn previous_saturates_at_the_first_page() {
        let source = VecSource::with_count(12);
        let mut pager = Pager::new(&source, 5);
        pager.load_page(0).await.unwrap();

        pager.previous().await.unwrap();
        assert_eq!(pager.page_index(), 0);
        assert!(!pager.has_previous());
    }

    #[tokio::test]
    async fn reload_without_mutation_is_idempotent() {
        let source = VecSource::with_count(7);
        let mut pager = Pager::new(&source, 5);

        pager.load_page(1).await.unwrap();
        let first = pager.render(|position, item| (format!("#{}", position), item.clone()));

        pager.load_page(pager.page_index()).await.unwrap();
        let second = pager.render(|position, item| (format!("#{}", position), item.clone()));

        assert_eq!(first, second);
        assert_eq!(first.footer, "Page 2/2");
    }

    #[tokio::test]
    async fn empty_collection_renders_a_single_empty_page() {
        let source = VecSource::with_count(0);
        let mut pager = Pager::new(&source, 5);
        pager.load_page(0).await.unwrap();

        assert!(pager.is_empty());
        assert!(!pager.has_previous());
        assert!(!pager.has_next());
        assert_eq!(pager.position_label(), "Page 1/1");
    }

    #[tokio::test]
    async fn batch_delete_reports_each_position_independently() {
        let source = VecSource::with_count(3);
        let mut pager = Pager::new(&source, 5);
        pager.load_page(0).await.unwrap();

        // Mirrors the command flow: resolve every position against the
        // pre-delete snapshot, then apply and summarize
        let mut summary = BatchSummary::default();
        let mut targets = Vec::new();
        for position in parse_positions("1,5").unwrap() {
            match pager.validate_position(position) {
                Ok(()) => targets.push((position, pager.item_at(position).cloned())),
                Err(_) => summary.failed(position),
            }
        }
        for (position, target) in targets {
            match target {
                Some(item) if source.delete(&item) => summary.succeeded(),
                _ => summary.failed(position),
            }
        }

        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.failed, vec![5]);
        assert_eq!(
            summary.describe("note"),
            "Successfully deleted 1 note.\nFailed to delete notes: #5"
        );

        pager.load_page(pager.page_index()).await.unwrap();
        assert_eq!(pager.total_count(), 2);
    }

    #[tokio::test]
    async fn fetch_item_resolves_positions_off_the_current_page() {
        let source = VecSource::with_count(12);
        let pager = {
            let mut pager = Pager::new(&source, 5);
            pager.load_page(0).await.unwrap();
            pager
        };

        assert!(pager.item_at(11).is_none());
        assert_eq!(pager.fetch_item(11).await.unwrap().unwrap(), "item 11");
        assert!(pager.fetch_item(0).await.unwrap().is_none());
        assert!(pager.fetch_item(13).await.unwrap().is_none());
    }

    #[test]
    fn positions_parse_and_reject_garbage() {
        assert_eq!(parse_positions("1,3,6").unwrap(), vec![1, 3, 6]);
        assert_eq!(parse_positions(" 2 , 4 ").unwrap(), vec![2, 4]);
        assert_eq!(parse_positions("a,2"), Err(PositionError::Invalid));
        assert_eq!(parse_positions(""), Err(PositionError::Invalid));
    }
}
