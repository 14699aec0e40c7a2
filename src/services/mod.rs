/// Search aggregation service
use crate::clients::Transport;
use crate::domain::{Collection, Item, SearchResponse, SearchState};
use crate::errors::SearchResult;
use crate::observer::SearchObserver;
use crate::repo::{QueryStore, LAST_QUERY_KEY};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://images-api.nasa.gov";
pub const DEFAULT_SEARCH_PATH: &str = "search";

/// Page requested when a caller has no cursor yet
pub const FIRST_PAGE: u32 = 1;

/// Highest page number the API will serve
pub const MAX_PAGE: u32 = 100;

/// Results are always restricted to still images
pub const MEDIA_TYPE: &str = "image";

/// Accumulates the pages of one query at a time and reports changes to a
/// single observer.
///
/// `search` takes `&mut self`; owners sharing an aggregator across tasks
/// must serialize calls themselves, e.g. behind a `tokio::sync::Mutex`.
pub struct SearchAggregator {
    transport: Arc<dyn Transport>,
    store: Arc<dyn QueryStore>,
    base_url: String,
    search_path: String,
    observer: Option<Weak<dyn SearchObserver>>,
    current_query: Option<String>,
    pages: Vec<Collection>,
    last_page: u32,
}

impl SearchAggregator {
    /// Build an aggregator against the public API, seeding the current
    /// query from `store`
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn QueryStore>) -> Self {
        Self::with_endpoint(transport, store, DEFAULT_BASE_URL, DEFAULT_SEARCH_PATH)
    }

    pub fn with_endpoint(
        transport: Arc<dyn Transport>,
        store: Arc<dyn QueryStore>,
        base_url: impl Into<String>,
        search_path: impl Into<String>,
    ) -> Self {
        let current_query = store.get(LAST_QUERY_KEY);
        if let Some(q) = &current_query {
            debug!(query = %q, "restored last query");
        }

        Self {
            transport,
            store,
            base_url: base_url.into(),
            search_path: search_path.into(),
            observer: None,
            current_query,
            pages: Vec::new(),
            last_page: FIRST_PAGE,
        }
    }

    /// Register the observer, replacing any previous one. Only a weak
    /// reference is kept.
    pub fn set_observer<O>(&mut self, observer: &Arc<O>)
    where
        O: SearchObserver + 'static,
    {
        let weak: Weak<dyn SearchObserver> = Arc::<O>::downgrade(observer);
        self.observer = Some(weak);
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    fn observer(&self) -> Option<Arc<dyn SearchObserver>> {
        self.observer.as_ref().and_then(Weak::upgrade)
    }

    /// Fetch one page of `query`.
    ///
    /// A new query text resets the accumulated pages and notifies the
    /// observer before the request goes out, so that reset stands even when
    /// the fetch fails. On success the page is merged and the observer gets
    /// the decoded response for this request only.
    pub async fn search(&mut self, query: &str, page: u32) -> SearchResult<SearchResponse> {
        if self.current_query.as_deref() != Some(query) {
            self.change_query(query);
        }

        let params = [
            ("q", query.to_string()),
            ("page", page.to_string()),
            ("media_type", MEDIA_TYPE.to_string()),
        ];
        let body = self
            .transport
            .fetch(&self.search_path, &self.base_url, &params)
            .await?;

        let mut response: SearchResponse = serde_json::from_slice(&body)?;
        response.collection.page = Some(page);
        info!(
            query,
            page,
            items = response.collection.items.len(),
            total_hits = response.collection.metadata.total_hits,
            "search page received"
        );

        self.add(response.collection.clone());

        if let Some(observer) = self.observer() {
            observer.on_data_updated(&response);
        }
        Ok(response)
    }

    /// Fetch the page after the highest one held for the current query.
    /// Returns `Ok(None)` when there is no current query or no further page.
    pub async fn search_next(&mut self) -> SearchResult<Option<SearchResponse>> {
        let (Some(query), Some(page)) = (self.current_query.clone(), self.next_page()) else {
            return Ok(None);
        };
        self.search(&query, page).await.map(Some)
    }

    fn change_query(&mut self, query: &str) {
        info!(
            from = self.current_query.as_deref().unwrap_or(""),
            to = query,
            "query changed"
        );
        self.last_page = FIRST_PAGE;
        self.pages.clear();
        self.current_query = Some(query.to_string());

        if let Err(e) = self.store.set(LAST_QUERY_KEY, query) {
            warn!(error = %e, "failed to persist last query");
        }

        if let Some(observer) = self.observer() {
            observer.on_query_changed();
        }
    }

    /// Merge a page into the accumulated set.
    ///
    /// A page whose `href` is already held is ignored. Pages stay sorted by
    /// page number, unknown numbers first, and `last_page` follows the
    /// highest page (capped at [`MAX_PAGE`]) whenever its number is known.
    pub fn add(&mut self, collection: Collection) {
        if self.pages.iter().any(|p| p.href == collection.href) {
            debug!(href = %collection.href, "page already held");
            return;
        }

        self.pages.push(collection);
        self.pages.sort_by_key(Collection::sort_key);

        if let Some(highest) = self.pages.last().and_then(Collection::page_number) {
            self.last_page = highest.min(MAX_PAGE);
        }
    }

    pub fn current_query(&self) -> Option<&str> {
        self.current_query.as_deref()
    }

    pub fn last_page(&self) -> u32 {
        self.last_page
    }

    /// Accumulated pages in ascending page order
    pub fn all_pages(&self) -> &[Collection] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every accumulated item, in page order
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.pages.iter().flat_map(|p| p.items.iter())
    }

    pub fn find_item(&self, nasa_id: &str) -> Option<&Item> {
        self.items().find(|item| item.nasa_id() == Some(nasa_id))
    }

    /// Total hits as reported by the highest held page
    pub fn total_hits(&self) -> Option<u64> {
        self.pages.last().map(|p| p.metadata.total_hits)
    }

    /// Page after the highest held one, if the server advertised it
    pub fn next_page(&self) -> Option<u32> {
        let highest = self.pages.last()?;
        let link = highest.next_link()?;
        let next = link
            .page_number()
            .or_else(|| highest.page_number().map(|n| n + 1))?;
        (next <= MAX_PAGE).then_some(next)
    }

    pub fn state(&self) -> SearchState {
        SearchState {
            current_query: self.current_query.clone(),
            last_page: self.last_page,
            page_count: self.pages.len(),
            total_hits: self.total_hits(),
            next_page: self.next_page(),
        }
    }
}
