//! List pages (ongoing, completed, recent, batch, movies, genre, search) are
//! all one [`ListPage`] parameterised by a [`ListPageConfig`].

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::api::{ApiClient, PageResult};
use crate::controller::{BoxFetch, FetchController, FetchState, Waker};
use crate::models::AnimeCard;
use crate::pagination::{self, Ordering, PageRequest, WINDOW_SIZE};
use crate::session::Session;

/// How the page-specific filter (genre id, search text) reaches the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    None,
    /// Appended as an encoded path segment.
    PathSegment,
    /// Sent as the named query parameter.
    Query(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPageConfig {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub path: &'static str,
    pub list_field: &'static str,
    pub filter: FilterMode,
    pub ordering: Option<Ordering>,
    pub paginated: bool,
    pub requires_auth: bool,
}

impl ListPageConfig {
    pub fn ongoing() -> Self {
        Self {
            title: "Ongoing",
            subtitle: "Anime airing this week",
            path: "/otakudesu/ongoing",
            list_field: "animeList",
            filter: FilterMode::None,
            ordering: Some(Ordering::Latest),
            paginated: true,
            requires_auth: true,
        }
    }

    pub fn completed() -> Self {
        Self {
            title: "Completed",
            subtitle: "Finished series",
            path: "/samehadaku/completed",
            list_field: "animeList",
            filter: FilterMode::None,
            ordering: None,
            paginated: true,
            requires_auth: false,
        }
    }

    pub fn recent() -> Self {
        Self {
            title: "Recent",
            subtitle: "Latest episode releases",
            path: "/samehadaku/recent",
            list_field: "animeList",
            filter: FilterMode::None,
            ordering: Some(Ordering::Latest),
            paginated: true,
            requires_auth: false,
        }
    }

    pub fn batch() -> Self {
        Self {
            title: "Batch",
            subtitle: "Complete batch releases",
            path: "/samehadaku/batch",
            list_field: "batchList",
            filter: FilterMode::None,
            ordering: Some(Ordering::Latest),
            paginated: true,
            requires_auth: false,
        }
    }

    pub fn movies() -> Self {
        Self {
            title: "Movies",
            subtitle: "Anime films",
            path: "/samehadaku/movies",
            list_field: "animeList",
            filter: FilterMode::None,
            ordering: None,
            paginated: true,
            requires_auth: false,
        }
    }

    pub fn genre_detail() -> Self {
        Self {
            title: "Genre",
            subtitle: "Anime in this genre",
            path: "/otakudesu/genres",
            list_field: "animeList",
            filter: FilterMode::PathSegment,
            ordering: None,
            paginated: true,
            requires_auth: false,
        }
    }

    pub fn search() -> Self {
        Self {
            title: "Search",
            subtitle: "Search results",
            path: "/otakudesu/search",
            list_field: "animeList",
            filter: FilterMode::Query("q"),
            ordering: None,
            paginated: false,
            requires_auth: false,
        }
    }

    fn needs_filter(&self) -> bool {
        self.filter != FilterMode::None
    }

    /// Request path and query for one page of this resource.
    pub fn request_parts(&self, key: &ListKey) -> (String, Vec<(&'static str, String)>) {
        let mut path = self.path.to_string();
        let mut query = if self.paginated {
            key.page.query()
        } else {
            Vec::new()
        };
        if let Some(filter) = key.filter.as_deref() {
            match self.filter {
                FilterMode::None => {}
                FilterMode::PathSegment => {
                    path.push('/');
                    path.push_str(&urlencoding::encode(filter));
                }
                FilterMode::Query(name) => query.push((name, filter.to_string())),
            }
        }
        (path, query)
    }
}

/// Identity of one list fetch; a change in any field triggers a new fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListKey {
    pub page: PageRequest,
    pub filter: Option<String>,
}

pub struct ListPage {
    config: ListPageConfig,
    filter: Option<String>,
    current_page: u32,
    total_pages: u32,
    ctrl: FetchController<ListKey, PageResult<AnimeCard>>,
}

impl ListPage {
    pub fn new(config: ListPageConfig, handle: Handle, session: Arc<Session>) -> Self {
        Self {
            config,
            filter: None,
            current_page: 1,
            total_pages: 1,
            ctrl: FetchController::new(handle, session),
        }
    }

    pub fn with_waker(mut self, waker: Waker) -> Self {
        self.ctrl = self.ctrl.with_waker(waker);
        self
    }

    pub fn config(&self) -> &ListPageConfig {
        &self.config
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn state(&self) -> &FetchState<PageResult<AnimeCard>> {
        self.ctrl.state()
    }

    /// False when the page needs a filter (genre, query) that is not set yet.
    pub fn has_input(&self) -> bool {
        !self.config.needs_filter() || self.filter.is_some()
    }

    fn key(&self) -> ListKey {
        ListKey {
            page: PageRequest {
                page: self.current_page,
                ordering: self.config.ordering,
            },
            filter: self.filter.clone(),
        }
    }

    /// Fetches the current key if it is not already loaded or loading.
    pub fn mount(&mut self, api: &ApiClient) -> bool {
        if !self.has_input() {
            return false;
        }
        let key = self.key();
        let fetch = self.fetcher(api, &key);
        self.ctrl.request(key, fetch)
    }

    pub fn reload(&mut self, api: &ApiClient) {
        if !self.has_input() {
            return;
        }
        let key = self.key();
        let fetch = self.fetcher(api, &key);
        self.ctrl.reload(key, fetch);
    }

    /// Switches genre/query. Resets to the first page.
    pub fn set_filter(&mut self, filter: Option<String>, api: &ApiClient) -> bool {
        let filter = filter
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        if filter != self.filter {
            self.filter = filter;
            self.current_page = 1;
            self.total_pages = 1;
        }
        self.mount(api)
    }

    /// Navigates to `page` if it lies within `[1, total_pages]`.
    pub fn go_to(&mut self, page: u32, api: &ApiClient) -> bool {
        if !self.config.paginated {
            return false;
        }
        match pagination::checked_target(page, self.total_pages) {
            Some(target) if target != self.current_page => {
                self.current_page = target;
                self.mount(api)
            }
            _ => false,
        }
    }

    pub fn poll(&mut self) {
        if self.ctrl.poll() == 0 {
            return;
        }
        if let FetchState::Ready(result) = self.ctrl.state() {
            self.total_pages = result.total_pages.max(1);
        }
    }

    pub fn window(&self) -> Vec<u32> {
        pagination::page_window(self.current_page, self.total_pages, WINDOW_SIZE)
    }

    fn fetcher(
        &self,
        api: &ApiClient,
        key: &ListKey,
    ) -> impl FnOnce() -> BoxFetch<PageResult<AnimeCard>> {
        let api = api.clone();
        let (path, query) = self.config.request_parts(key);
        let field = self.config.list_field;
        let auth = self.config.requires_auth;
        move || -> BoxFetch<PageResult<AnimeCard>> {
            Box::pin(async move { api.fetch_cards(&path, field, &query, auth).await })
        }
    }
}
