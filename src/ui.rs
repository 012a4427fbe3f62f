use std::sync::Arc;

use chrono::{Local, TimeZone};
use tokio::runtime::Runtime;

use crate::api::ApiClient;
use crate::controller::{FetchController, FetchState, Waker};
use crate::history::WatchHistory;
use crate::models::{
    AnimeCard, AnimeDetail, EpisodeDetail, Genre, HomeFeed, LetterGroup, ScheduleDay,
};
use crate::pages::{ListPage, ListPageConfig};
use crate::session::Session;
use crate::settings::{self, AppSettings, DEFAULT_API_BASE};

const CARD_WIDTH: f32 = 170.0;
const LABEL_COLUMN_WIDTH: f32 = 130.0;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Login,
    Home,
    Ongoing,
    Completed,
    Recent,
    Batch,
    Movies,
    Genres,
    Genre(String),
    Search,
    Schedule,
    AnimeIndex,
    Anime(String),
    Episode(String),
    History,
    Settings,
}

/// Things a view asks for; applied after the frame's borrows end.
enum UiAction {
    Navigate(Route),
    GoToPage(u32),
    Reload,
    OpenExternal(String),
    Search(String),
    ClearHistory,
}

struct Pages {
    ongoing: ListPage,
    completed: ListPage,
    recent: ListPage,
    batch: ListPage,
    movies: ListPage,
    genre: ListPage,
    search: ListPage,
    home: FetchController<(), HomeFeed>,
    highlights: FetchController<(), Vec<AnimeCard>>,
    genres: FetchController<(), Vec<Genre>>,
    schedule: FetchController<(), Vec<ScheduleDay>>,
    index: FetchController<(), Vec<LetterGroup>>,
    anime: FetchController<String, AnimeDetail>,
    episode: FetchController<String, EpisodeDetail>,
}

impl Pages {
    fn new(rt: &Runtime, session: &Arc<Session>, waker: &Waker) -> Self {
        let list = |config: ListPageConfig| {
            ListPage::new(config, rt.handle().clone(), session.clone()).with_waker(waker.clone())
        };
        Self {
            ongoing: list(ListPageConfig::ongoing()),
            completed: list(ListPageConfig::completed()),
            recent: list(ListPageConfig::recent()),
            batch: list(ListPageConfig::batch()),
            movies: list(ListPageConfig::movies()),
            genre: list(ListPageConfig::genre_detail()),
            search: list(ListPageConfig::search()),
            home: controller(rt, session, waker),
            highlights: controller(rt, session, waker),
            genres: controller(rt, session, waker),
            schedule: controller(rt, session, waker),
            index: controller(rt, session, waker),
            anime: controller(rt, session, waker),
            episode: controller(rt, session, waker),
        }
    }

    fn list_mut(&mut self, route: &Route) -> Option<&mut ListPage> {
        match route {
            Route::Ongoing => Some(&mut self.ongoing),
            Route::Completed => Some(&mut self.completed),
            Route::Recent => Some(&mut self.recent),
            Route::Batch => Some(&mut self.batch),
            Route::Movies => Some(&mut self.movies),
            Route::Genre(_) => Some(&mut self.genre),
            Route::Search => Some(&mut self.search),
            _ => None,
        }
    }

    fn poll(&mut self) {
        for page in [
            &mut self.ongoing,
            &mut self.completed,
            &mut self.recent,
            &mut self.batch,
            &mut self.movies,
            &mut self.genre,
            &mut self.search,
        ] {
            page.poll();
        }
        self.home.poll();
        self.highlights.poll();
        self.genres.poll();
        self.schedule.poll();
        self.index.poll();
        self.anime.poll();
        self.episode.poll();
    }
}

fn apply_style(ctx: &egui::Context, dark: bool) {
    let mut style = (*ctx.style()).clone();
    style.visuals = if dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };
    style.spacing.item_spacing = egui::vec2(8.0, 8.0);
    style.spacing.button_padding = egui::vec2(10.0, 6.0);
    style.visuals.widgets.inactive.rounding = egui::Rounding::same(6.0);
    style.visuals.widgets.active.rounding = egui::Rounding::same(6.0);
    style.visuals.widgets.hovered.rounding = egui::Rounding::same(6.0);
    ctx.set_style(style);
}

fn controller<K, T>(rt: &Runtime, session: &Arc<Session>, waker: &Waker) -> FetchController<K, T>
where
    K: Clone + PartialEq + std::fmt::Debug,
    T: Send + 'static,
{
    FetchController::new(rt.handle().clone(), session.clone()).with_waker(waker.clone())
}

pub struct AnistreamApp {
    rt: Arc<Runtime>,
    settings: AppSettings,
    session: Arc<Session>,
    history: WatchHistory,
    api: ApiClient,
    waker: Waker,
    pages: Pages,
    route: Route,
    // Route whose fetches were last issued; entering a route re-mounts it.
    mounted: Option<Route>,
    recorded_episode: Option<String>,
    dark_applied: bool,
    // Inputs
    search_input: String,
    index_filter: String,
    token_input: String,
    host_input: String,
    timeout_input: u64,
    notice: Option<String>,
}

impl AnistreamApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        rt: Arc<Runtime>,
        settings: AppSettings,
        session: Arc<Session>,
        history: WatchHistory,
        api: ApiClient,
    ) -> Self {
        apply_style(&cc.egui_ctx, settings.theme_dark);

        let ctx = cc.egui_ctx.clone();
        let waker: Waker = Arc::new(move || ctx.request_repaint());
        let pages = Pages::new(&rt, &session, &waker);
        let route = if session.is_authenticated() {
            Route::Home
        } else {
            Route::Login
        };
        Self {
            host_input: settings.api_base_url.clone(),
            timeout_input: settings.request_timeout_secs,
            dark_applied: settings.theme_dark,
            rt,
            settings,
            session,
            history,
            api,
            waker,
            pages,
            route,
            mounted: None,
            recorded_episode: None,
            search_input: String::new(),
            index_filter: String::new(),
            token_input: String::new(),
            notice: None,
        }
    }

    fn persist_settings(&mut self) {
        self.settings.api_base_url = settings::normalize_host(&self.host_input);
        self.host_input = self.settings.api_base_url.clone();
        self.settings.request_timeout_secs = self.timeout_input.max(1);
        if let Err(e) = self.settings.save() {
            tracing::warn!("failed to save settings: {e:#}");
        }
    }

    /// Rebuilds the client and drops every cached page, e.g. after the base
    /// URL or the session changed.
    fn reset_client(&mut self) {
        match ApiClient::new(
            &self.settings.api_base_url,
            self.settings.timeout(),
            self.session.clone(),
        ) {
            Ok(api) => self.api = api,
            Err(e) => {
                tracing::error!("failed to build http client: {e}");
                self.notice = Some(e.to_string());
            }
        }
        self.pages = Pages::new(&self.rt, &self.session, &self.waker);
        self.mounted = None;
        self.recorded_episode = None;
    }

    /// Issues the fetches for the visible route once per entry. Keys that
    /// already loaded are kept; failed ones are fetched again.
    fn mount_route(&mut self) {
        if self.mounted.as_ref() == Some(&self.route) {
            return;
        }
        self.mounted = Some(self.route.clone());
        let api = self.api.clone();
        match self.route.clone() {
            Route::Home => {
                let side = api.clone();
                self.pages.home.request((), move || async move { api.home().await });
                self.pages
                    .highlights
                    .request((), move || async move { side.completed_highlights().await });
            }
            Route::Genres => {
                self.pages.genres.request((), move || async move { api.genres().await });
            }
            Route::Schedule => {
                self.pages.schedule.request((), move || async move { api.schedule().await });
            }
            Route::AnimeIndex => {
                self.pages.index.request((), move || async move { api.anime_index().await });
            }
            Route::Anime(id) => {
                let key = id.clone();
                self.pages
                    .anime
                    .request(key, move || async move { api.anime_detail(&id).await });
            }
            Route::Episode(id) => {
                let key = id.clone();
                self.pages
                    .episode
                    .request(key, move || async move { api.episode_detail(&id).await });
            }
            Route::Genre(id) => {
                self.pages.genre.set_filter(Some(id), &api);
            }
            route => {
                if let Some(page) = self.pages.list_mut(&route) {
                    page.mount(&api);
                }
            }
        }
    }

    fn record_history(&mut self) {
        let Route::Episode(id) = &self.route else {
            return;
        };
        if self.recorded_episode.as_deref() == Some(id.as_str()) {
            return;
        }
        if let (Some(key), Some(ep)) =
            (self.pages.episode.key(), self.pages.episode.state().ready())
        {
            if key == id {
                if let Err(e) = self.history.record(id, &ep.title) {
                    tracing::warn!("failed to record history: {e:#}");
                }
                self.recorded_episode = Some(id.clone());
            }
        }
    }

    fn apply(&mut self, action: UiAction) {
        let api = self.api.clone();
        match action {
            UiAction::Navigate(route) => {
                tracing::debug!(?route, "navigate");
                self.route = route;
            }
            UiAction::GoToPage(n) => {
                let route = self.route.clone();
                if let Some(page) = self.pages.list_mut(&route) {
                    page.go_to(n, &api);
                }
            }
            UiAction::Reload => self.reload_route(),
            UiAction::OpenExternal(url) => {
                if let Err(e) = open::that(&url) {
                    tracing::warn!(%url, "failed to open link: {e}");
                    self.notice = Some(format!("Could not open link: {e}"));
                }
            }
            UiAction::Search(q) => {
                self.pages.search.set_filter(Some(q), &api);
                self.route = Route::Search;
            }
            UiAction::ClearHistory => {
                if let Err(e) = self.history.clear() {
                    tracing::warn!("failed to clear history: {e:#}");
                }
            }
        }
    }

    fn reload_route(&mut self) {
        let api = self.api.clone();
        match self.route.clone() {
            Route::Home => {
                let side = api.clone();
                self.pages.home.reload((), move || async move { api.home().await });
                self.pages
                    .highlights
                    .reload((), move || async move { side.completed_highlights().await });
            }
            Route::Genres => self
                .pages
                .genres
                .reload((), move || async move { api.genres().await }),
            Route::Schedule => self
                .pages
                .schedule
                .reload((), move || async move { api.schedule().await }),
            Route::AnimeIndex => self
                .pages
                .index
                .reload((), move || async move { api.anime_index().await }),
            Route::Anime(id) => {
                let key = id.clone();
                self.pages
                    .anime
                    .reload(key, move || async move { api.anime_detail(&id).await })
            }
            Route::Episode(id) => {
                let key = id.clone();
                self.pages
                    .episode
                    .reload(key, move || async move { api.episode_detail(&id).await })
            }
            route => {
                if let Some(page) = self.pages.list_mut(&route) {
                    page.reload(&api);
                }
            }
        }
    }

    fn top_bar(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.horizontal_wrapped(|ui| {
            ui.heading("Anistream");
            ui.add_space(12.0);
            let links = [
                ("Home", Route::Home),
                ("Ongoing", Route::Ongoing),
                ("Completed", Route::Completed),
                ("Recent", Route::Recent),
                ("Batch", Route::Batch),
                ("Movies", Route::Movies),
                ("Genres", Route::Genres),
                ("Schedule", Route::Schedule),
                ("A-Z", Route::AnimeIndex),
                ("History", Route::History),
                ("Settings", Route::Settings),
            ];
            for (label, route) in links {
                if ui.selectable_label(self.route == route, label).clicked() {
                    actions.push(UiAction::Navigate(route));
                }
            }
            ui.add_space(12.0);
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.search_input)
                    .desired_width(180.0)
                    .hint_text("Search anime"),
            );
            let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if (ui.button("Search").clicked() || submitted) && !self.search_input.trim().is_empty()
            {
                actions.push(UiAction::Search(self.search_input.trim().to_string()));
            }
            ui.add_space(12.0);
            if self.session.is_authenticated() {
                if ui.small_button("Log out").clicked() {
                    self.session.invalidate();
                }
            } else if ui.small_button("Log in").clicked() {
                actions.push(UiAction::Navigate(Route::Login));
            }
        });
    }

    fn login_view(&mut self, ui: &mut egui::Ui) {
        ui.heading("Log in");
        ui.label("Paste the access token issued by the content API.");
        ui.add_space(8.0);
        labeled_row(ui, "Token", |ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.token_input)
                    .password(true)
                    .desired_width(320.0),
            );
        });
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("Continue").clicked() {
                match self.session.set_token(&self.token_input) {
                    Ok(()) => {
                        self.token_input.clear();
                        self.notice = None;
                        self.reset_client();
                        self.route = Route::Home;
                    }
                    Err(e) => self.notice = Some(e.to_string()),
                }
            }
            if ui.button("Browse without logging in").clicked() {
                self.route = Route::Home;
            }
        });
    }

    fn settings_view(&mut self, ui: &mut egui::Ui) {
        ui.heading("Settings");
        ui.add_space(8.0);
        labeled_row(ui, "API base URL", |ui| {
            ui.add(egui::TextEdit::singleline(&mut self.host_input).desired_width(320.0));
        });
        labeled_row(ui, "Timeout (s)", |ui| {
            ui.add(
                egui::DragValue::new(&mut self.timeout_input)
                    .clamp_range(1..=300)
                    .speed(1.0),
            );
        });
        labeled_row(ui, "Theme", |ui| {
            ui.horizontal(|ui| {
                if ui.selectable_label(self.settings.theme_dark, "Dark").clicked() {
                    self.settings.theme_dark = true;
                }
                if ui.selectable_label(!self.settings.theme_dark, "Light").clicked() {
                    self.settings.theme_dark = false;
                }
            });
        });
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("Apply").clicked() {
                self.persist_settings();
                self.reset_client();
            }
            if ui.small_button("Reset").clicked() {
                self.host_input = DEFAULT_API_BASE.to_string();
                self.timeout_input = settings::DEFAULT_TIMEOUT_SECS;
                self.persist_settings();
                self.reset_client();
            }
        });
        ui.add_space(8.0);
        ui.label(format!("Requests go to {}", self.api.base_url()));
    }

    fn central(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        match self.route.clone() {
            Route::Login => self.login_view(ui),
            Route::Settings => self.settings_view(ui),
            Route::Home => home_view(
                ui,
                self.pages.home.state(),
                self.pages.highlights.state(),
                actions,
            ),
            Route::Genres => genres_view(ui, self.pages.genres.state(), actions),
            Route::Schedule => schedule_view(ui, self.pages.schedule.state(), actions),
            Route::AnimeIndex => {
                index_view(ui, self.pages.index.state(), &mut self.index_filter, actions)
            }
            Route::Anime(_) => anime_view(ui, self.pages.anime.state(), actions),
            Route::Episode(_) => episode_view(ui, self.pages.episode.state(), actions),
            Route::History => history_view(ui, &self.history, actions),
            route => {
                if let Some(page) = self.pages.list_mut(&route) {
                    list_view(ui, page, actions);
                }
            }
        }
    }
}

impl eframe::App for AnistreamApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pages.poll();
        if self.session.take_login_redirect() {
            self.notice = Some("Signed out. Log in again to continue.".into());
            self.reset_client();
            self.route = Route::Login;
        }
        self.mount_route();
        self.record_history();

        let mut actions = Vec::new();
        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            self.top_bar(ui, &mut actions);
        });

        if self.settings.theme_dark != self.dark_applied {
            apply_style(ctx, self.settings.theme_dark);
            self.dark_applied = self.settings.theme_dark;
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(notice) = &self.notice {
                ui.colored_label(egui::Color32::YELLOW, notice);
            }
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| self.central(ui, &mut actions));
        });

        for action in actions {
            self.apply(action);
        }
    }
}

/// Spinner or error banner. Returns the payload when ready.
fn status<'a, T>(ui: &mut egui::Ui, state: &'a FetchState<T>, actions: &mut Vec<UiAction>) -> Option<&'a T> {
    match state {
        FetchState::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading...");
            });
            None
        }
        FetchState::Error(message) => {
            ui.colored_label(egui::Color32::RED, message);
            if ui.button("Reload").clicked() {
                actions.push(UiAction::Reload);
            }
            None
        }
        FetchState::Ready(value) => Some(value),
    }
}

fn card_grid(ui: &mut egui::Ui, cards: &[AnimeCard], actions: &mut Vec<UiAction>) {
    if cards.is_empty() {
        ui.label("Nothing to show.");
        return;
    }
    ui.horizontal_wrapped(|ui| {
        for card in cards {
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.set_width(CARD_WIDTH);
                ui.vertical(|ui| {
                    if ui.link(egui::RichText::new(&card.title).strong()).clicked()
                        && !card.anime_id.is_empty()
                    {
                        actions.push(UiAction::Navigate(Route::Anime(card.anime_id.clone())));
                    }
                    ui.horizontal(|ui| {
                        if let Some(kind) = &card.kind {
                            ui.small(kind);
                        }
                        ui.small(format!("★ {}", card.score_label()));
                    });
                    if let Some(status) = &card.status {
                        ui.small(status);
                    }
                    if let Some(eps) = &card.episodes {
                        ui.small(format!("Episodes: {eps}"));
                    }
                    if let Some(date) = card.latest_release_date.as_ref().or(card.release_day.as_ref()) {
                        ui.small(date);
                    }
                });
            });
        }
    });
}

fn pagination_bar(ui: &mut egui::Ui, page: &ListPage, actions: &mut Vec<UiAction>) {
    let current = page.current_page();
    let total = page.total_pages();
    ui.horizontal(|ui| {
        if ui.add_enabled(current > 1, egui::Button::new("Prev")).clicked() {
            actions.push(UiAction::GoToPage(current - 1));
        }
        for n in page.window() {
            if ui.selectable_label(n == current, n.to_string()).clicked() {
                actions.push(UiAction::GoToPage(n));
            }
        }
        if ui.add_enabled(current < total, egui::Button::new("Next")).clicked() {
            actions.push(UiAction::GoToPage(current + 1));
        }
        ui.label(format!("Page {current} of {total}"));
    });
}

fn list_view(ui: &mut egui::Ui, page: &ListPage, actions: &mut Vec<UiAction>) {
    let config = page.config();
    ui.heading(config.title);
    match page.filter() {
        Some(filter) => ui.label(format!("{}: {filter}", config.subtitle)),
        None => ui.label(config.subtitle),
    };
    ui.add_space(8.0);
    if !page.has_input() {
        ui.label("Type a title in the search box to start.");
        return;
    }
    if let Some(result) = status(ui, page.state(), actions) {
        card_grid(ui, &result.items, actions);
        if config.paginated {
            ui.add_space(12.0);
            pagination_bar(ui, page, actions);
        }
    }
}

fn home_view(
    ui: &mut egui::Ui,
    state: &FetchState<HomeFeed>,
    highlights: &FetchState<Vec<AnimeCard>>,
    actions: &mut Vec<UiAction>,
) {
    ui.heading("Home");
    let Some(feed) = status(ui, state, actions) else {
        return;
    };
    if let FetchState::Ready(cards) = highlights {
        if !cards.is_empty() {
            completed_strip(ui, cards, actions);
        }
    }
    let sections = [
        ("Recently updated", &feed.recent, Route::Recent),
        ("Batch", &feed.batch, Route::Batch),
        ("Movies", &feed.movies, Route::Movies),
    ];
    for (title, cards, route) in sections {
        ui.add_space(12.0);
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(title).heading());
            if ui.small_button("See all").clicked() {
                actions.push(UiAction::Navigate(route));
            }
        });
        card_grid(ui, cards, actions);
    }
}

/// Compact list of finished series with a link to the full page.
fn completed_strip(ui: &mut egui::Ui, cards: &[AnimeCard], actions: &mut Vec<UiAction>) {
    ui.add_space(12.0);
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Completed").strong());
            if ui.small_button("More").clicked() {
                actions.push(UiAction::Navigate(Route::Completed));
            }
        });
        ui.horizontal_wrapped(|ui| {
            for card in cards {
                if ui.link(&card.title).clicked() && !card.anime_id.is_empty() {
                    actions.push(UiAction::Navigate(Route::Anime(card.anime_id.clone())));
                }
            }
        });
    });
}

fn genres_view(ui: &mut egui::Ui, state: &FetchState<Vec<Genre>>, actions: &mut Vec<UiAction>) {
    ui.heading("Genres");
    let Some(genres) = status(ui, state, actions) else {
        return;
    };
    if genres.is_empty() {
        ui.label("No genres available.");
        return;
    }
    ui.horizontal_wrapped(|ui| {
        for genre in genres {
            if ui.button(&genre.title).clicked() && !genre.genre_id.is_empty() {
                actions.push(UiAction::Navigate(Route::Genre(genre.genre_id.clone())));
            }
        }
    });
}

fn schedule_view(
    ui: &mut egui::Ui,
    state: &FetchState<Vec<ScheduleDay>>,
    actions: &mut Vec<UiAction>,
) {
    ui.heading("Schedule");
    ui.label("Weekly release schedule");
    let Some(days) = status(ui, state, actions) else {
        return;
    };
    for day in days {
        ui.add_space(10.0);
        egui::CollapsingHeader::new(egui::RichText::new(&day.day).strong())
            .default_open(true)
            .show(ui, |ui| {
                egui::Grid::new(("schedule", day.day.as_str()))
                    .striped(true)
                    .show(ui, |ui| {
                        for anime in &day.anime_list {
                            if ui.link(&anime.title).clicked() && !anime.anime_id.is_empty() {
                                actions
                                    .push(UiAction::Navigate(Route::Anime(anime.anime_id.clone())));
                            }
                            ui.label(format!("★ {}", anime.score_label()));
                            ui.label(anime.estimation.as_deref().unwrap_or("-"));
                            ui.end_row();
                        }
                    });
            });
    }
}

fn index_view(
    ui: &mut egui::Ui,
    state: &FetchState<Vec<LetterGroup>>,
    filter: &mut String,
    actions: &mut Vec<UiAction>,
) {
    ui.heading("Anime A-Z");
    ui.add(
        egui::TextEdit::singleline(filter)
            .desired_width(260.0)
            .hint_text("Filter titles"),
    );
    let Some(groups) = status(ui, state, actions) else {
        return;
    };
    for (letter, titles) in filter_index(groups, filter) {
        ui.add_space(8.0);
        ui.label(egui::RichText::new(letter).heading());
        ui.horizontal_wrapped(|ui| {
            for anime in titles {
                if ui.link(&anime.title).clicked() && !anime.anime_id.is_empty() {
                    actions.push(UiAction::Navigate(Route::Anime(anime.anime_id.clone())));
                }
            }
        });
    }
}

/// Groups whose titles contain `needle` (case-insensitive); empty groups drop.
fn filter_index<'a>(groups: &'a [LetterGroup], needle: &str) -> Vec<(&'a str, Vec<&'a AnimeCard>)> {
    let needle = needle.trim().to_lowercase();
    groups
        .iter()
        .map(|g| {
            let titles: Vec<&AnimeCard> = g
                .anime_list
                .iter()
                .filter(|a| needle.is_empty() || a.title.to_lowercase().contains(&needle))
                .collect();
            (g.start_with.as_str(), titles)
        })
        .filter(|(_, titles)| !titles.is_empty())
        .collect()
}

fn anime_view(ui: &mut egui::Ui, state: &FetchState<AnimeDetail>, actions: &mut Vec<UiAction>) {
    let Some(anime) = status(ui, state, actions) else {
        return;
    };
    ui.heading(anime.display_title());
    if !anime.japanese.is_empty() && anime.japanese != anime.display_title() {
        ui.label(&anime.japanese);
    }
    ui.add_space(8.0);
    egui::Grid::new("anime-facts").num_columns(2).show(ui, |ui| {
        let score = match (&anime.score.value, &anime.score.users) {
            (Some(v), Some(u)) => format!("{v} ({u} users)"),
            (Some(v), None) => v.clone(),
            _ => "N/A".to_string(),
        };
        let facts = [
            ("Score", Some(score)),
            ("Status", anime.status.clone()),
            ("Type", anime.kind.clone()),
            ("Source", anime.source.clone()),
            ("Duration", anime.duration.clone()),
            ("Episodes", anime.episodes.clone()),
            ("Season", anime.season.clone()),
            ("Studio", anime.studios.clone()),
            ("Producers", anime.producers.clone()),
            ("Aired", anime.aired.clone()),
        ];
        for (label, value) in facts {
            ui.strong(label);
            ui.label(value.unwrap_or_else(|| "-".into()));
            ui.end_row();
        }
    });

    ui.add_space(8.0);
    ui.heading("Synopsis");
    if anime.synopsis.paragraphs.is_empty() {
        ui.label("No synopsis available.");
    }
    for p in &anime.synopsis.paragraphs {
        ui.label(p);
    }

    if !anime.genre_list.is_empty() {
        ui.add_space(8.0);
        ui.horizontal_wrapped(|ui| {
            for genre in &anime.genre_list {
                if ui.small_button(&genre.title).clicked() && !genre.genre_id.is_empty() {
                    actions.push(UiAction::Navigate(Route::Genre(genre.genre_id.clone())));
                }
            }
        });
    }

    if !anime.episode_list.is_empty() {
        ui.add_space(8.0);
        ui.heading("Episodes");
        ui.horizontal_wrapped(|ui| {
            for ep in &anime.episode_list {
                let label = ep.title.clone().unwrap_or_else(|| ep.episode_id.clone());
                if ui.button(format!("Episode {label}")).clicked() {
                    actions.push(UiAction::Navigate(Route::Episode(ep.episode_id.clone())));
                }
            }
        });
    }
}

fn episode_view(ui: &mut egui::Ui, state: &FetchState<EpisodeDetail>, actions: &mut Vec<UiAction>) {
    let Some(ep) = status(ui, state, actions) else {
        return;
    };
    ui.heading(&ep.title);
    ui.add_space(8.0);
    if let Some(url) = &ep.default_streaming_url {
        if ui.button("▶ Play in browser").clicked() {
            actions.push(UiAction::OpenExternal(url.clone()));
        }
    }
    ui.horizontal(|ui| {
        ui.label(format!("Duration: {}", ep.duration.as_deref().unwrap_or("N/A")));
        ui.label(format!("Status: {}", ep.status.as_deref().unwrap_or("N/A")));
        ui.label(format!(
            "Total downloads: {}",
            ep.download_count.as_deref().unwrap_or("N/A")
        ));
    });
    ui.horizontal(|ui| {
        let prev = ep.prev_id();
        if ui.add_enabled(prev.is_some(), egui::Button::new("Previous")).clicked() {
            if let Some(id) = prev {
                actions.push(UiAction::Navigate(Route::Episode(id.to_string())));
            }
        }
        let next = ep.next_id();
        if ui.add_enabled(next.is_some(), egui::Button::new("Next")).clicked() {
            if let Some(id) = next {
                actions.push(UiAction::Navigate(Route::Episode(id.to_string())));
            }
        }
    });

    let Some(downloads) = &ep.download_url else {
        return;
    };
    ui.add_space(12.0);
    ui.heading("Downloads");
    egui::Grid::new("downloads").striped(true).show(ui, |ui| {
        ui.strong("Quality");
        ui.strong("Size");
        ui.strong("Host");
        ui.end_row();
        for quality in &downloads.qualities {
            for link in &quality.urls {
                ui.label(&quality.title);
                ui.label(quality.size.as_deref().unwrap_or("-"));
                if ui.link(&link.title).clicked() && !link.url.is_empty() {
                    actions.push(UiAction::OpenExternal(link.url.clone()));
                }
                ui.end_row();
            }
        }
    });
}

fn history_view(ui: &mut egui::Ui, history: &WatchHistory, actions: &mut Vec<UiAction>) {
    ui.horizontal(|ui| {
        ui.heading("Watch history");
        if ui.small_button("Clear").clicked() {
            actions.push(UiAction::ClearHistory);
        }
    });
    let entries = history.entries();
    if entries.is_empty() {
        ui.label("Nothing watched yet.");
        return;
    }
    egui::Grid::new("history").striped(true).show(ui, |ui| {
        for entry in entries {
            if ui.link(&entry.title).clicked() {
                actions.push(UiAction::Navigate(Route::Episode(entry.episode_id.clone())));
            }
            let when = Local
                .timestamp_opt(entry.watched_at, 0)
                .single()
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            ui.label(when);
            ui.end_row();
        }
    });
}

fn labeled_row(ui: &mut egui::Ui, label: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    ui.columns(2, |columns| {
        columns[0].set_min_width(LABEL_COLUMN_WIDTH);
        columns[0].label(label);
        add_contents(&mut columns[1]);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(title: &str) -> AnimeCard {
        AnimeCard {
            title: title.into(),
            anime_id: title.to_lowercase(),
            ..AnimeCard::default()
        }
    }

    #[test]
    fn index_filter_is_case_insensitive_and_drops_empty_groups() {
        let groups = vec![
            LetterGroup {
                start_with: "B".into(),
                anime_list: vec![card("Bocchi the Rock"), card("Bleach")],
            },
            LetterGroup {
                start_with: "F".into(),
                anime_list: vec![card("Frieren")],
            },
        ];
        let hits = filter_index(&groups, "  ROCK ");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "B");
        assert_eq!(hits[0].1[0].title, "Bocchi the Rock");

        assert_eq!(filter_index(&groups, "").len(), 2);
    }

    #[test]
    fn theme_switch_keeps_widget_rounding() {
        let ctx = egui::Context::default();
        apply_style(&ctx, true);
        assert!(ctx.style().visuals.dark_mode);

        apply_style(&ctx, false);
        let style = ctx.style();
        assert!(!style.visuals.dark_mode);
        assert_eq!(style.visuals.widgets.inactive.rounding, egui::Rounding::same(6.0));
        assert_eq!(style.visuals.widgets.hovered.rounding, egui::Rounding::same(6.0));
        assert_eq!(style.spacing.item_spacing, egui::vec2(8.0, 8.0));
    }
}
