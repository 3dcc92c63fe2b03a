// src/app/mod.rs: session-gated movie browser with listing, detail and favorites pages

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use eframe::egui as eg;
use tracing::{info, warn};

pub mod browse;
pub mod cache;
pub mod detail;
pub mod fetch;
pub mod gfx;
pub mod notify;
pub mod prefetch;
pub mod prefs;
pub mod search;
pub mod session;
pub mod storage;
pub mod store;
pub mod tmdb;
pub mod types;
pub mod ui;
pub mod users;
pub mod utils;

use crate::app::browse::{BrowseState, Listing};
use crate::app::cache::PosterCache;
use crate::app::detail::DetailState;
use crate::app::fetch::{FetchMsg, Fetcher};
use crate::app::notify::Toasts;
use crate::app::prefetch::PosterLoader;
use crate::app::search::Debouncer;
use crate::app::session::{gate, AuthSync, Gate, Route, SessionManager, SessionStatus};
use crate::app::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::app::store::{FavoriteToggle, Store};
use crate::app::tmdb::{ApiError, ImageUrls, MovieSource, TmdbClient};
use crate::app::types::Movie;
use crate::app::users::{RegistrationForm, UserDirectory};
use crate::config::{AppConfig, UserStoreKind};

// ---- Tunables ----
const MAX_FETCH_MSGS_PER_FRAME: usize = 16;
const IDLE_REPAINT: Duration = Duration::from_millis(250);

/// Text fields behind the login and register pages.
#[derive(Default)]
pub(crate) struct AuthForms {
    pub login_email: String,
    pub login_password: String,
    pub login_error: Option<String>,
    pub register: RegistrationForm,
    pub register_error: Option<String>,
}

pub struct CinedexApp {
    config: AppConfig,

    // state
    store: Store,
    users: UserDirectory,
    session: SessionManager,
    auth_sync: AuthSync,
    route: Route,

    // remote
    images: ImageUrls,
    fetcher: Fetcher,
    posters: PosterLoader,

    // pages
    search_text: String,
    debouncer: Debouncer,
    browse: BrowseState,
    browse_started: bool,
    detail: Option<DetailState>,
    forms: AuthForms,
    toasts: Toasts,

    // one-time init guard
    did_init: bool,
    applied_dark: Option<bool>,
}

fn open_file_store(cfg: &AppConfig) -> Box<dyn KeyValueStore> {
    let dir = cfg.cache_dir_path().join("state");
    match FileStore::open(&dir) {
        Ok(fs) => Box::new(fs),
        Err(e) => {
            warn!(
                "cannot open state dir {} ({e}); preferences will not survive a restart",
                dir.display()
            );
            Box::new(MemoryStore::new())
        }
    }
}

impl CinedexApp {
    pub fn new(config: AppConfig) -> Result<Self, ApiError> {
        let source: Arc<dyn MovieSource> = Arc::new(TmdbClient::from_config(&config)?);
        let state_store = open_file_store(&config);
        let user_store: Box<dyn KeyValueStore> = match config.user_store {
            UserStoreKind::File => open_file_store(&config),
            UserStoreKind::Memory => Box::new(MemoryStore::new()),
        };
        info!(
            "state under {}, demo users kept in {:?} store",
            config.cache_dir_path().display(),
            config.user_store
        );
        Ok(Self::with_parts(config, source, state_store, user_store))
    }

    /// Assemble from explicit collaborators.
    pub fn with_parts(
        config: AppConfig,
        source: Arc<dyn MovieSource>,
        state_store: Box<dyn KeyValueStore>,
        user_store: Box<dyn KeyValueStore>,
    ) -> Self {
        let posters = PosterLoader::start(
            PosterCache::open(&config.cache_dir_path()),
            config.poster_workers,
            Duration::from_secs(config.request_timeout_secs),
        );
        Self {
            images: ImageUrls::from_config(&config),
            debouncer: Debouncer::new(Duration::from_millis(config.search_debounce_ms)),
            store: Store::new(state_store),
            users: UserDirectory::open(user_store),
            session: SessionManager::new(),
            auth_sync: AuthSync::default(),
            route: Route::Home,
            fetcher: Fetcher::new(source),
            posters,
            search_text: String::new(),
            browse: BrowseState::new(),
            browse_started: false,
            detail: None,
            forms: AuthForms::default(),
            toasts: Toasts::default(),
            did_init: false,
            applied_dark: None,
            config,
        }
    }

    /// Startup hydration: theme, favorites, then the stored session.
    pub fn hydrate(&mut self, system_prefers_dark: bool) {
        self.store.initialize_theme(system_prefers_dark);
        self.store.initialize_favorites();
        self.session.restore(self.store.storage_mut(), Utc::now());
        self.auth_sync.sync(&self.session, &mut self.store);
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn session_status(&self) -> SessionStatus {
        self.session.status()
    }

    // ---- navigation ----
    pub fn navigate(&mut self, route: Route) {
        match &route {
            Route::Movie(id) => {
                let reusable = self
                    .detail
                    .as_ref()
                    .is_some_and(|d| d.id() == id && !d.has_failure());
                if !reusable {
                    self.load_detail(id);
                }
            }
            Route::Home => self.ensure_browse(),
            Route::Login => self.forms.login_error = None,
            Route::Register => self.forms.register_error = None,
            Route::Favorites => {}
        }
        self.route = route;
    }

    fn load_detail(&mut self, id: &str) {
        self.detail = Some(DetailState::new(id));
        self.fetcher.request_detail(id);
    }

    /// Re-issue all three detail fetches for the movie on screen.
    pub(crate) fn retry_detail(&mut self) {
        if let Some(id) = self.detail.as_ref().map(|d| d.id().to_string()) {
            self.load_detail(&id);
        }
    }

    fn ensure_browse(&mut self) {
        if !self.browse_started {
            self.browse_started = true;
            let req = self.browse.reset(Listing::Popular);
            self.fetcher.request_page(req);
        }
    }

    // ---- listing ----
    pub(crate) fn on_search_input(&mut self) {
        self.debouncer.input(&self.search_text, Instant::now());
    }

    pub(crate) fn run_query(&mut self, query: &str) {
        self.browse_started = true;
        let req = self.browse.reset(Listing::from_query(query));
        self.fetcher.request_page(req);
    }

    pub(crate) fn load_more(&mut self) {
        if let Some(req) = self.browse.load_more() {
            self.fetcher.request_page(req);
        }
    }

    pub(crate) fn retry_listing(&mut self) {
        if let Some(req) = self.browse.retry() {
            self.fetcher.request_page(req);
        }
    }

    // ---- favorites ----
    pub(crate) fn toggle_favorite(&mut self, movie: &Movie) {
        match self.store.toggle_favorite(movie) {
            FavoriteToggle::Added => self.toasts.success("Added to favorites"),
            FavoriteToggle::Removed => self.toasts.info("Removed from favorites"),
        }
    }

    // ---- auth ----
    pub(crate) fn submit_login(&mut self) {
        self.store.login_start();
        let result = self.session.sign_in(
            &self.users,
            self.store.storage_mut(),
            &self.forms.login_email,
            &self.forms.login_password,
            Utc::now(),
        );
        self.forms.login_password.clear();
        match result {
            Ok(()) => {
                self.forms.login_error = None;
                self.toasts.success("Login successful!");
                self.auth_sync.sync(&self.session, &mut self.store);
                self.navigate(Route::Home);
            }
            Err(e) => {
                self.store.login_failure(e.to_string());
                self.toasts.error(e.to_string());
                self.forms.login_error = Some(e.to_string());
            }
        }
    }

    pub(crate) fn submit_register(&mut self) {
        match self.users.register(&self.forms.register) {
            Ok(_) => {
                self.forms.login_email = self.forms.register.email.trim().to_string();
                self.forms.register = RegistrationForm::default();
                self.toasts.success("Registration successful! Please log in.");
                self.navigate(Route::Login);
            }
            Err(e) => {
                warn!("registration failed: {e}");
                self.forms.register_error = Some(e.to_string());
            }
        }
    }

    pub(crate) fn logout(&mut self) {
        self.session.sign_out(self.store.storage_mut());
        self.store.logout();
        self.navigate(Route::Login);
    }

    // ---- background results ----
    fn handle_fetch(&mut self, msg: FetchMsg) {
        match msg {
            FetchMsg::Page { req, result } => {
                let missing_key = matches!(result, Err(ApiError::MissingApiKey));
                if self.browse.apply(&req, result) && missing_key {
                    self.toasts.error("No TMDB API key configured");
                }
            }
            FetchMsg::Detail { id, part } => {
                if let Some(d) = self.detail.as_mut() {
                    d.apply(&id, part);
                }
            }
        }
    }

    /// Per-frame bookkeeping that does not draw anything.
    fn tick(&mut self, now: Instant) {
        self.session
            .expire_if_needed(self.store.storage_mut(), Utc::now());
        self.auth_sync.sync(&self.session, &mut self.store);

        for msg in self.fetcher.drain(MAX_FETCH_MSGS_PER_FRAME) {
            self.handle_fetch(msg);
        }
        self.posters.poll();

        if let Some(query) = self.debouncer.poll(now) {
            self.run_query(&query);
        }

        if let Gate::Redirect(to) = gate(self.session.status(), &self.route) {
            self.navigate(to);
        }
    }

    fn apply_theme(&mut self, ctx: &eg::Context) {
        let dark = self.store.is_dark();
        if self.applied_dark != Some(dark) {
            self.applied_dark = Some(dark);
            ctx.set_visuals(if dark {
                eg::Visuals::dark()
            } else {
                eg::Visuals::light()
            });
        }
    }

    fn schedule_repaint(&mut self, ctx: &eg::Context, now: Instant) {
        let mut next = self.toasts.prune(now);
        if let Some(d) = self.debouncer.next_deadline() {
            next = Some(next.map_or(d, |n| n.min(d)));
        }
        if let Some(at) = next {
            ctx.request_repaint_after(at.saturating_duration_since(now));
        }
        if self.posters.has_pending() || self.browse.is_loading() {
            ctx.request_repaint_after(IDLE_REPAINT);
        }
    }
}

// ========== App impl ==========
impl eframe::App for CinedexApp {
    fn update(&mut self, ctx: &eg::Context, _frame: &mut eframe::Frame) {
        // First frame
        if !self.did_init {
            self.did_init = true;
            self.fetcher.set_repaint(ctx.clone());
            let system_dark = ctx.style().visuals.dark_mode;
            self.hydrate(system_dark);
            info!(
                "started; api key configured: {}",
                self.config.has_api_key()
            );
        }

        let now = Instant::now();
        self.tick(now);
        self.apply_theme(ctx);
        self.ui_root(ctx);
        self.schedule_repaint(ctx, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::app::fetch::tests::FakeSource;
    use crate::app::notify::ToastKind;
    use crate::app::types::{Credits, MovieDetails, MoviePage};
    use crate::app::storage::KEY_SESSION;
    use crate::app::users::{DEMO_EMAIL, DEMO_PASSWORD};

    /// Details always fail; counts how often they were asked for.
    #[derive(Default)]
    struct FlakyDetails {
        details_calls: AtomicUsize,
    }

    impl MovieSource for FlakyDetails {
        fn popular(&self, page: u32) -> Result<MoviePage, ApiError> {
            FakeSource.popular(page)
        }

        fn search(&self, query: &str, page: u32) -> Result<MoviePage, ApiError> {
            FakeSource.search(query, page)
        }

        fn details(&self, _id: &str) -> Result<MovieDetails, ApiError> {
            self.details_calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::Network("timed out".into()))
        }

        fn similar(&self, id: &str) -> Result<MoviePage, ApiError> {
            FakeSource.similar(id)
        }

        fn credits(&self, id: &str) -> Result<Credits, ApiError> {
            FakeSource.credits(id)
        }
    }

    fn app_with(state: MemoryStore) -> (CinedexApp, tempfile::TempDir) {
        app_with_source(state, Arc::new(FakeSource))
    }

    fn app_with_source(
        state: MemoryStore,
        source: Arc<dyn MovieSource>,
    ) -> (CinedexApp, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = AppConfig {
            cache_dir: Some(tmp.path().to_string_lossy().into_owned()),
            poster_workers: 1,
            ..AppConfig::default()
        };
        let app = CinedexApp::with_parts(
            cfg,
            source,
            Box::new(state),
            Box::new(MemoryStore::new()),
        );
        (app, tmp)
    }

    fn pump_until(app: &mut CinedexApp, done: impl Fn(&CinedexApp) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(app) && Instant::now() < deadline {
            app.tick(Instant::now());
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(done(app), "condition not reached in time");
    }

    fn login(app: &mut CinedexApp) {
        app.forms.login_email = DEMO_EMAIL.into();
        app.forms.login_password = DEMO_PASSWORD.into();
        app.submit_login();
    }

    #[test]
    fn signed_out_user_is_redirected_to_login() {
        let (mut app, _tmp) = app_with(MemoryStore::new());
        assert_eq!(gate(app.session_status(), app.route()), Gate::Placeholder);
        app.hydrate(false);
        app.tick(Instant::now());
        assert_eq!(app.route(), &Route::Login);
    }

    #[test]
    fn login_loads_popular_listing_and_mirrors_user() {
        let (mut app, _tmp) = app_with(MemoryStore::new());
        app.hydrate(false);
        login(&mut app);

        assert_eq!(app.route(), &Route::Home);
        let auth = &app.store().state().auth;
        assert!(auth.is_authenticated);
        assert_eq!(auth.user.as_ref().unwrap().email, DEMO_EMAIL);
        assert!(app.forms.login_password.is_empty());
        let toast = app.toasts.items().last().unwrap();
        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(toast.text, "Login successful!");

        pump_until(&mut app, |a| !a.browse.movies().is_empty());
        assert_eq!(app.browse.heading(), "Popular Movies");
        assert_eq!(app.browse.movies()[0].id, "p1");

        app.load_more();
        pump_until(&mut app, |a| a.browse.movies().len() == 2);
        assert_eq!(app.browse.movies()[1].id, "p2");
        assert!(!app.browse.has_more());
    }

    #[test]
    fn wrong_password_records_failure() {
        let (mut app, _tmp) = app_with(MemoryStore::new());
        app.hydrate(false);
        app.forms.login_email = DEMO_EMAIL.into();
        app.forms.login_password = "nope".into();
        app.submit_login();
        assert_eq!(app.forms.login_error.as_deref(), Some("Invalid email or password"));
        let auth = &app.store().state().auth;
        assert!(!auth.is_authenticated);
        assert!(!auth.loading);

        let toast = app.toasts.items().last().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.text, "Invalid email or password");
    }

    #[test]
    fn session_survives_restart() {
        let state = MemoryStore::new();
        {
            let (mut app, _tmp) = app_with(state.clone());
            app.hydrate(false);
            login(&mut app);
        }
        assert!(state.get(KEY_SESSION).is_some());

        let (mut app, _tmp) = app_with(state);
        app.hydrate(false);
        assert_eq!(app.session_status(), SessionStatus::Authenticated);
        assert!(app.store().state().auth.is_authenticated);
    }

    #[test]
    fn register_then_sign_in_with_new_account() {
        let (mut app, _tmp) = app_with(MemoryStore::new());
        app.hydrate(false);
        app.navigate(Route::Register);
        app.forms.register = RegistrationForm {
            name: "Grace".into(),
            email: "grace@example.com".into(),
            password: "hopper1".into(),
            confirm_password: "hopper1".into(),
        };
        app.submit_register();
        assert_eq!(app.route(), &Route::Login);
        assert_eq!(
            app.toasts.items()[0].text,
            "Registration successful! Please log in."
        );

        app.forms.login_password = "hopper1".into();
        app.submit_login();
        assert_eq!(app.route(), &Route::Home);
        assert_eq!(app.store().state().auth.user.as_ref().unwrap().name, "Grace");
    }

    #[test]
    fn duplicate_registration_stays_on_page() {
        let (mut app, _tmp) = app_with(MemoryStore::new());
        app.hydrate(false);
        app.navigate(Route::Register);
        app.forms.register = RegistrationForm {
            name: "Someone".into(),
            email: DEMO_EMAIL.into(),
            password: "pw".into(),
            confirm_password: "pw".into(),
        };
        app.submit_register();
        assert_eq!(app.route(), &Route::Register);
        assert!(app.forms.register_error.is_some());
    }

    #[test]
    fn search_replaces_listing() {
        let (mut app, _tmp) = app_with(MemoryStore::new());
        app.hydrate(false);
        login(&mut app);
        app.run_query("batman");
        pump_until(&mut app, |a| {
            a.browse.movies().first().map(|m| m.title.as_str()) == Some("batman")
        });
        assert_eq!(app.browse.heading(), "Search Results for \"batman\"");
    }

    #[test]
    fn favorite_toggle_notifies_both_ways() {
        let (mut app, _tmp) = app_with(MemoryStore::new());
        let m = crate::app::fetch::tests::movie("9", "Nine");
        app.toggle_favorite(&m);
        app.toggle_favorite(&m);
        let texts: Vec<_> = app.toasts.items().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["Added to favorites", "Removed from favorites"]);
        assert!(app.store().favorites().is_empty());
    }

    #[test]
    fn detail_page_tolerates_credit_failure() {
        let (mut app, _tmp) = app_with(MemoryStore::new());
        app.hydrate(false);
        login(&mut app);
        app.navigate(Route::Movie("42".into()));
        pump_until(&mut app, |a| {
            a.detail
                .as_ref()
                .is_some_and(|d| !d.credits().is_loading() && !d.details().is_loading())
        });
        let d = app.detail.as_ref().unwrap();
        assert_eq!(d.details().ready().unwrap().title, "Fake");
        assert!(!d.not_found());
    }

    #[test]
    fn missing_movie_is_not_found() {
        let (mut app, _tmp) = app_with(MemoryStore::new());
        app.hydrate(false);
        login(&mut app);
        app.navigate(Route::Movie("missing".into()));
        pump_until(&mut app, |a| a.detail.as_ref().is_some_and(DetailState::not_found));
    }

    #[test]
    fn failed_detail_is_fetched_again_on_return_and_retry() {
        let source = Arc::new(FlakyDetails::default());
        let (mut app, _tmp) = app_with_source(MemoryStore::new(), source.clone());
        app.hydrate(false);
        login(&mut app);

        app.navigate(Route::Movie("7".into()));
        pump_until(&mut app, |a| a.detail.as_ref().is_some_and(DetailState::not_found));
        assert_eq!(source.details_calls.load(Ordering::SeqCst), 1);

        app.navigate(Route::Home);
        app.navigate(Route::Movie("7".into()));
        assert!(app.detail.as_ref().is_some_and(|d| d.details().is_loading()));
        pump_until(&mut app, |a| a.detail.as_ref().is_some_and(DetailState::not_found));
        assert_eq!(source.details_calls.load(Ordering::SeqCst), 2);

        app.retry_detail();
        pump_until(&mut app, |a| a.detail.as_ref().is_some_and(DetailState::not_found));
        assert_eq!(source.details_calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn logout_clears_session_and_shadow() {
        let state = MemoryStore::new();
        let (mut app, _tmp) = app_with(state.clone());
        app.hydrate(false);
        login(&mut app);
        app.logout();
        assert_eq!(app.route(), &Route::Login);
        assert!(!app.store().state().auth.is_authenticated);
        assert!(state.get(KEY_SESSION).is_none());
    }
}
