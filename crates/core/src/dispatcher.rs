//! Query dispatcher.
//!
//! [`QueryDispatcher`] is a cloneable handle to a single actor task that owns
//! the [`SearchSession`]. Typed text is debounced, explicit searches and
//! page requests are dispatched immediately, and every dispatch supersedes
//! the one before it: the older fetch task is aborted and its ticket
//! cancelled, so a late completion is discarded without touching the session
//! or the cache.
//!
//! State is published through a `watch` channel; callers read the latest
//! [`SessionSnapshot`] or subscribe to changes.

use crate::cache::{CacheEntry, ResultStore};
use crate::cancel::{FetchTicket, TicketIssuer};
use crate::config::AppConfig;
use crate::error::{Error, FetchError};
use crate::favorites::{FavoriteIndex, Subscription};
use crate::fetch::{Page, ResultFetcher};
use crate::home::{HomeFeed, HomeSections};
use crate::model::QueryKey;
use crate::session::{FailurePolicy, SearchSession, SessionSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Timing knobs for the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub debounce: Duration,
    pub load_more_threshold: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for DispatcherConfig {
    fn from(config: &AppConfig) -> Self {
        Self { debounce: config.debounce(), load_more_threshold: config.load_more_threshold }
    }
}

enum Command {
    SetQueryText(String),
    Search(String),
    LoadMore(i64),
    Retry,
    LoadHome,
    /// Replies with the current generation once every earlier command is handled.
    Barrier(oneshot::Sender<u64>),
}

enum Event {
    Completed(Completion),
    HomeLoaded(HomeSections),
    FavoritesChanged,
}

struct Completion {
    ticket: FetchTicket,
    query: String,
    page: u32,
    result: Result<Page, FetchError>,
}

/// Handle to the dispatcher task.
///
/// The task runs until every handle is dropped. `spawn` must be called from
/// within a Tokio runtime.
#[derive(Clone)]
pub struct QueryDispatcher {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    home: watch::Receiver<HomeSections>,
    store: Arc<dyn ResultStore>,
}

impl QueryDispatcher {
    pub fn spawn(
        fetcher: Arc<dyn ResultFetcher>, store: Arc<dyn ResultStore>, favorites: Arc<dyn FavoriteIndex>,
        home_feed: HomeFeed, config: DispatcherConfig,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
        let (home_tx, home_rx) = watch::channel(HomeSections::default());

        let notify = event_tx.clone();
        let favorites_subscription = favorites.subscribe(Arc::new(move || {
            let _ = notify.send(Event::FavoritesChanged);
        }));

        let worker = Worker {
            fetcher,
            store: store.clone(),
            favorites,
            home_feed,
            config,
            session: SearchSession::new(),
            tickets: TicketIssuer::new(),
            in_flight: None,
            pending_text: None,
            deadline: None,
            last_dispatched: None,
            home_loading: false,
            events: event_tx,
            snapshot_tx,
            home_tx,
            _favorites_subscription: favorites_subscription,
        };
        tokio::spawn(worker.run(command_rx, event_rx));

        Self { commands: command_tx, snapshots: snapshot_rx, home: home_rx, store }
    }

    /// Record typed text. A search is dispatched once the text has been
    /// stable for the debounce interval; blank text returns the session to
    /// idle.
    pub fn set_query_text(&self, text: impl Into<String>) -> Result<(), Error> {
        self.send(Command::SetQueryText(text.into()))
    }

    /// Dispatch a search for `query` at page 1 without waiting for the
    /// debounce interval.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for a blank query.
    pub fn search(&self, query: &str) -> Result<(), Error> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("search query must not be empty".into()));
        }
        self.send(Command::Search(query.to_string()))
    }

    /// Request the next page if `last_visible_id` is near the end of the
    /// aggregated items. Does nothing otherwise.
    pub fn load_more_if_needed(&self, last_visible_id: i64) -> Result<(), Error> {
        self.send(Command::LoadMore(last_visible_id))
    }

    /// Re-issue the current query at page 1, or load the home sections when
    /// there is no query.
    pub fn retry(&self) -> Result<(), Error> {
        self.send(Command::Retry)
    }

    /// Load any home category not loaded yet.
    pub fn load_home_content(&self) -> Result<(), Error> {
        self.send(Command::LoadHome)
    }

    /// Remove every cached entry. Returns how many entries were removed.
    pub async fn clear_cache(&self) -> Result<u64, Error> {
        self.store.clear().await
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn home(&self) -> HomeSections {
        self.home.borrow().clone()
    }

    pub fn subscribe_home(&self) -> watch::Receiver<HomeSections> {
        self.home.clone()
    }

    /// Wait until every command sent so far is handled and the fetch it
    /// started (if any) has settled, then return the snapshot.
    ///
    /// Pending debounced text is not forced.
    pub async fn settled(&self) -> Result<SessionSnapshot, Error> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.send(Command::Barrier(ack_tx))?;
        let generation = ack_rx.await.map_err(|_| Error::DispatcherClosed)?;

        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(|s| s.generation >= generation && !s.is_in_flight())
            .await
            .map_err(|_| Error::DispatcherClosed)?;
        Ok(snapshot.clone())
    }

    fn send(&self, command: Command) -> Result<(), Error> {
        self.commands.send(command).map_err(|_| Error::DispatcherClosed)
    }
}

struct Worker {
    fetcher: Arc<dyn ResultFetcher>,
    store: Arc<dyn ResultStore>,
    favorites: Arc<dyn FavoriteIndex>,
    home_feed: HomeFeed,
    config: DispatcherConfig,
    session: SearchSession,
    tickets: TicketIssuer,
    in_flight: Option<JoinHandle<()>>,
    pending_text: Option<String>,
    deadline: Option<Instant>,
    /// Normalized text of the last debounced dispatch (or clear).
    last_dispatched: Option<QueryKey>,
    home_loading: bool,
    events: mpsc::UnboundedSender<Event>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    home_tx: watch::Sender<HomeSections>,
    _favorites_subscription: Subscription,
}

impl Worker {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>, mut events: mpsc::UnboundedReceiver<Event>) {
        tracing::debug!("query dispatcher started");

        loop {
            let deadline = self.deadline;
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = events.recv() => self.handle_event(event).await,
                () = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.flush_pending_text();
                }
            }
        }

        self.cancel_in_flight();
        tracing::debug!("query dispatcher stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SetQueryText(text) => {
                self.pending_text = Some(text);
                self.deadline = Some(Instant::now() + self.config.debounce);
            }
            Command::Search(query) => {
                self.pending_text = None;
                self.deadline = None;
                self.last_dispatched = Some(QueryKey::new(&query));
                self.start_search(query);
            }
            Command::LoadMore(last_visible_id) => self.load_more(last_visible_id),
            Command::Retry => match self.session.current_query() {
                Some(query) => {
                    let query = query.to_string();
                    self.start_search(query);
                }
                None => self.load_home(),
            },
            Command::LoadHome => self.load_home(),
            Command::Barrier(ack) => {
                let _ = ack.send(self.tickets.generation());
            }
        }
    }

    async fn handle_event(&mut self, event: Event) {
        match event {
            Event::Completed(completion) => self.complete(completion).await,
            Event::HomeLoaded(sections) => {
                self.home_loading = false;
                self.home_tx.send_replace(sections);
            }
            Event::FavoritesChanged => self.publish(),
        }
    }

    fn flush_pending_text(&mut self) {
        self.deadline = None;
        let Some(text) = self.pending_text.take() else {
            return;
        };

        let key = QueryKey::new(&text);
        if self.last_dispatched.as_ref() == Some(&key) {
            tracing::debug!(query = %key, "suppressing duplicate query");
            return;
        }
        self.last_dispatched = Some(key.clone());

        if key.is_empty() {
            self.cancel_in_flight();
            self.session.reset();
            self.publish();
        } else {
            self.start_search(text.trim().to_string());
        }
    }

    fn start_search(&mut self, query: String) {
        self.session.begin_search(&query);
        self.dispatch(query, 1);
        self.publish();
    }

    fn load_more(&mut self, last_visible_id: i64) {
        let Some(next_page) = self.session.next_page_for(last_visible_id, self.config.load_more_threshold) else {
            return;
        };
        let Some(query) = self.session.current_query().map(str::to_string) else {
            return;
        };

        self.session.begin_next_page();
        self.dispatch(query, next_page);
        self.publish();
    }

    fn dispatch(&mut self, query: String, page: u32) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        let ticket = self.tickets.issue();
        tracing::debug!(query = %query, page, generation = ticket.generation, "dispatching fetch");

        let fetcher = self.fetcher.clone();
        let events = self.events.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let result = fetcher.search(&query, page).await;
            if ticket.token.is_cancelled() {
                return;
            }
            let _ = events.send(Event::Completed(Completion { ticket, query, page, result }));
        }));
    }

    fn cancel_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.tickets.cancel_current();
    }

    async fn complete(&mut self, completion: Completion) {
        let Completion { ticket, query, page, result } = completion;
        if !self.tickets.is_current(&ticket) {
            tracing::debug!(query = %query, page, generation = ticket.generation, "discarding superseded fetch");
            return;
        }
        self.tickets.settle(&ticket);
        self.in_flight = None;

        match result {
            Ok(fetched) => {
                if let Err(e) = self.store.save_results(&query, &fetched.items, page, fetched.total_pages).await {
                    tracing::warn!(query = %query, page, "failed to cache results: {}", e);
                }
                self.session.apply_page(page, fetched);
            }
            Err(error) => {
                tracing::debug!(query = %query, page, error = %error, "fetch failed");
                match FailurePolicy::for_failure(&error, page) {
                    FailurePolicy::FallbackToCache => match self.cached_entry(&query).await {
                        Ok(entry) => {
                            tracing::info!(query = %query, "serving cached results after failed fetch");
                            self.session.apply_cached(entry);
                        }
                        Err(e) => {
                            tracing::debug!(query = %query, "no cache fallback: {}", e);
                            self.session.apply_failure(error);
                        }
                    },
                    FailurePolicy::Surface => self.session.apply_failure(error),
                }
            }
        }

        self.publish();
    }

    async fn cached_entry(&self, query: &str) -> Result<CacheEntry, Error> {
        self.store
            .get_results(query)
            .await?
            .ok_or_else(|| Error::CacheMiss(QueryKey::new(query).to_string()))
    }

    fn load_home(&mut self) {
        if self.home_loading {
            return;
        }
        self.home_loading = true;

        let feed = self.home_feed.clone();
        let existing = self.home_tx.borrow().clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let sections = feed.load(&existing).await;
            let _ = events.send(Event::HomeLoaded(sections));
        });
    }

    fn publish(&self) {
        let favorites = &self.favorites;
        let mut snapshot = self.session.snapshot(|id| favorites.is_favorite(id));
        snapshot.generation = self.tickets.generation();
        self.snapshot_tx.send_replace(snapshot);
    }
}
