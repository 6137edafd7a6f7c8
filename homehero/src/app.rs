//! Application wiring: one session store, one identity provider and the two
//! clients, with the synchronizer running in the background.

use crate::api::HomeHeroApi;
use homehero_http::navigation::{ChannelNavigator, LOGIN_ROUTE};
use homehero_http::session::FileStorage;
use homehero_http::traits::{HttpTransport, IdentityProvider, TokenStorage};
use homehero_http::{
    guard_private_route, ApiClient, ClientConfig, Identity, LocalIdentityProvider, Redirect,
    RouteDecision, SessionStore, SessionSynchronizer, SessionTeardown, SyncState,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Longest wait for the synchronizer to settle after an auth transition.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub client: ClientConfig,
    pub session_file: PathBuf,
    pub login_route: String,
}

impl Settings {
    pub fn new(client: ClientConfig, session_file: impl Into<PathBuf>) -> Self {
        Settings {
            client,
            session_file: session_file.into(),
            login_route: LOGIN_ROUTE.to_string(),
        }
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }
}

pub struct HomeHero {
    pub api: HomeHeroApi,
    store: Arc<SessionStore>,
    identity: Arc<LocalIdentityProvider>,
    redirects: async_channel::Receiver<Redirect>,
    state: watch::Receiver<SyncState>,
    sync_task: JoinHandle<()>,
}

impl HomeHero {
    /// Build against the real network and wait for the restored session
    /// to settle.
    pub async fn start(settings: Settings) -> anyhow::Result<Self> {
        let client = ApiClient::new(settings.client.clone())?;
        Self::start_with_transport(settings, client.transport().clone()).await
    }

    pub async fn start_with_transport(
        settings: Settings,
        transport: Arc<dyn HttpTransport>,
    ) -> anyhow::Result<Self> {
        let storage: Arc<dyn TokenStorage> = Arc::new(FileStorage::new(&settings.session_file));
        let store = Arc::new(SessionStore::new(storage.clone()));
        let identity = Arc::new(LocalIdentityProvider::with_storage(storage).with_session(store.clone()));

        let (navigator, redirects) = ChannelNavigator::new();
        let teardown = Arc::new(
            SessionTeardown::new(store.clone(), identity.clone(), Arc::new(navigator))
                .with_login_route(settings.login_route.as_str()),
        );

        let secure = ApiClient::with_transport(settings.client.with_attach_token(true), transport)
            .with_session(store.clone(), teardown);
        let synchronizer = SessionSynchronizer::new(store.clone(), &secure);
        let (sync_task, state) = synchronizer.spawn(identity.subscribe());

        let app = HomeHero {
            api: HomeHeroApi::from_secure(secure),
            store,
            identity,
            redirects,
            state,
            sync_task,
        };
        Self::settle(app.state.clone(), |_| true).await?;
        info!(signed_in = app.current_user().is_some(), "HomeHero session ready");
        Ok(app)
    }

    /// Receiver that has seen the current state, so only later publishes
    /// count.
    fn fresh_watch(&self) -> watch::Receiver<SyncState> {
        let mut state = self.state.clone();
        state.mark_unchanged();
        state
    }

    /// Wait until the synchronizer publishes a state matching `done`.
    async fn settle<F>(mut state: watch::Receiver<SyncState>, done: F) -> anyhow::Result<SyncState>
    where
        F: Fn(&SyncState) -> bool,
    {
        let waited = tokio::time::timeout(SETTLE_TIMEOUT, async {
            loop {
                let current = state.borrow_and_update().clone();
                if !current.is_loading() && done(&current) {
                    return Ok::<_, watch::error::RecvError>(current);
                }
                state.changed().await?;
            }
        });
        match waited.await {
            Ok(Ok(state)) => Ok(state),
            Ok(Err(_)) => anyhow::bail!("session synchronizer stopped"),
            Err(_) => anyhow::bail!("timed out waiting for the session to settle"),
        }
    }

    /// Sign `identity` in and wait for the token exchange.
    pub async fn sign_in(&self, identity: Identity) -> anyhow::Result<SyncState> {
        let email = identity.email.clone();
        let state = self.fresh_watch();
        self.identity.sign_in(identity)?;
        Self::settle_changed(state, |s| s.identity().is_some_and(|i| i.email == email)).await
    }

    /// Create the account, sign it in and wait for the token exchange.
    pub async fn register(&self, identity: Identity) -> anyhow::Result<SyncState> {
        let email = identity.email.clone();
        let state = self.fresh_watch();
        self.identity.register(identity)?;
        Self::settle_changed(state, |s| s.identity().is_some_and(|i| i.email == email)).await
    }

    pub async fn sign_out(&self) -> anyhow::Result<()> {
        if matches!(self.state(), SyncState::SignedOut) {
            debug!("Sign-out requested with nobody signed in");
            return Ok(());
        }
        let state = self.fresh_watch();
        self.identity.sign_out().await?;
        Self::settle_changed(state, |s| matches!(s, SyncState::SignedOut)).await?;
        Ok(())
    }

    /// Like [`settle`](Self::settle), ignoring the value seen on entry.
    async fn settle_changed<F>(mut state: watch::Receiver<SyncState>, done: F) -> anyhow::Result<SyncState>
    where
        F: Fn(&SyncState) -> bool,
    {
        if tokio::time::timeout(SETTLE_TIMEOUT, state.changed()).await.is_err() {
            anyhow::bail!("timed out waiting for the session to settle");
        }
        Self::settle(state, done).await
    }

    pub fn update_profile(&self, name: Option<String>, photo: Option<String>) -> anyhow::Result<Identity> {
        Ok(self.identity.update_profile(name, photo)?)
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.identity.current_user()
    }

    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Gate a private location on the current session.
    pub fn guard(&self, location: &str) -> RouteDecision {
        guard_private_route(&self.state.borrow(), location)
    }

    /// Next pending redirect raised by a session teardown.
    pub fn take_redirect(&self) -> Option<Redirect> {
        self.redirects.try_recv().ok()
    }

    /// Signed-in identity, or the redirect to the login page.
    pub fn require_user(&self, location: &str) -> Result<Identity, Redirect> {
        match self.guard(location) {
            RouteDecision::Allow => self
                .state()
                .identity()
                .cloned()
                .ok_or_else(|| Redirect::login().with_return_to(location)),
            RouteDecision::Redirect(redirect) => Err(redirect),
            RouteDecision::Loading => Err(Redirect::login().with_return_to(location)),
        }
    }

    /// Close the identity subscription and let the synchronizer drain.
    pub async fn shutdown(self) {
        let HomeHero { api, identity, sync_task, .. } = self;
        drop(api);
        drop(identity);
        if tokio::time::timeout(Duration::from_secs(5), sync_task).await.is_err() {
            debug!("Session synchronizer still busy at shutdown");
        }
    }
}
