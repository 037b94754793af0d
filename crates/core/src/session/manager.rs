//! Session manager with single-flight refresh
//!
//! Owns the credential store, the refresh port, and the one piece of shared
//! mutable state in the client: the refresh slot. Every request that sees a
//! 401 while a refresh is outstanding awaits that same refresh.
//!
//! The refresh itself runs in a spawned task so a caller that gives up on
//! its request does not cancel a refresh other requests depend on.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use marketlink_domain::{
    CredentialPair, MarketLinkError, Result, SessionConfig, StoredSession, UserRecord,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::ports::{CredentialStore, Navigator, TokenRefresher};

type SharedRefresh = Shared<BoxFuture<'static, Result<CredentialPair>>>;

struct InFlight {
    generation: u64,
    replaced: Option<String>,
    outcome: SharedRefresh,
}

/// Outcome of the most recent refresh, keyed by the access token it replaced
struct Settled {
    replaced: Option<String>,
    outcome: Result<CredentialPair>,
}

#[derive(Default)]
struct RefreshSlot {
    next_generation: u64,
    in_flight: Option<InFlight>,
    last: Option<Settled>,
}

/// What a 401 resolves to once the slot has been inspected
enum Joined {
    Pending(SharedRefresh),
    Settled(Result<CredentialPair>),
    NoRefreshToken,
}

/// How a request that received a 401 should proceed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Renewal {
    /// Re-issue the request once with this access token
    Retry { access_token: String },
    /// No refresh token was stored; the session has been cleared and the
    /// original response stands
    SignedOut,
}

/// Explicit, process-wide owner of session state
///
/// Construct once and share via `Arc`.
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
    navigator: Option<Arc<dyn Navigator>>,
    config: SessionConfig,
    slot: Arc<Mutex<RefreshSlot>>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            refresher,
            navigator: None,
            config,
            slot: Arc::new(Mutex::new(RefreshSlot::default())),
        }
    }

    /// Redirect through `navigator` when the session cannot be renewed.
    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// # Errors
    /// Propagates credential store failures.
    pub async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.store.load().await?.access_token)
    }

    /// # Errors
    /// Propagates credential store failures.
    pub async fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.store.load().await?.refresh_token)
    }

    /// # Errors
    /// Propagates credential store failures.
    pub async fn cached_user(&self) -> Result<Option<UserRecord>> {
        Ok(self.store.load().await?.user)
    }

    /// # Errors
    /// Propagates credential store failures.
    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.access_token().await?.is_some())
    }

    /// Persist credentials (and the user, if known) after a login.
    ///
    /// # Errors
    /// Propagates credential store failures.
    pub async fn establish(
        &self,
        credentials: &CredentialPair,
        user: Option<UserRecord>,
    ) -> Result<()> {
        let mut session = StoredSession::with_credentials(credentials);
        session.user = user;
        self.store.save(&session).await?;
        self.forget_last_refresh();
        info!(has_user = session.user.is_some(), "session established");
        Ok(())
    }

    /// Replace the cached user record, keeping the tokens.
    ///
    /// # Errors
    /// Propagates credential store failures.
    pub async fn update_user(&self, user: UserRecord) -> Result<()> {
        let mut session = self.store.load().await?;
        session.user = Some(user);
        self.store.save(&session).await
    }

    /// Clear tokens and the cached user.
    ///
    /// # Errors
    /// Propagates credential store failures.
    pub async fn logout(&self) -> Result<()> {
        self.store.clear().await?;
        self.forget_last_refresh();
        info!("session cleared (logout)");
        Ok(())
    }

    /// Whether a 401 on `route` must be surfaced without a refresh.
    ///
    /// Matches an exempt path exactly or as a prefix ending at a `/`.
    pub fn is_exempt(&self, route: &str) -> bool {
        matches_route(&self.config.refresh_path, route)
            || self.config.exempt_paths.iter().any(|pattern| matches_route(pattern, route))
    }

    fn forget_last_refresh(&self) {
        self.slot.lock().last = None;
    }

    /// Whether a refresh is outstanding right now.
    pub fn refresh_in_flight(&self) -> bool {
        self.slot.lock().in_flight.is_some()
    }

    /// Resolve a 401 for a request that was sent with `stale_access_token`.
    ///
    /// If the stored access token already differs from the one the request
    /// carried, a refresh completed after it was sent and the stored token is
    /// returned without refreshing again. Otherwise the caller joins the
    /// outstanding refresh, reuses the outcome of the last refresh when that
    /// refresh replaced `stale_access_token`, or starts one.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns the refresh error when the refresh fails; the session has
    /// been cleared by then. Propagates credential store read failures.
    pub async fn renew(&self, stale_access_token: Option<&str>) -> Result<Renewal> {
        let stored = self.store.load().await?;

        if let Some(current) = stored.access_token.as_deref() {
            if stale_access_token != Some(current) {
                debug!("access token already renewed, retrying with stored token");
                return Ok(Renewal::Retry { access_token: current.to_string() });
            }
        }

        let credentials = match self.join_or_start(stale_access_token, stored.refresh_token) {
            Joined::Pending(outcome) => outcome.await?,
            Joined::Settled(outcome) => outcome?,
            Joined::NoRefreshToken => {
                warn!("401 with no refresh token stored; clearing session");
                if let Err(err) = self.store.clear().await {
                    warn!(error = %err, "failed to clear stored session");
                }
                return Ok(Renewal::SignedOut);
            }
        };
        Ok(Renewal::Retry { access_token: credentials.access_token })
    }

    /// Decide under one lock, with no suspension point in between, whether
    /// this 401 joins the outstanding refresh, reuses the last one, or
    /// starts a new one.
    ///
    /// The store snapshot may predate the last refresh, so its refresh token
    /// is only used when no refresh has yet replaced `stale_access_token`.
    fn join_or_start(
        &self,
        stale_access_token: Option<&str>,
        refresh_token: Option<String>,
    ) -> Joined {
        let mut slot = self.slot.lock();

        if let Some(in_flight) = &slot.in_flight {
            debug!(generation = in_flight.generation, "joining in-flight session refresh");
            return Joined::Pending(in_flight.outcome.clone());
        }

        if let (Some(stale), Some(last)) = (stale_access_token, &slot.last) {
            if last.replaced.as_deref() == Some(stale) {
                debug!("last session refresh already replaced this token");
                return Joined::Settled(last.outcome.clone());
            }
        }

        let Some(refresh_token) = refresh_token else {
            return Joined::NoRefreshToken;
        };

        let generation = slot.next_generation;
        slot.next_generation += 1;

        let task = RefreshTask {
            store: Arc::clone(&self.store),
            refresher: Arc::clone(&self.refresher),
            navigator: self.navigator.clone(),
            landing_route: self.config.landing_route.clone(),
            slot: Arc::clone(&self.slot),
            generation,
        };
        let handle = tokio::spawn(task.run(refresh_token));

        let slot_ref = Arc::clone(&self.slot);
        let outcome = async move {
            handle.await.unwrap_or_else(|err| {
                let outcome =
                    Err(MarketLinkError::Internal(format!("session refresh task failed: {err}")));
                release(&slot_ref, generation, &outcome);
                outcome
            })
        }
        .boxed()
        .shared();

        slot.in_flight = Some(InFlight {
            generation,
            replaced: stale_access_token.map(str::to_string),
            outcome: outcome.clone(),
        });
        debug!(generation, "started session refresh");
        Joined::Pending(outcome)
    }
}

/// Everything the spawned refresh needs, detached from the manager's lifetime
struct RefreshTask {
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
    navigator: Option<Arc<dyn Navigator>>,
    landing_route: Option<String>,
    slot: Arc<Mutex<RefreshSlot>>,
    generation: u64,
}

impl RefreshTask {
    async fn run(self, refresh_token: String) -> Result<CredentialPair> {
        let outcome = AssertUnwindSafe(self.exchange(&refresh_token))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(MarketLinkError::Internal("session refresh panicked".to_string()))
            });

        if let Err(err) = &outcome {
            warn!(generation = self.generation, error = %err, "session refresh failed; signing out");
            if let Err(clear_err) = self.store.clear().await {
                warn!(error = %clear_err, "failed to clear stored session");
            }
            if let (Some(navigator), Some(route)) = (&self.navigator, &self.landing_route) {
                navigator.redirect(route);
            }
        }

        // Persisted before release; a 401 whose store read predates the save
        // still finds this outcome in the slot.
        release(&self.slot, self.generation, &outcome);
        outcome
    }

    async fn exchange(&self, refresh_token: &str) -> Result<CredentialPair> {
        let grant = self.refresher.refresh(refresh_token).await?;
        let rotated = grant.refresh_token.is_some();
        let credentials = grant.into_credentials(refresh_token);

        let mut session = self.store.load().await?;
        session.apply_credentials(&credentials);
        self.store.save(&session).await?;

        info!(generation = self.generation, rotated, "session refreshed");
        Ok(credentials)
    }
}

fn release(slot: &Mutex<RefreshSlot>, generation: u64, outcome: &Result<CredentialPair>) {
    let mut slot = slot.lock();
    if slot.in_flight.as_ref().is_some_and(|in_flight| in_flight.generation == generation) {
        if let Some(in_flight) = slot.in_flight.take() {
            slot.last = Some(Settled { replaced: in_flight.replaced, outcome: outcome.clone() });
        }
    }
}

fn matches_route(pattern: &str, route: &str) -> bool {
    let pattern = pattern.trim_end_matches('/');
    route == pattern || route.strip_prefix(pattern).is_some_and(|rest| rest.starts_with('/'))
}
