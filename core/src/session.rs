//! Auth session: the token pair, login/logout and token refresh.
//!
//! # Design
//! `AuthSession` is an injectable handle (an `Arc` inside) constructed once at
//! startup and cloned into whatever needs it. It owns the sans-IO client, the
//! transport, the durable store and the in-memory token pair.
//!
//! Refresh is single-flight. The first caller spawns the refresh as its own
//! task and parks a shared handle to its outcome in a slot; callers arriving
//! while the slot is occupied await that same handle instead of issuing a
//! second request. The task empties the slot when it finishes, so the next
//! refresh starts fresh. Because the work lives in a spawned task, a caller
//! that gives up (timeout, dropped view) never leaves the slot stuck.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::client::TripClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::forms::{validate_signup, LoginForm};
use crate::http::{HttpRequest, HttpResponse};
use crate::store::{FileTokenStore, TokenStore};
use crate::transport::{fetch_with_timeout, ReqwestTransport, Transport};
use crate::types::{AuthTokens, SignupData};

type PendingRefresh = Shared<BoxFuture<'static, bool>>;

struct Inner<T, S> {
    client: TripClient,
    transport: T,
    store: S,
    tokens: RwLock<Option<AuthTokens>>,
    refresh: Mutex<Option<PendingRefresh>>,
}

impl<T, S> Inner<T, S> {
    fn refresh_slot(&self) -> std::sync::MutexGuard<'_, Option<PendingRefresh>> {
        self.refresh.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to the logged-in (or logged-out) state of the app.
pub struct AuthSession<T, S> {
    inner: Arc<Inner<T, S>>,
}

impl<T, S> Clone for AuthSession<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl AuthSession<ReqwestTransport, FileTokenStore> {
    /// Production session: reqwest transport and the on-disk token file.
    pub async fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let store = FileTokenStore::new(
            config
                .token_path
                .clone()
                .unwrap_or_else(FileTokenStore::default_path),
        );
        let transport = ReqwestTransport::new()?;
        Ok(Self::load(TripClient::from_config(config), transport, store).await)
    }
}

impl<T, S> AuthSession<T, S>
where
    T: Transport + 'static,
    S: TokenStore + 'static,
{
    /// Build a session, reading the stored tokens once.
    pub async fn load(client: TripClient, transport: T, store: S) -> Self {
        let tokens = store.load().await;
        debug!(logged_in = tokens.is_some(), "session loaded");
        Self {
            inner: Arc::new(Inner {
                client,
                transport,
                store,
                tokens: RwLock::new(tokens),
                refresh: Mutex::new(None),
            }),
        }
    }

    pub fn client(&self) -> &TripClient {
        &self.inner.client
    }

    /// Execute `request` with its own wait budget.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        fetch_with_timeout(&self.inner.transport, request).await
    }

    pub async fn tokens(&self) -> Option<AuthTokens> {
        self.inner.tokens.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.inner
            .tokens
            .read()
            .await
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    pub async fn is_logged_in(&self) -> bool {
        self.inner.tokens.read().await.is_some()
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh_slot().is_some()
    }

    /// Persist `tokens`, then make them current.
    pub async fn save_tokens(&self, tokens: AuthTokens) -> Result<(), ApiError> {
        self.inner.store.save(&tokens).await?;
        *self.inner.tokens.write().await = Some(tokens);
        Ok(())
    }

    /// Forget the tokens. The in-memory state is reset even when the store
    /// fails; that failure is still reported.
    pub async fn clear_tokens(&self) -> Result<(), ApiError> {
        let removed = self.inner.store.clear().await;
        *self.inner.tokens.write().await = None;
        removed
    }

    /// Exchange the refresh token for a new pair.
    ///
    /// Returns `false` without a network call when no refresh token is held.
    /// Concurrent callers share one in-flight refresh and its outcome. On
    /// failure the session is logged out.
    pub async fn refresh_tokens(&self) -> bool {
        if self.inner.tokens.read().await.is_none() {
            debug!("refresh skipped, no refresh token");
            return false;
        }

        let pending = {
            let mut slot = self.inner.refresh_slot();
            match slot.as_ref() {
                Some(pending) => {
                    debug!("joining in-flight token refresh");
                    pending.clone()
                }
                None => {
                    let session = self.clone();
                    let task = tokio::spawn(async move { session.run_refresh().await });
                    let pending = async move { task.await.unwrap_or(false) }.boxed().shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Body of the spawned refresh. The refresh token is read here, after the
    /// slot was claimed, so a refresh that finished just before never hands
    /// its rotated-out token to the next one.
    async fn run_refresh(&self) -> bool {
        let current = self
            .inner
            .tokens
            .read()
            .await
            .as_ref()
            .map(|t| t.refresh_token.clone());
        let Some(refresh_token) = current else {
            debug!("session logged out before refresh started");
            self.inner.refresh_slot().take();
            return false;
        };

        let refreshed = match self.inner.client.build_refresh(&refresh_token) {
            Ok(request) => match self.send(request).await {
                Ok(response) => self.inner.client.parse_refresh(response),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        let ok = match refreshed {
            Ok(tokens) => match self.save_tokens(tokens).await {
                Ok(()) => {
                    info!("access token refreshed");
                    true
                }
                Err(e) => {
                    warn!(error = %e, "refreshed tokens could not be stored");
                    self.force_logout().await;
                    false
                }
            },
            Err(e) => {
                warn!(error = %e, "token refresh failed, logging out");
                self.force_logout().await;
                false
            }
        };

        self.inner.refresh_slot().take();
        ok
    }

    async fn force_logout(&self) {
        if let Err(e) = self.clear_tokens().await {
            warn!(error = %e, "could not remove stored tokens");
        }
    }

    /// Log in with email and password. Blank input is rejected before any
    /// request is made.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, ApiError> {
        LoginForm::new(email, password).validate()?;

        let request = self.inner.client.build_login(email.trim(), password)?;
        let response = self.send(request).await?;
        let tokens = self.inner.client.parse_login(response)?;
        self.save_tokens(tokens.clone()).await?;
        info!("logged in");
        Ok(tokens)
    }

    /// Create an account. Does not log in.
    pub async fn signup(&self, data: &SignupData) -> Result<(), ApiError> {
        validate_signup(data)?;
        let request = self.inner.client.build_signup(data)?;
        let response = self.send(request).await?;
        self.inner.client.parse_signup(response)?;
        info!("account created");
        Ok(())
    }

    /// Tell the server we are leaving, then clear local tokens whatever it
    /// answered.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if let Some(token) = self.access_token().await {
            let request = self.inner.client.build_logout(&token);
            let remote = match self.send(request).await {
                Ok(response) => self.inner.client.parse_logout(response),
                Err(e) => Err(e),
            };
            if let Err(e) = remote {
                warn!(error = %e, "remote logout failed, clearing local session anyway");
            }
        }
        self.clear_tokens().await?;
        info!("logged out");
        Ok(())
    }

    /// Run `call` with the current access token. On `Unauthorized` the tokens
    /// are refreshed and the call is retried exactly once.
    pub async fn authorized<R, F, Fut>(&self, call: F) -> Result<R, ApiError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<R, ApiError>>,
    {
        let token = self.access_token().await.ok_or(ApiError::NotLoggedIn)?;
        match call(token).await {
            Err(ApiError::Unauthorized) => {
                debug!("access token rejected, refreshing");
                if !self.refresh_tokens().await {
                    return Err(ApiError::Unauthorized);
                }
                let token = self.access_token().await.ok_or(ApiError::NotLoggedIn)?;
                call(token).await
            }
            other => other,
        }
    }
}
