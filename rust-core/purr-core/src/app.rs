//! # Application
//!
//! The protocol-level entry point. An [`App`] owns the frozen router and the
//! application-wide [`State`]; transports call [`App::call`] once per
//! request.

use crate::error::Result;
use crate::protocol::{MessageReceiver, MessageSender, Scope};
use crate::router::Router;
use crate::state::{State, APP_KEY};
use std::sync::Arc;

/// A routed application
#[derive(Debug, Clone)]
pub struct App {
    router: Arc<Router>,
    state: State,
}

impl App {
    /// Freeze a router into an application
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
            state: State::new(),
        }
    }

    /// Store an application-wide value
    #[must_use]
    pub fn with_state<T: Send + Sync + 'static>(self, key: impl Into<String>, value: T) -> Self {
        self.state.set(key, value);
        self
    }

    /// The frozen router
    #[must_use]
    pub const fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Application-wide state
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Handle one request
    ///
    /// Makes the application state reachable from the scope under
    /// [`APP_KEY`], then dispatches.
    ///
    /// # Errors
    ///
    /// Same as [`Router::dispatch`].
    pub async fn call(
        &self,
        scope: Scope,
        receive: Arc<dyn MessageReceiver>,
        send: &dyn MessageSender,
    ) -> Result<()> {
        scope.state.set_if_absent(APP_KEY, self.state.clone());
        self.router.dispatch(scope, receive, send).await
    }
}
