//! Request orchestration: one remote call per user action, routed on the
//! session snapshot taken when the action starts.
//!
//! Local checks (URL shape, password strength, missing session) settle the
//! operation immediately and never reach the network.

use std::sync::Arc;

use crate::domain::{
    require_field, sort_by_creation, validate_password, validate_url, AppError, OperationKind,
    Session, ShortenedLink,
};
use crate::infrastructure::ShortenerApi;

use super::operation::{Completion, OperationSlot};
use super::session_store::SessionStore;

/// Runs shorten, edit, history and authentication calls.
pub struct RequestOrchestrator {
    api: Arc<dyn ShortenerApi>,
    shorten: OperationSlot<ShortenedLink>,
    edit: OperationSlot<ShortenedLink>,
    history: OperationSlot<Vec<ShortenedLink>>,
    login: OperationSlot<Session>,
    register: OperationSlot<Session>,
}

impl RequestOrchestrator {
    #[must_use]
    pub fn new(api: Arc<dyn ShortenerApi>) -> Self {
        Self {
            api,
            shorten: OperationSlot::new(OperationKind::Shorten),
            edit: OperationSlot::new(OperationKind::EditSlug),
            history: OperationSlot::new(OperationKind::FetchHistory),
            login: OperationSlot::new(OperationKind::Login),
            register: OperationSlot::new(OperationKind::Register),
        }
    }

    #[must_use]
    pub const fn shorten_slot(&self) -> &OperationSlot<ShortenedLink> {
        &self.shorten
    }

    #[must_use]
    pub const fn edit_slot(&self) -> &OperationSlot<ShortenedLink> {
        &self.edit
    }

    #[must_use]
    pub const fn history_slot(&self) -> &OperationSlot<Vec<ShortenedLink>> {
        &self.history
    }

    #[must_use]
    pub const fn login_slot(&self) -> &OperationSlot<Session> {
        &self.login
    }

    #[must_use]
    pub const fn register_slot(&self) -> &OperationSlot<Session> {
        &self.register
    }

    /// Shorten `url`, as the session's owner when a session is given.
    ///
    /// The public and authenticated paths are mutually exclusive per call.
    pub async fn shorten(
        &self,
        url: &str,
        session: Option<&Session>,
    ) -> Completion<ShortenedLink> {
        let ticket = self.shorten.begin();

        if let Err(e) = validate_url(url) {
            return self.shorten.settle(ticket, Err(e));
        }
        let url = url.trim();

        let result = match session {
            Some(session) => {
                tracing::info!(seq = ticket.seq(), route = "authenticated", "Shortening URL");
                self.api.shorten_authenticated(url, &session.token).await
            }
            None => {
                tracing::info!(seq = ticket.seq(), route = "public", "Shortening URL");
                self.api.shorten_public(url).await
            }
        };

        self.shorten.settle(ticket, result)
    }

    /// Replace the slug of link `link_id`. Requires a session.
    pub async fn edit_slug(
        &self,
        link_id: &str,
        new_slug: &str,
        session: Option<&Session>,
    ) -> Completion<ShortenedLink> {
        let ticket = self.edit.begin();

        let Some(session) = session else {
            return self.edit.settle(ticket, Err(AppError::Unauthenticated));
        };
        if let Err(e) = require_field("slug", new_slug) {
            return self.edit.settle(ticket, Err(e));
        }

        tracing::info!(seq = ticket.seq(), link_id, "Updating slug");
        let result = self
            .api
            .update_slug(link_id, new_slug.trim(), &session.token)
            .await;

        self.edit.settle(ticket, result)
    }

    /// Fetch the session owner's links, oldest first. Requires a session.
    pub async fn fetch_history(
        &self,
        session: Option<&Session>,
    ) -> Completion<Vec<ShortenedLink>> {
        let ticket = self.history.begin();

        let Some(session) = session else {
            return self.history.settle(ticket, Err(AppError::Unauthenticated));
        };

        tracing::info!(seq = ticket.seq(), "Fetching history");
        let result = self.api.list_history(&session.token).await.map(|mut links| {
            sort_by_creation(&mut links);
            links
        });

        self.history.settle(ticket, result)
    }

    /// Log in and, if this is still the latest attempt, store the session.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        store: &SessionStore,
    ) -> Completion<Session> {
        let ticket = self.login.begin();

        let checked =
            require_field("email", email).and_then(|()| require_field("password", password));
        if let Err(e) = checked {
            return self.login.settle(ticket, Err(e));
        }

        tracing::info!(seq = ticket.seq(), "Logging in");
        let result = match self.api.authenticate(email.trim(), password).await {
            Ok(session) if self.login.is_current(ticket) => {
                store.set(session.clone()).map(|()| session)
            }
            other => other,
        };

        self.login.settle(ticket, result)
    }

    /// Create an account and, if this is still the latest attempt, store the
    /// full session (token and user together).
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        store: &SessionStore,
    ) -> Completion<Session> {
        let ticket = self.register.begin();

        if let Err(e) = require_field("email", email).and_then(|()| validate_password(password)) {
            return self.register.settle(ticket, Err(e));
        }

        tracing::info!(seq = ticket.seq(), "Registering account");
        let result = match self.api.register(email.trim(), password).await {
            Ok(session) if self.register.is_current(ticket) => {
                store.set(session.clone()).map(|()| session)
            }
            other => other,
        };

        self.register.settle(ticket, result)
    }
}
