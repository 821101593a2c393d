//! Client facade tying the session store, orchestrator and transient state
//! together the way a rendering surface uses them.
//!
//! Each action reads the session once, when it starts.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{greeting_name, Result, Session, ShortenedLink};
use crate::infrastructure::{Clipboard, ShortenerApi};

use super::operation::Completion;
use super::orchestrator::RequestOrchestrator;
use super::session_store::SessionStore;
use super::transient::TransientController;

/// Shortening workflow for one execution context.
pub struct ShortenerClient {
    store: SessionStore,
    orchestrator: RequestOrchestrator,
    transient: TransientController,
}

impl ShortenerClient {
    #[must_use]
    pub fn new(
        api: Arc<dyn ShortenerApi>,
        store: SessionStore,
        clipboard: Arc<dyn Clipboard>,
        copy_feedback: Duration,
    ) -> Self {
        let transient = TransientController::new(clipboard, store.clone(), copy_feedback);
        Self {
            store,
            orchestrator: RequestOrchestrator::new(api),
            transient,
        }
    }

    #[must_use]
    pub const fn session_store(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub const fn orchestrator(&self) -> &RequestOrchestrator {
        &self.orchestrator
    }

    #[must_use]
    pub const fn transient(&self) -> &TransientController {
        &self.transient
    }

    /// Current session, if any.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.store.get()
    }

    /// Name for the welcome line: the user's display name or "Guest".
    #[must_use]
    pub fn greeting(&self) -> String {
        greeting_name(self.store.get().as_ref())
    }

    /// Shorten `url` and display the result.
    ///
    /// A new link abandons any slug edit still in flight for the old one.
    pub async fn submit(&self, url: &str) -> Completion<ShortenedLink> {
        let session = self.store.get();
        let completion = self.orchestrator.shorten(url, session.as_ref()).await;

        if completion.success().is_some() {
            self.orchestrator.edit_slot().reset();
        }
        self.transient.apply_shorten(&completion);
        completion
    }

    /// Copy the displayed short URL.
    ///
    /// # Errors
    /// Returns error if the clipboard write fails.
    pub fn copy(&self) -> Result<bool> {
        self.transient.copy()
    }

    /// Open the slug editor; no-op without a displayed link or session.
    pub fn open_edit(&self) -> bool {
        self.transient.open_edit()
    }

    pub fn set_editable_slug(&self, slug: impl Into<String>) {
        self.transient.set_editable_slug(slug);
    }

    pub fn close_edit(&self) {
        self.transient.close_edit();
    }

    /// Submit the slug typed in the open editor.
    ///
    /// Returns `None` when the editor is closed or nothing is displayed.
    pub async fn save_slug(&self) -> Option<Completion<ShortenedLink>> {
        let view = self.transient.view();
        let link = view.displayed_link.filter(|_| view.dialog_open)?;

        let session = self.store.get();
        let completion = self
            .orchestrator
            .edit_slug(&link.id, &view.editable_slug, session.as_ref())
            .await;

        self.transient.apply_edit(&completion);
        Some(completion)
    }

    /// Fetch the user's links. Safe to repeat.
    pub async fn history(&self) -> Completion<Vec<ShortenedLink>> {
        let session = self.store.get();
        self.orchestrator.fetch_history(session.as_ref()).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Completion<Session> {
        self.orchestrator.login(email, password, &self.store).await
    }

    pub async fn register(&self, email: &str, password: &str) -> Completion<Session> {
        self.orchestrator.register(email, password, &self.store).await
    }

    /// End the session in every context and close the slug editor.
    ///
    /// # Errors
    /// Returns error if the persisted session cannot be removed.
    pub fn logout(&self) -> Result<()> {
        self.store.clear()?;
        self.transient.close_edit();
        Ok(())
    }
}
