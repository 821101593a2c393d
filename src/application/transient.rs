//! Time-bounded UI state driven by operation outcomes.
//!
//! Tracks the displayed link, the copy confirmation (which reverts on its
//! own) and the slug edit dialog. Every piece is tied to the link currently
//! displayed: a new link resets the confirmation and closes the dialog.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::domain::{OperationState, Result, ShortenedLink};
use crate::infrastructure::Clipboard;

use super::operation::Completion;
use super::session_store::SessionStore;

/// Copy confirmation lifetime used when none is configured.
pub const DEFAULT_COPY_FEEDBACK: Duration = Duration::from_millis(2000);

/// Point-in-time copy of the transient state, for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransientView {
    pub displayed_link: Option<ShortenedLink>,
    pub copy_confirmed: bool,
    pub dialog_open: bool,
    pub editable_slug: String,
    pub edit_error: Option<String>,
}

#[derive(Default)]
struct TransientState {
    view: TransientView,
    copy_generation: u64,
    copy_timer: Option<JoinHandle<()>>,
}

impl TransientState {
    fn reset_copy(&mut self) {
        if let Some(timer) = self.copy_timer.take() {
            timer.abort();
        }
        self.copy_generation += 1;
        self.view.copy_confirmed = false;
    }

    fn close_dialog(&mut self) {
        self.view.dialog_open = false;
        self.view.edit_error = None;
    }
}

/// Owner of the displayed link, copy confirmation and edit dialog.
#[derive(Clone)]
pub struct TransientController {
    state: Arc<Mutex<TransientState>>,
    clipboard: Arc<dyn Clipboard>,
    session: SessionStore,
    copy_feedback: Duration,
}

impl TransientController {
    #[must_use]
    pub fn new(
        clipboard: Arc<dyn Clipboard>,
        session: SessionStore,
        copy_feedback: Duration,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(TransientState::default())),
            clipboard,
            session,
            copy_feedback,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TransientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a shorten outcome. Only an applied success changes anything.
    pub fn apply_shorten(&self, completion: &Completion<ShortenedLink>) {
        let Completion::Applied(OperationState::Success(link)) = completion else {
            return;
        };

        let mut state = self.lock();
        state.view.displayed_link = Some(link.clone());
        state.reset_copy();
        state.close_dialog();
        state.view.editable_slug.clear();
        tracing::debug!(link_id = %link.id, "Displaying new short link");
    }

    /// Copy the displayed short URL and show the confirmation.
    ///
    /// Returns `Ok(false)` when no link is displayed. A repeated copy restarts
    /// the confirmation timer. Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// Returns error if the clipboard write fails; the confirmation is left
    /// unchanged.
    pub fn copy(&self) -> Result<bool> {
        let Some(short_url) = self
            .lock()
            .view
            .displayed_link
            .as_ref()
            .map(|link| link.short_url.clone())
        else {
            return Ok(false);
        };

        self.clipboard.write_text(&short_url)?;

        let mut state = self.lock();
        state.reset_copy();
        state.view.copy_confirmed = true;
        let generation = state.copy_generation;

        let weak = Arc::downgrade(&self.state);
        let delay = self.copy_feedback;
        state.copy_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = weak.upgrade() {
                let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                if state.copy_generation == generation {
                    state.view.copy_confirmed = false;
                    state.copy_timer = None;
                }
            }
        }));

        tracing::debug!(%short_url, "Short link copied");
        Ok(true)
    }

    /// Open the slug editor seeded with the displayed link's slug.
    ///
    /// No-op (returns `false`) without a displayed link or a session.
    pub fn open_edit(&self) -> bool {
        if self.session.get().is_none() {
            return false;
        }

        let mut state = self.lock();
        let Some(slug) = state.view.displayed_link.as_ref().map(|l| l.slug.clone()) else {
            return false;
        };
        state.view.editable_slug = slug;
        state.view.edit_error = None;
        state.view.dialog_open = true;
        true
    }

    /// Update the slug being typed in the editor.
    pub fn set_editable_slug(&self, slug: impl Into<String>) {
        self.lock().view.editable_slug = slug.into();
    }

    pub fn close_edit(&self) {
        self.lock().close_dialog();
    }

    /// Apply an edit outcome.
    ///
    /// Success replaces the displayed link (if it is still the one being
    /// edited) and closes the dialog. Failure keeps the dialog open with the
    /// message and the typed slug.
    pub fn apply_edit(&self, completion: &Completion<ShortenedLink>) {
        let Completion::Applied(outcome) = completion else {
            return;
        };

        let mut state = self.lock();
        match outcome {
            OperationState::Success(link) => {
                let same_link = state
                    .view
                    .displayed_link
                    .as_ref()
                    .is_some_and(|shown| shown.id == link.id);
                if !same_link {
                    tracing::debug!(
                        link_id = %link.id,
                        "Ignoring edit for a link no longer displayed"
                    );
                    return;
                }
                state.view.displayed_link = Some(link.clone());
                state.reset_copy();
                state.close_dialog();
            }
            OperationState::Failure(info) => {
                state.view.edit_error = Some(info.message.clone());
            }
            OperationState::Idle | OperationState::Pending => {}
        }
    }

    #[must_use]
    pub fn displayed_link(&self) -> Option<ShortenedLink> {
        self.lock().view.displayed_link.clone()
    }

    #[must_use]
    pub fn copy_confirmed(&self) -> bool {
        self.lock().view.copy_confirmed
    }

    #[must_use]
    pub fn dialog_open(&self) -> bool {
        self.lock().view.dialog_open
    }

    #[must_use]
    pub fn editable_slug(&self) -> String {
        self.lock().view.editable_slug.clone()
    }

    #[must_use]
    pub fn edit_error(&self) -> Option<String> {
        self.lock().view.edit_error.clone()
    }

    #[must_use]
    pub fn view(&self) -> TransientView {
        self.lock().view.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorInfo, ErrorKind};
    use crate::infrastructure::testing::{link, session};
    use crate::infrastructure::{MemoryBackend, MemoryClipboard};

    fn controller(logged_in: bool) -> (TransientController, Arc<MemoryClipboard>) {
        let store = SessionStore::new(Arc::new(MemoryBackend::new()));
        if logged_in {
            store.set(session("abc")).unwrap();
        }
        let clipboard = Arc::new(MemoryClipboard::new());
        let controller = TransientController::new(clipboard.clone(), store, DEFAULT_COPY_FEEDBACK);
        (controller, clipboard)
    }

    fn shortened(id: &str, slug: &str) -> Completion<ShortenedLink> {
        Completion::Applied(OperationState::Success(link(id, slug)))
    }

    fn failed(message: &str) -> Completion<ShortenedLink> {
        Completion::Applied(OperationState::Failure(ErrorInfo {
            kind: ErrorKind::Server,
            message: message.into(),
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_confirmation_reverts_after_timeout() {
        let (controller, clipboard) = controller(false);
        controller.apply_shorten(&shortened("1", "abc"));

        assert!(controller.copy().unwrap());
        assert_eq!(clipboard.last().as_deref(), Some("http://sho.rt/abc"));
        assert!(controller.copy_confirmed());

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(controller.copy_confirmed());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!controller.copy_confirmed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_copy_restarts_timeout() {
        let (controller, _) = controller(false);
        controller.apply_shorten(&shortened("1", "abc"));

        controller.copy().unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        controller.copy().unwrap();

        // 2500ms after the first copy, 1000ms after the second
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(controller.copy_confirmed());

        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert!(!controller.copy_confirmed());
    }

    #[tokio::test]
    async fn test_copy_without_link_is_noop() {
        let (controller, clipboard) = controller(false);
        assert!(!controller.copy().unwrap());
        assert!(!controller.copy_confirmed());
        assert_eq!(clipboard.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_link_clears_confirmation_and_dialog() {
        let (controller, _) = controller(true);
        controller.apply_shorten(&shortened("1", "old"));
        controller.copy().unwrap();
        assert!(controller.open_edit());

        controller.apply_shorten(&shortened("2", "fresh"));

        let view = controller.view();
        assert_eq!(view.displayed_link, Some(link("2", "fresh")));
        assert!(!view.copy_confirmed);
        assert!(!view.dialog_open);
    }

    #[test]
    fn test_failed_or_superseded_shorten_keeps_link() {
        let (controller, _) = controller(false);
        controller.apply_shorten(&shortened("1", "abc"));

        controller.apply_shorten(&failed("nope"));
        controller.apply_shorten(&Completion::Superseded);

        assert_eq!(controller.displayed_link(), Some(link("1", "abc")));
    }

    #[test]
    fn test_open_edit_requires_link_and_session() {
        let (guest, _) = controller(false);
        guest.apply_shorten(&shortened("1", "abc"));
        assert!(!guest.open_edit());
        assert!(!guest.dialog_open());

        let (member, _) = controller(true);
        assert!(!member.open_edit());

        member.apply_shorten(&shortened("1", "abc"));
        assert!(member.open_edit());
        assert!(member.dialog_open());
        assert_eq!(member.editable_slug(), "abc");
    }

    #[test]
    fn test_edit_success_replaces_link_and_closes() {
        let (controller, _) = controller(true);
        controller.apply_shorten(&shortened("1", "old"));
        controller.open_edit();
        controller.set_editable_slug("new");

        controller.apply_edit(&shortened("1", "new"));

        let view = controller.view();
        assert_eq!(view.displayed_link.map(|l| l.short_url), Some("http://sho.rt/new".into()));
        assert!(!view.dialog_open);
        assert_eq!(view.edit_error, None);
    }

    #[test]
    fn test_edit_failure_keeps_link_dialog_and_input() {
        let (controller, _) = controller(true);
        controller.apply_shorten(&shortened("1", "old"));
        controller.open_edit();
        controller.set_editable_slug("taken");

        controller.apply_edit(&failed("Slug already in use"));

        let view = controller.view();
        assert_eq!(view.displayed_link, Some(link("1", "old")));
        assert!(view.dialog_open);
        assert_eq!(view.editable_slug, "taken");
        assert_eq!(view.edit_error.as_deref(), Some("Slug already in use"));
    }

    #[test]
    fn test_edit_for_replaced_link_is_ignored() {
        let (controller, _) = controller(true);
        controller.apply_shorten(&shortened("1", "old"));
        controller.apply_shorten(&shortened("2", "other"));

        controller.apply_edit(&shortened("1", "renamed"));

        assert_eq!(controller.displayed_link(), Some(link("2", "other")));
    }

    #[test]
    fn test_close_edit_clears_error() {
        let (controller, _) = controller(true);
        controller.apply_shorten(&shortened("1", "old"));
        controller.open_edit();
        controller.apply_edit(&failed("bad slug"));

        controller.close_edit();

        assert!(!controller.dialog_open());
        assert_eq!(controller.edit_error(), None);
    }
}
