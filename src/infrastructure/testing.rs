//! Test fixtures and a hand-driven API double.
//!
//! `GatedApi` holds every call open until the test releases it, which lets
//! tests decide the order in which concurrent calls resolve.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::domain::{AppError, Result, Session, ShortenedLink, User};

use super::shortener_api::ShortenerApi;

pub fn user() -> User {
    User {
        id: "u-1".into(),
        email: "jane@example.com".into(),
    }
}

pub fn session(token: &str) -> Session {
    Session::new(token, user())
}

pub fn link(id: &str, slug: &str) -> ShortenedLink {
    ShortenedLink {
        id: id.into(),
        slug: slug.into(),
        original_url: "https://example.com/very/long/path".into(),
        short_url: format!("http://sho.rt/{slug}"),
        click_count: 0,
        created_at: None,
    }
}

type Gate<T> = oneshot::Receiver<Result<T>>;

fn gate_dropped() -> AppError {
    AppError::Transport {
        message: "gate dropped".into(),
        source: None,
    }
}

/// API double whose calls resolve only when the test says so.
#[derive(Default)]
pub struct GatedApi {
    links: Mutex<VecDeque<Gate<ShortenedLink>>>,
    histories: Mutex<VecDeque<Gate<Vec<ShortenedLink>>>>,
    sessions: Mutex<VecDeque<Gate<Session>>>,
    calls: Mutex<Vec<String>>,
}

impl GatedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a gate for the next shorten or slug-update call.
    pub fn link_gate(&self) -> oneshot::Sender<Result<ShortenedLink>> {
        let (tx, rx) = oneshot::channel();
        self.links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(rx);
        tx
    }

    /// Queue a gate for the next history call.
    pub fn history_gate(&self) -> oneshot::Sender<Result<Vec<ShortenedLink>>> {
        let (tx, rx) = oneshot::channel();
        self.histories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(rx);
        tx
    }

    /// Queue a gate for the next login or sign-up call.
    pub fn session_gate(&self) -> oneshot::Sender<Result<Session>> {
        let (tx, rx) = oneshot::channel();
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(rx);
        tx
    }

    /// Calls made so far, as `route:argument` strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: String) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    async fn wait<T>(&self, call: String, queue: &Mutex<VecDeque<Gate<T>>>) -> Result<T> {
        self.record(call);
        let gate = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match gate {
            Some(rx) => rx.await.unwrap_or_else(|_| Err(gate_dropped())),
            None => Err(gate_dropped()),
        }
    }
}

#[async_trait]
impl ShortenerApi for GatedApi {
    async fn shorten_public(&self, original_url: &str) -> Result<ShortenedLink> {
        self.wait(format!("public:{original_url}"), &self.links).await
    }

    async fn shorten_authenticated(
        &self,
        original_url: &str,
        token: &str,
    ) -> Result<ShortenedLink> {
        self.wait(format!("authenticated:{original_url}:{token}"), &self.links)
            .await
    }

    async fn update_slug(
        &self,
        link_id: &str,
        new_slug: &str,
        token: &str,
    ) -> Result<ShortenedLink> {
        self.wait(format!("update:{link_id}:{new_slug}:{token}"), &self.links)
            .await
    }

    async fn list_history(&self, token: &str) -> Result<Vec<ShortenedLink>> {
        self.wait(format!("history:{token}"), &self.histories).await
    }

    async fn authenticate(&self, email: &str, _password: &str) -> Result<Session> {
        self.wait(format!("login:{email}"), &self.sessions).await
    }

    async fn register(&self, email: &str, _password: &str) -> Result<Session> {
        self.wait(format!("register:{email}"), &self.sessions).await
    }
}
