//! Domain models for sessions, shortened links and operation lifecycles.
//!
//! Wire names follow the shortening service's camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::ErrorInfo;

/// Deserializes an id that the service may send as a number or a string.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// The authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub email: String,
}

impl User {
    /// Display name derived from the email's local part, first letter upper-cased.
    #[must_use]
    pub fn display_name(&self) -> String {
        let local = self.email.split('@').next().unwrap_or_default();
        let mut chars = local.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }
}

/// An authenticated session. Token and user always travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    #[must_use]
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }
}

/// Welcome line name for an optional session: the user's display name or "Guest".
#[must_use]
pub fn greeting_name(session: Option<&Session>) -> String {
    session
        .map(|s| s.user.display_name())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Guest".to_string())
}

/// A link produced by the shortening service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenedLink {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub original_url: String,
    pub short_url: String,
    #[serde(default)]
    pub click_count: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Orders links by creation time, oldest first. Undated links go last.
pub fn sort_by_creation(links: &mut [ShortenedLink]) {
    links.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// The logical operations whose results reach the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Shorten,
    EditSlug,
    FetchHistory,
    Login,
    Register,
}

impl OperationKind {
    /// Message used when a failure carries nothing more specific.
    #[must_use]
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::Shorten => "Something went wrong",
            Self::EditSlug => "Failed to update link",
            Self::FetchHistory => "Error loading data",
            Self::Login => "Invalid email or password",
            Self::Register => "Failed to sign up",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shorten => write!(f, "shorten"),
            Self::EditSlug => write!(f, "edit-slug"),
            Self::FetchHistory => write!(f, "fetch-history"),
            Self::Login => write!(f, "login"),
            Self::Register => write!(f, "register"),
        }
    }
}

/// Lifecycle of one logical operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperationState<T> {
    #[default]
    Idle,
    Pending,
    Success(T),
    Failure(ErrorInfo),
}

impl<T> OperationState<T> {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// The success value, if any.
    #[must_use]
    pub const fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// The failure payload, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ErrorInfo> {
        match self {
            Self::Failure(info) => Some(info),
            _ => None,
        }
    }
}
