//! # Connections
//!
//! A connection is an undirected "friend" edge between two identities. It is
//! requested by one side (the sender), and becomes an edge once the other
//! side (the receiver) accepts it. Only [`ConnectionStatus::Accepted`]
//! requests count as edges.
//!
//! Older user records also carry mirrored lists of connected emails. These
//! are consulted as a fallback: two users are legacy-connected when either
//! one's list contains the other's email.

use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Debug, Display};
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("unknown connection status: {0}")]
pub struct UnknownConnectionStatus(pub String);

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Accepted => "accepted",
            ConnectionStatus::Rejected => "rejected",
        }
    }
}

impl AsRef<str> for ConnectionStatus {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionStatus {
    type Err = UnknownConnectionStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ConnectionStatus::Pending),
            "accepted" => Ok(ConnectionStatus::Accepted),
            "rejected" => Ok(ConnectionStatus::Rejected),
            other => Err(UnknownConnectionStatus(other.to_string())),
        }
    }
}

/// Order a pair of user ids so that `(a, b)` and `(b, a)` key the same row.
pub fn unordered_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Read access to the connection graph.
#[async_trait]
pub trait ConnectionGraph: Send + Sync {
    type Error: Display + Debug + Send;

    /// Whether an accepted edge exists between the two users.
    async fn has_edge(&self, a: &str, b: &str) -> Result<bool, Self::Error>;

    /// Whether either user's legacy list names the other's email.
    ///
    /// Unknown users or users without an email are never legacy-connected.
    async fn legacy_connected(&self, a: &str, b: &str) -> Result<bool, Self::Error>;

    async fn are_connected(&self, a: &str, b: &str) -> Result<bool, Self::Error> {
        if self.has_edge(a, b).await? {
            return Ok(true);
        }
        self.legacy_connected(a, b).await
    }
}

#[derive(Debug, Default)]
struct MemoryConnectionGraphInner {
    edges: BTreeSet<(String, String)>,
    emails: HashMap<String, String>,
    legacy: HashMap<String, BTreeSet<String>>,
}

/// In-memory connection graph
#[derive(Debug, Clone, Default)]
pub struct MemoryConnectionGraph {
    inner: Arc<RwLock<MemoryConnectionGraphInner>>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryConnectionGraphError {
    #[error("memory graph error: {0}")]
    Internal(String),
}

impl MemoryConnectionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, MemoryConnectionGraphInner>, MemoryConnectionGraphError>
    {
        self.inner.write().map_err(|e| {
            MemoryConnectionGraphError::Internal(format!("failed to acquire write lock: {}", e))
        })
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, MemoryConnectionGraphInner>, MemoryConnectionGraphError>
    {
        self.inner.read().map_err(|e| {
            MemoryConnectionGraphError::Internal(format!("failed to acquire read lock: {}", e))
        })
    }

    pub fn connect(&self, a: &str, b: &str) -> Result<(), MemoryConnectionGraphError> {
        let (low, high) = unordered_pair(a, b);
        self.write()?
            .edges
            .insert((low.to_string(), high.to_string()));
        Ok(())
    }

    pub fn disconnect(&self, a: &str, b: &str) -> Result<bool, MemoryConnectionGraphError> {
        let (low, high) = unordered_pair(a, b);
        Ok(self
            .write()?
            .edges
            .remove(&(low.to_string(), high.to_string())))
    }

    pub fn set_email(&self, user_id: &str, email: &str) -> Result<(), MemoryConnectionGraphError> {
        self.write()?
            .emails
            .insert(user_id.to_string(), email.to_lowercase());
        Ok(())
    }

    /// Record `email` in the legacy list of `user_id`.
    pub fn add_legacy(&self, user_id: &str, email: &str) -> Result<(), MemoryConnectionGraphError> {
        self.write()?
            .legacy
            .entry(user_id.to_string())
            .or_default()
            .insert(email.to_lowercase());
        Ok(())
    }
}

#[async_trait]
impl ConnectionGraph for MemoryConnectionGraph {
    type Error = MemoryConnectionGraphError;

    async fn has_edge(&self, a: &str, b: &str) -> Result<bool, Self::Error> {
        let (low, high) = unordered_pair(a, b);
        Ok(self
            .read()?
            .edges
            .contains(&(low.to_string(), high.to_string())))
    }

    async fn legacy_connected(&self, a: &str, b: &str) -> Result<bool, Self::Error> {
        let inner = self.read()?;
        let lists = |owner: &str, other: &str| -> bool {
            match (inner.legacy.get(owner), inner.emails.get(other)) {
                (Some(list), Some(email)) => list.contains(email),
                _ => false,
            }
        };
        Ok(lists(a, b) || lists(b, a))
    }
}
