//! Per-visitor session data.
//!
//! Values live in the caller's `tower-sessions` session: created on first
//! write, dropped when the session expires.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::AppResult;

pub const SESSION_NUM_VISITS_KEY: &str = "num_visits";

/// Landing page visit counter
#[derive(Default, Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitCounter(pub i64);

impl VisitCounter {
    /// Current count, 0 for a fresh session
    pub async fn get(session: &Session) -> AppResult<i64> {
        Ok(session
            .get::<VisitCounter>(SESSION_NUM_VISITS_KEY)
            .await?
            .unwrap_or_default()
            .0)
    }

    /// Records one more visit and returns the count before it.
    pub async fn record_visit(session: &Session) -> AppResult<i64> {
        let previous = Self::get(session).await?;
        session
            .insert(SESSION_NUM_VISITS_KEY, VisitCounter(previous + 1))
            .await?;

        Ok(previous)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use tower_sessions::{MemoryStore, Session};

    /// Creates a [`Session`] backed by a fresh in-memory store
    pub fn session_test_setup() -> Session {
        let store = Arc::new(MemoryStore::default());
        Session::new(None, store, None)
    }
}
