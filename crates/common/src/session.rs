use std::fmt;
use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

/// Values are refreshed this many seconds before they actually expire, so
///  one handed out just before the deadline still works for the request
///  that uses it.
const REFRESH_MARGIN_SECS: i64 = 30;

struct Session<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

/// A single cached credential with an expiry.
///
/// The only way to read the value is [`SessionCache::get_valid`], which
///  holds the lock across the validity check and any refresh. Callers that
///  lose the race block until the refresh completes and then see the fresh
///  value; nobody leaves with a value that had already expired when they
///  checked it.
pub struct SessionCache<T> {
    inner: Mutex<Option<Session<T>>>,
}

impl<T: Clone> SessionCache<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Return the cached value if it stays valid for at least the refresh
    ///  margin, otherwise run `refresh` and cache whatever it yields together
    ///  with its expiry.
    ///
    /// A failed refresh leaves the cache empty, so the next caller retries.
    pub async fn get_valid<F, Fut, E>(&self, refresh: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(T, DateTime<Utc>), E>>,
    {
        let mut guard = self.inner.lock().await;

        if let Some(session) = guard.as_ref() {
            if Utc::now() + Duration::seconds(REFRESH_MARGIN_SECS) < session.expires_at {
                return Ok(session.value.clone());
            }
        }

        *guard = None;
        let (value, expires_at) = refresh().await?;
        tracing::debug!(%expires_at, "session refreshed");
        *guard = Some(Session {
            value: value.clone(),
            expires_at,
        });

        Ok(value)
    }
}

impl<T: Clone> Default for SessionCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SessionCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expires_at = self
            .inner
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.expires_at));
        f.debug_struct("SessionCache")
            .field("expires_at", &expires_at)
            .finish()
    }
}
