use std::collections::HashMap;
use std::sync::Mutex;

use super::SessionStore;
use crate::error::{CoreError, DatabaseError, Result};
use crate::timer::SessionSnapshot;

/// Session store kept in memory. Can be told to fail every write.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    rows: Mutex<HashMap<String, SessionSnapshot>>,
    writes: Mutex<usize>,
    fail_writes: bool,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        let store = Self::default();
        if let Ok(mut rows) = store.rows.lock() {
            rows.insert(snapshot.user_id.clone(), snapshot);
        }
        store
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Number of upserts attempted, including failed ones.
    pub fn writes(&self) -> usize {
        self.writes.lock().map(|n| *n).unwrap_or(0)
    }
}

fn poisoned() -> CoreError {
    CoreError::Custom("session store mutex poisoned".into())
}

impl SessionStore for MemorySessionStore {
    fn load(&self, user_id: &str) -> Result<Option<SessionSnapshot>> {
        Ok(self.rows.lock().map_err(|_| poisoned())?.get(user_id).cloned())
    }

    fn upsert(&self, snapshot: &SessionSnapshot) -> Result<()> {
        *self.writes.lock().map_err(|_| poisoned())? += 1;
        if self.fail_writes {
            return Err(DatabaseError::QueryFailed("write rejected".into()).into());
        }
        self.rows
            .lock()
            .map_err(|_| poisoned())?
            .insert(snapshot.user_id.clone(), snapshot.clone());
        Ok(())
    }
}
