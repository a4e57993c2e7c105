use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use sqlx::SqlitePool;

use crate::db::Database;
use crate::services::lookup::LookupProvider;

/// Registry of per-user mutexes. Every command for a uid runs under that
/// uid's lock: round state and mastery scores are read-modify-write
/// sequences with no optimistic concurrency control. Different users
/// proceed in parallel.
#[derive(Default)]
pub struct UserLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl UserLocks {
    pub fn handle(&self, uid: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock();
        Arc::clone(
            map.entry(uid.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }
}

#[derive(Clone)]
pub struct AppState {
    db: Database,
    lookup: Arc<dyn LookupProvider>,
    locks: Arc<UserLocks>,
}

impl AppState {
    pub fn new(db: Database, lookup: Arc<dyn LookupProvider>) -> Self {
        Self {
            db,
            lookup,
            locks: Arc::new(UserLocks::default()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        self.db.pool()
    }

    pub fn lookup(&self) -> &dyn LookupProvider {
        self.lookup.as_ref()
    }

    pub fn user_lock(&self, uid: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks.handle(uid)
    }
}
