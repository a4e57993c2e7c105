use std::collections::HashMap;
use std::sync::Arc;

use tempfile::TempDir;

use vocabot::db::Database;
use vocabot::services::lookup::{LookupError, LookupProvider, LookupResult};
use vocabot::state::AppState;

/// Fresh database in a temp directory. Keep the guard alive for the test's
/// duration or the file disappears under the pool.
pub struct TestDb {
    pub db: Database,
    _dir: TempDir,
}

pub async fn test_db() -> TestDb {
    let dir = TempDir::new().expect("failed to create temp dir");
    let db = Database::connect(&dir.path().join("test.db"))
        .await
        .expect("failed to init test db");
    TestDb { db, _dir: dir }
}

/// Lookup provider with canned answers; unknown words fail like the real
/// service does when it finds nothing.
#[derive(Default)]
pub struct FakeLookup {
    entries: HashMap<String, LookupResult>,
}

impl FakeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, word: &str, meaning: &str, examples: &[&str]) -> Self {
        self.entries.insert(
            word.to_string(),
            LookupResult {
                meaning: meaning.to_string(),
                examples: examples.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }
}

#[async_trait::async_trait]
impl LookupProvider for FakeLookup {
    async fn lookup(&self, word: &str) -> Result<LookupResult, LookupError> {
        self.entries.get(word).cloned().ok_or(LookupError::Empty)
    }
}

pub fn test_state(db: Database, lookup: FakeLookup) -> AppState {
    AppState::new(db, Arc::new(lookup))
}
