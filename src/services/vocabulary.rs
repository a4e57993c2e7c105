use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::operations::words::{self, WordRow};
use crate::services::lookup::{LookupError, LookupProvider};

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("word is empty")]
    EmptyWord,
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("no usage examples found for '{0}'")]
    NoExamples(String),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

/// Lowercases and collapses whitespace. Shared rows are keyed by this form.
pub fn normalize(word: &str) -> String {
    word.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Returns the shared entry for `word`, asking the lookup service and
/// persisting the result on a miss. A word without usage examples is
/// rejected: the quiz has nothing to display for it.
pub async fn lookup_or_create(
    pool: &SqlitePool,
    lookup: &dyn LookupProvider,
    word: &str,
) -> Result<WordRow, VocabularyError> {
    let word = normalize(word);
    if word.is_empty() {
        return Err(VocabularyError::EmptyWord);
    }

    if let Some(existing) = words::get(pool, &word).await? {
        return Ok(existing);
    }

    let result = lookup.lookup(&word).await?;
    if result.examples.is_empty() {
        return Err(VocabularyError::NoExamples(word));
    }

    let meaning = result.meaning.trim().to_lowercase();
    words::insert(pool, &word, &meaning, &result.examples).await?;

    // A concurrent first-add may have won the insert race; read back the row
    // that actually landed.
    match words::get(pool, &word).await? {
        Some(row) => Ok(row),
        None => Ok(WordRow {
            word,
            meaning,
            examples: result.examples,
        }),
    }
}
