use rand::seq::IndexedRandom;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::operations::user_words;
use crate::services::lookup::LookupProvider;
use crate::services::vocabulary::{self, VocabularyError};

pub const MAX_SCORE: i64 = 5;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("word not found")]
    NotFound,
    #[error(transparent)]
    Vocabulary(#[from] VocabularyError),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// A soft-deleted entry was revived; score and edits were kept.
    Restored,
    AlreadyPresent,
}

#[derive(Debug, Clone)]
pub struct AddedWord {
    pub word: String,
    pub meaning: String,
    pub example: Option<String>,
    pub outcome: AddOutcome,
}

/// Ensures the shared entry exists, then attaches it to the user's
/// dictionary. Idempotent: re-adding an active word changes nothing, and
/// re-adding a deleted one only clears the deletion flag.
pub async fn add_word(
    pool: &SqlitePool,
    lookup: &dyn LookupProvider,
    uid: &str,
    raw_word: &str,
) -> Result<AddedWord, DictionaryError> {
    let shared = vocabulary::lookup_or_create(pool, lookup, raw_word).await?;

    let entry = user_words::get(pool, uid, &shared.word).await?;
    let outcome = match &entry {
        None => {
            user_words::insert(pool, uid, &shared.word).await?;
            AddOutcome::Added
        }
        Some(e) if e.is_deleted => {
            user_words::set_deleted(pool, uid, &shared.word, false).await?;
            AddOutcome::Restored
        }
        Some(_) => AddOutcome::AlreadyPresent,
    };

    let meaning = match entry.as_ref().filter(|e| e.is_edited) {
        Some(e) => e.edited_meaning.clone().unwrap_or_default(),
        None => shared.meaning.clone(),
    };

    let example = {
        let mut rng = rand::rng();
        shared.examples.choose(&mut rng).cloned()
    };

    Ok(AddedWord {
        word: shared.word,
        meaning,
        example,
        outcome,
    })
}

/// Adds a word with a user-supplied meaning, bypassing the shared store.
/// Used when the lookup service cannot find the word.
pub async fn add_manual_override(
    pool: &SqlitePool,
    uid: &str,
    raw_word: &str,
    meaning: &str,
) -> Result<String, DictionaryError> {
    let word = vocabulary::normalize(raw_word);
    if word.is_empty() || meaning.trim().is_empty() {
        return Err(DictionaryError::NotFound);
    }
    let meaning = meaning.trim();

    match user_words::get(pool, uid, &word).await? {
        Some(_) => user_words::set_edit(pool, uid, &word, meaning, true).await?,
        None => user_words::insert_override(pool, uid, &word, meaning).await?,
    }

    Ok(word)
}

pub async fn soft_delete(pool: &SqlitePool, uid: &str, raw_word: &str) -> Result<(), DictionaryError> {
    let word = vocabulary::normalize(raw_word);
    match user_words::get(pool, uid, &word).await? {
        Some(entry) if !entry.is_deleted => {
            user_words::set_deleted(pool, uid, &word, true).await?;
            Ok(())
        }
        _ => Err(DictionaryError::NotFound),
    }
}

pub async fn edit(
    pool: &SqlitePool,
    uid: &str,
    raw_word: &str,
    new_meaning: &str,
) -> Result<(), DictionaryError> {
    let word = vocabulary::normalize(raw_word);
    let new_meaning = new_meaning.trim();
    if new_meaning.is_empty() {
        return Err(DictionaryError::NotFound);
    }

    match user_words::get(pool, uid, &word).await? {
        Some(_) => {
            user_words::set_edit(pool, uid, &word, new_meaning, false).await?;
            Ok(())
        }
        None => Err(DictionaryError::NotFound),
    }
}

/// The meaning shown to this user: their edit if present, else the shared
/// canonical meaning.
pub async fn effective_meaning(
    pool: &SqlitePool,
    uid: &str,
    word: &str,
) -> Result<String, DictionaryError> {
    let entry = user_words::get(pool, uid, word)
        .await?
        .ok_or(DictionaryError::NotFound)?;

    if entry.is_edited {
        return Ok(entry.edited_meaning.unwrap_or_default());
    }

    let shared = crate::db::operations::words::get(pool, word)
        .await?
        .ok_or(DictionaryError::NotFound)?;
    Ok(shared.meaning)
}

pub async fn list_active(
    pool: &SqlitePool,
    uid: &str,
) -> Result<Vec<(String, String)>, DictionaryError> {
    Ok(user_words::list_active(pool, uid).await?)
}

pub fn clamp_score(score: i64) -> i64 {
    score.clamp(0, MAX_SCORE)
}

/// Applies `delta` relative to an explicit base score, clamped into 0..=5.
/// The quiz engine passes the score snapshotted when the round started.
pub async fn bump_score(
    pool: &SqlitePool,
    uid: &str,
    word: &str,
    from_score: i64,
    delta: i64,
) -> Result<i64, DictionaryError> {
    let next = clamp_score(from_score + delta);
    user_words::set_score(pool, uid, word, next).await?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_score_in_range() {
        assert_eq!(clamp_score(-1), 0);
        assert_eq!(clamp_score(0), 0);
        assert_eq!(clamp_score(3), 3);
        assert_eq!(clamp_score(5), 5);
        assert_eq!(clamp_score(6), 5);
    }
}
