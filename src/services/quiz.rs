use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::operations::game_rounds::{self, RoundRow};
use crate::db::operations::user_actions::{self, ACTION_LOSE, ACTION_MASTERED, ACTION_WIN};
use crate::db::operations::user_words::{self, PoolWord};
use crate::services::dictionary::{self, DictionaryError, MAX_SCORE};

/// A meaningful multiple-choice set needs at least two wrong options.
pub const MIN_POOL_SIZE: usize = 3;

const MAX_REPICK_ATTEMPTS: usize = 16;

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("need at least {MIN_POOL_SIZE} words in the dictionary to play")]
    InsufficientWords,
    #[error("no active round")]
    NoActiveRound,
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

/// One question as presented to the user. `correct_option` is bookkeeping
/// for answer checking and is never shown.
#[derive(Debug, Clone)]
pub struct RoundPrompt {
    pub target_word: String,
    pub example: String,
    pub options: Vec<String>,
    /// 1-based index of the correct meaning within `options`.
    pub correct_option: usize,
}

#[derive(Debug)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub word: String,
    pub score: i64,
    pub mastered: bool,
    /// The correct meaning, revealed after a wrong guess.
    pub revealed_meaning: Option<String>,
    /// The next question, or None when the pool shrank below the minimum
    /// and the quiz ended.
    pub next: Option<RoundPrompt>,
}

/// Picks a target and distractors from the user's active pool, persists the
/// round (replacing any previous one) and returns the prompt.
pub async fn start_round(pool: &SqlitePool, uid: &str) -> Result<RoundPrompt, QuizError> {
    let candidates = user_words::quiz_pool(pool, uid).await?;
    if candidates.len() < MIN_POOL_SIZE {
        return Err(QuizError::InsufficientWords);
    }

    let previous = game_rounds::get(pool, uid).await?.map(|r| r.target_word);

    let (prompt, score_at_round) = {
        let mut rng = rand::rng();
        build_round(&candidates, previous.as_deref(), &mut rng)
    };

    game_rounds::upsert(
        pool,
        &RoundRow {
            uid: uid.to_string(),
            target_word: prompt.target_word.clone(),
            correct_option: prompt.correct_option as i64,
            score_at_round,
            shown_meaning: prompt.options[prompt.correct_option - 1].clone(),
        },
    )
    .await?;

    Ok(prompt)
}

/// Checks `raw_input` against the live round, applies the score change
/// relative to the score snapshotted at round start, promotes the word on
/// the fifth consecutive win, and immediately starts the next round.
pub async fn submit_answer(
    pool: &SqlitePool,
    uid: &str,
    raw_input: &str,
) -> Result<AnswerOutcome, QuizError> {
    let round = game_rounds::get(pool, uid)
        .await?
        .ok_or(QuizError::NoActiveRound)?;

    let guess = raw_input.trim().parse::<i64>().ok();
    let correct = guess == Some(round.correct_option);

    let mut mastered = false;
    let score = if correct {
        user_actions::log(pool, uid, ACTION_WIN).await?;
        let score =
            dictionary::bump_score(pool, uid, &round.target_word, round.score_at_round, 1).await?;
        if round.score_at_round >= MAX_SCORE - 1 {
            // Fifth win: the word graduates out of the active pool.
            user_words::set_deleted(pool, uid, &round.target_word, true).await?;
            user_actions::log(pool, uid, ACTION_MASTERED).await?;
            mastered = true;
        }
        score
    } else {
        user_actions::log(pool, uid, ACTION_LOSE).await?;
        dictionary::bump_score(pool, uid, &round.target_word, round.score_at_round, -1).await?
    };

    let next = match start_round(pool, uid).await {
        Ok(prompt) => Some(prompt),
        Err(QuizError::InsufficientWords) => {
            game_rounds::clear(pool, uid).await?;
            None
        }
        Err(err) => return Err(err),
    };

    Ok(AnswerOutcome {
        correct,
        word: round.target_word,
        score,
        mastered,
        revealed_meaning: (!correct).then_some(round.shown_meaning),
        next,
    })
}

/// Ends the quiz without touching any score.
pub async fn cancel(pool: &SqlitePool, uid: &str) -> Result<(), QuizError> {
    game_rounds::clear(pool, uid).await?;
    Ok(())
}

pub async fn has_active_round(pool: &SqlitePool, uid: &str) -> Result<bool, QuizError> {
    Ok(game_rounds::get(pool, uid).await?.is_some())
}

fn build_round(
    candidates: &[PoolWord],
    previous: Option<&str>,
    rng: &mut impl Rng,
) -> (RoundPrompt, i64) {
    let target_idx = pick_target_index(candidates, previous, rng);
    let target = &candidates[target_idx];

    let wanted = distractor_count(candidates.len());
    let mut others: Vec<usize> = (0..candidates.len()).filter(|&i| i != target_idx).collect();
    let (chosen, _) = others.partial_shuffle(rng, wanted);

    let mut option_indices = Vec::with_capacity(wanted + 1);
    option_indices.push(target_idx);
    option_indices.extend_from_slice(chosen);
    option_indices.shuffle(rng);

    let correct_option = option_indices
        .iter()
        .position(|&i| i == target_idx)
        .map(|p| p + 1)
        .unwrap_or(1);
    let options = option_indices
        .iter()
        .map(|&i| candidates[i].meaning.clone())
        .collect();
    let example = target.examples.choose(rng).cloned().unwrap_or_default();

    (
        RoundPrompt {
            target_word: target.word.clone(),
            example,
            options,
            correct_option,
        },
        target.mastery_score,
    )
}

/// Uniform draw that avoids repeating the previous round's word. Rejection
/// sampling is bounded; after the attempt budget the previous index is
/// excluded arithmetically, so the pick always terminates. A pool of one
/// skips the no-repeat constraint entirely.
fn pick_target_index(
    candidates: &[PoolWord],
    previous: Option<&str>,
    rng: &mut impl Rng,
) -> usize {
    let len = candidates.len();
    let prev_idx = previous.and_then(|p| candidates.iter().position(|c| c.word == p));

    let Some(prev) = prev_idx else {
        return rng.random_range(0..len);
    };
    if len == 1 {
        return 0;
    }

    for _ in 0..MAX_REPICK_ATTEMPTS {
        let idx = rng.random_range(0..len);
        if idx != prev {
            return idx;
        }
    }

    let idx = rng.random_range(0..len - 1);
    if idx >= prev {
        idx + 1
    } else {
        idx
    }
}

/// Grows the option list slowly with the pool: one extra distractor for
/// every six words, between 2 and 8, and never more than the pool can
/// supply.
fn distractor_count(pool_size: usize) -> usize {
    (pool_size / 6).clamp(2, 8).min(pool_size.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool(words: &[(&str, &str, i64)]) -> Vec<PoolWord> {
        words
            .iter()
            .map(|(word, meaning, score)| PoolWord {
                word: word.to_string(),
                meaning: meaning.to_string(),
                mastery_score: *score,
                examples: vec![format!("example with {word}")],
            })
            .collect()
    }

    #[test]
    fn distractor_count_scales_with_pool() {
        assert_eq!(distractor_count(3), 2);
        assert_eq!(distractor_count(12), 2);
        assert_eq!(distractor_count(18), 3);
        assert_eq!(distractor_count(47), 7);
        assert_eq!(distractor_count(48), 8);
        assert_eq!(distractor_count(600), 8);
    }

    #[test]
    fn target_never_repeats_previous_word() {
        let candidates = pool(&[("cat", "кот", 0), ("dog", "собака", 0), ("bird", "птица", 0)]);
        let mut rng = StdRng::seed_from_u64(7);
        let mut previous = "cat".to_string();

        for _ in 0..200 {
            let idx = pick_target_index(&candidates, Some(&previous), &mut rng);
            assert_ne!(candidates[idx].word, previous);
            previous = candidates[idx].word.clone();
        }
    }

    #[test]
    fn single_word_pool_skips_no_repeat_constraint() {
        let candidates = pool(&[("cat", "кот", 0)]);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pick_target_index(&candidates, Some("cat"), &mut rng), 0);
    }

    #[test]
    fn round_options_contain_target_at_recorded_index() {
        let candidates = pool(&[
            ("cat", "кот", 0),
            ("dog", "собака", 1),
            ("bird", "птица", 2),
            ("fish", "рыба", 3),
        ]);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let (prompt, score) = build_round(&candidates, None, &mut rng);
            let target = candidates
                .iter()
                .find(|c| c.word == prompt.target_word)
                .unwrap();
            assert_eq!(prompt.options[prompt.correct_option - 1], target.meaning);
            assert_eq!(score, target.mastery_score);
            assert_eq!(prompt.options.len(), 3);
            assert!(target.examples.contains(&prompt.example));
        }
    }

    #[test]
    fn minimum_pool_yields_exactly_three_options() {
        let candidates = pool(&[("cat", "кот", 0), ("dog", "собака", 0), ("bird", "птица", 0)]);
        let mut rng = StdRng::seed_from_u64(1);
        let (prompt, _) = build_round(&candidates, None, &mut rng);

        assert_eq!(prompt.options.len(), 3);
        let mut sorted = prompt.options.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["кот", "птица", "собака"]);
    }
}
