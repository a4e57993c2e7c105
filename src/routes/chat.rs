//! The Chat Adapter boundary: one endpoint receiving `(uid, text)` and
//! answering with the messages the bot would send back. Transport details
//! (Telegram, webhooks) live upstream of this contract.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::operations::{user_actions, users};
use crate::response::AppError;
use crate::services::dictionary::{self, AddOutcome, DictionaryError};
use crate::services::quiz::{self, AnswerOutcome, QuizError, RoundPrompt};
use crate::services::stats;
use crate::services::vocabulary::VocabularyError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub uid: String,
    pub text: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub messages: Vec<String>,
}

/// Errors that escape the per-command handling below are unexpected by
/// definition; they are logged and answered with a generic apology.
#[derive(Debug, Error)]
enum ChatError {
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
}

const MSG_UNEXPECTED: &str = "Something went wrong on my side. Please try again.";

pub async fn handle(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    let uid = req.uid.trim().to_string();
    if uid.is_empty() {
        return AppError::bad_request("uid is required").into_response();
    }

    // Serialize all work for this uid: round state and scores are
    // read-modify-write sequences.
    let lock = state.user_lock(&uid);
    let _guard = lock.lock().await;

    let text = req.text.trim();
    match dispatch(&state, &uid, text, req.username.as_deref()).await {
        Ok(messages) => Json(ChatReply { messages }).into_response(),
        Err(err) => {
            tracing::error!(uid = %uid, error = %err, "command handling failed");
            Json(ChatReply {
                messages: vec![MSG_UNEXPECTED.to_string()],
            })
            .into_response()
        }
    }
}

enum Command<'a> {
    Start,
    Help,
    Add(&'a str),
    Delete(&'a str),
    Edit(&'a str),
    Voc,
    Stats,
    Play,
    Answer(&'a str),
    Text(&'a str),
    Unknown,
}

fn parse_command(text: &str) -> Command<'_> {
    if let Some(rest) = text.strip_prefix('/') {
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        return match name {
            "start" => Command::Start,
            "help" => Command::Help,
            "add" => Command::Add(args),
            "delete" => Command::Delete(args),
            "edit" => Command::Edit(args),
            "voc" => Command::Voc,
            "stats" => Command::Stats,
            "play" => Command::Play,
            _ => Command::Unknown,
        };
    }

    if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
        return Command::Answer(text);
    }

    Command::Text(text)
}

async fn dispatch(
    state: &AppState,
    uid: &str,
    text: &str,
    username: Option<&str>,
) -> Result<Vec<String>, ChatError> {
    let pool = state.pool();

    match parse_command(text) {
        Command::Start => {
            users::ensure(pool, uid, username).await?;
            user_actions::log(pool, uid, "start").await?;
            Ok(vec![
                "Hi, I'm Voc! I can help you grow your vocabulary.\n\
                 Send me a word and I'll translate it and put it in your dictionary.\n\
                 /help shows everything I can do."
                    .to_string(),
            ])
        }
        Command::Help => {
            user_actions::log(pool, uid, "help").await?;
            Ok(vec![HELP_TEXT.to_string()])
        }
        Command::Add(args) => handle_add_manual(state, uid, args).await,
        Command::Delete(args) => handle_delete(state, uid, args).await,
        Command::Edit(args) => handle_edit(state, uid, args).await,
        Command::Voc => handle_voc(state, uid).await,
        Command::Stats => handle_stats(state, uid).await,
        Command::Play => handle_play(state, uid).await,
        Command::Answer(input) => handle_answer(state, uid, input).await,
        Command::Text(word) => handle_text(state, uid, word).await,
        Command::Unknown => Ok(vec![
            "I don't know that command. /help lists what I understand.".to_string(),
        ]),
    }
}

const HELP_TEXT: &str = "Send me a word and I'll translate it, find a usage example \
and add it to your dictionary.\n\n\
Sometimes I can't find a word. In that case use /add <word> - <meaning>.\n\
/delete <word> removes a word.\n\
/edit <word> - <new meaning> changes its meaning.\n\
/voc shows your dictionary.\n\
/stats shows your learning summary.\n\n\
/play starts the quiz: I send a word with a usage example and you pick \
the right meaning from a list. After 5 correct answers a word counts as \
learned and leaves your dictionary.";

/// `/add word - meaning`: manual override for words the lookup service
/// cannot find.
async fn handle_add_manual(
    state: &AppState,
    uid: &str,
    args: &str,
) -> Result<Vec<String>, ChatError> {
    let pool = state.pool();

    let Some((word, meaning)) = split_pair(args) else {
        return Ok(vec!["Usage: /add <word> - <meaning>".to_string()]);
    };

    let word = dictionary::add_manual_override(pool, uid, word, meaning).await?;
    user_actions::log(pool, uid, "add_manual").await?;

    Ok(vec![format!("Added \"{word}\"")])
}

async fn handle_delete(state: &AppState, uid: &str, args: &str) -> Result<Vec<String>, ChatError> {
    let pool = state.pool();

    match dictionary::soft_delete(pool, uid, args).await {
        Ok(()) => {
            user_actions::log(pool, uid, "delete_word").await?;
            Ok(vec![format!("Deleted \"{}\"", args.trim().to_lowercase())])
        }
        Err(DictionaryError::NotFound) => {
            user_actions::log(pool, uid, "delete_word_fail").await?;
            Ok(vec![
                "I don't have that word in your dictionary.".to_string()
            ])
        }
        Err(err) => Err(err.into()),
    }
}

async fn handle_edit(state: &AppState, uid: &str, args: &str) -> Result<Vec<String>, ChatError> {
    let pool = state.pool();

    let Some((word, meaning)) = split_pair(args) else {
        return Ok(vec!["Usage: /edit <word> - <new meaning>".to_string()]);
    };

    match dictionary::edit(pool, uid, word, meaning).await {
        Ok(()) => {
            user_actions::log(pool, uid, "edit").await?;
            Ok(vec![format!(
                "New meaning:\n{} - {}",
                word.trim().to_lowercase(),
                meaning.trim()
            )])
        }
        Err(DictionaryError::NotFound) => {
            user_actions::log(pool, uid, "edit_fail").await?;
            Ok(vec!["I don't have that word yet.".to_string()])
        }
        Err(err) => Err(err.into()),
    }
}

async fn handle_voc(state: &AppState, uid: &str) -> Result<Vec<String>, ChatError> {
    let pool = state.pool();

    let entries = dictionary::list_active(pool, uid).await?;
    user_actions::log(pool, uid, "voc").await?;

    if entries.is_empty() {
        return Ok(vec![
            "Your dictionary is empty so far. Send me a few words!".to_string(),
        ]);
    }

    let mut reply = format!("You have {} words in your dictionary:\n\n", entries.len());
    for (word, meaning) in &entries {
        reply.push_str(&format!("{word} - {meaning}\n"));
    }
    Ok(vec![reply])
}

async fn handle_stats(state: &AppState, uid: &str) -> Result<Vec<String>, ChatError> {
    let pool = state.pool();

    let summary = stats::summarize(pool, uid).await?;
    user_actions::log(pool, uid, "stats").await?;

    Ok(vec![format!(
        "Out of {} added words you have mastered {}.\n\n\
         Over the last week: {} correct answers out of {} attempts, \
         {} words mastered.\n\nGreat work, keep going!",
        summary.active_words + summary.mastered_words,
        summary.mastered_words,
        summary.weekly_wins,
        summary.weekly_attempts,
        summary.weekly_mastered,
    )])
}

async fn handle_play(state: &AppState, uid: &str) -> Result<Vec<String>, ChatError> {
    let pool = state.pool();

    user_actions::log(pool, uid, "play").await?;

    match quiz::start_round(pool, uid).await {
        Ok(prompt) => Ok(vec![
            "I'll send you a word with a usage example. Pick the right meaning.\n\
             After 5 correct answers the word counts as learned and leaves your dictionary."
                .to_string(),
            render_prompt(&prompt),
        ]),
        Err(QuizError::InsufficientWords) => Ok(vec![format!(
            "You need at least {} words in your dictionary to play.",
            quiz::MIN_POOL_SIZE
        )]),
        Err(err) => Err(err.into()),
    }
}

async fn handle_answer(state: &AppState, uid: &str, input: &str) -> Result<Vec<String>, ChatError> {
    let pool = state.pool();

    if !quiz::has_active_round(pool, uid).await? {
        return Ok(vec![
            "There is no quiz running. Send /play to start one.".to_string(),
        ]);
    }

    if input == "0" {
        quiz::cancel(pool, uid).await?;
        return Ok(vec!["Come play again soon!".to_string()]);
    }

    let outcome = quiz::submit_answer(pool, uid, input).await?;
    Ok(render_outcome(&outcome))
}

/// Plain text: Cyrillic input is translated without being stored, anything
/// else is added to the dictionary.
async fn handle_text(state: &AppState, uid: &str, word: &str) -> Result<Vec<String>, ChatError> {
    let pool = state.pool();

    if word.is_empty() {
        return Ok(vec!["Send me a word to add it to your dictionary.".to_string()]);
    }

    if contains_cyrillic(word) {
        return handle_translate(state, uid, word).await;
    }

    match dictionary::add_word(pool, state.lookup(), uid, word).await {
        Ok(added) => {
            user_actions::log(pool, uid, "add_word").await?;
            let label = match added.outcome {
                AddOutcome::Added | AddOutcome::Restored => "New word",
                AddOutcome::AlreadyPresent => "Already in your dictionary",
            };
            let mut reply = format!("{label}:\n{} - {}", added.word, added.meaning);
            if let Some(example) = &added.example {
                reply.push_str(&format!("\n\nExample:\n{example}"));
            }
            Ok(vec![reply])
        }
        Err(DictionaryError::Vocabulary(VocabularyError::NoExamples(_))) => {
            user_actions::log(pool, uid, "add_word_fail_example").await?;
            Ok(vec![
                "I couldn't find a usage example for that word.".to_string(),
            ])
        }
        Err(DictionaryError::Vocabulary(VocabularyError::Lookup(err))) => {
            user_actions::log(pool, uid, "add_word_fail").await?;
            tracing::warn!(uid = %uid, error = %err, "lookup failed");
            Ok(vec![
                "I couldn't find that word. You can add it yourself with /add <word> - <meaning>."
                    .to_string(),
            ])
        }
        Err(DictionaryError::Vocabulary(VocabularyError::EmptyWord)) => {
            Ok(vec!["Send me a word to add it to your dictionary.".to_string()])
        }
        Err(err) => Err(err.into()),
    }
}

async fn handle_translate(
    state: &AppState,
    uid: &str,
    word: &str,
) -> Result<Vec<String>, ChatError> {
    let pool = state.pool();

    match state.lookup().lookup(&word.to_lowercase()).await {
        Ok(result) => {
            user_actions::log(pool, uid, "translate_russian").await?;
            Ok(vec![format!(
                "Translation:\n{} - {}",
                word.to_lowercase(),
                result.meaning
            )])
        }
        Err(err) => {
            user_actions::log(pool, uid, "translate_russian_fail").await?;
            tracing::warn!(uid = %uid, error = %err, "translation failed");
            Ok(vec!["Oops, I couldn't translate that.".to_string()])
        }
    }
}

fn render_prompt(prompt: &RoundPrompt) -> String {
    let mut reply = format!(
        "{}\n\nMeaning of \"{}\":\n",
        prompt.example, prompt.target_word
    );
    for (i, option) in prompt.options.iter().enumerate() {
        reply.push_str(&format!("{}. {}\n", i + 1, option));
    }
    reply.push_str("\nSend the number of the right answer, or 0 to stop.");
    reply
}

fn render_outcome(outcome: &AnswerOutcome) -> Vec<String> {
    let mut messages = Vec::new();

    if outcome.correct {
        messages.push(format!(
            "Correct!\n\nScore for \"{}\": {}",
            outcome.word, outcome.score
        ));
        if outcome.mastered {
            messages.push(format!(
                "Well done! \"{}\" is mastered and leaves your dictionary.",
                outcome.word
            ));
        }
    } else {
        let meaning = outcome.revealed_meaning.as_deref().unwrap_or_default();
        messages.push(format!(
            "Not quite. \"{}\" means \"{}\"\n\nScore for \"{}\": {}",
            outcome.word, meaning, outcome.word, outcome.score
        ));
    }

    match &outcome.next {
        Some(prompt) => messages.push(render_prompt(prompt)),
        None => messages.push(
            "Fewer than 3 words left to practice, so that's it for now. \
             Send me more words and come back!"
                .to_string(),
        ),
    }

    messages
}

fn split_pair(args: &str) -> Option<(&str, &str)> {
    let (word, meaning) = args.split_once('-')?;
    let (word, meaning) = (word.trim(), meaning.trim());
    if word.is_empty() || meaning.is_empty() {
        return None;
    }
    Some((word, meaning))
}

fn contains_cyrillic(text: &str) -> bool {
    text.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c))
}
