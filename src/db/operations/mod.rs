pub mod game_rounds;
pub mod user_actions;
pub mod user_words;
pub mod users;
pub mod words;
