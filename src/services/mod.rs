pub mod dictionary;
pub mod lookup;
pub mod quiz;
pub mod stats;
pub mod vocabulary;
