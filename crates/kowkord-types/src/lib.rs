//! Wire models and intents shared by the kowkord crates.

pub mod api;
pub mod events;
pub mod models;
