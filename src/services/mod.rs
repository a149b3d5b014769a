// src/services/mod.rs
pub mod chat;
pub mod dialogflow;
