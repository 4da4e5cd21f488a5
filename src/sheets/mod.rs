pub mod auth;
pub mod client;

pub use auth::{ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider};
pub use client::SheetsClient;
