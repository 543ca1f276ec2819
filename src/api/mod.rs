//! REST client for the reading API

mod client;
mod models;

pub use client::ApiClient;
pub use models::*;
