//! Durable session token storage

mod storage;
mod store;

pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{SessionStore, Token};
