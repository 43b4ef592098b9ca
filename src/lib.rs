pub mod config;
pub mod error;
pub mod storage;
pub mod store;
pub mod voting;
pub mod web;

pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{PollStore, StorageKeys};
