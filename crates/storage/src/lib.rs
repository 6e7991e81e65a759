#![forbid(unsafe_code)]

pub mod file;
pub mod kv;
pub mod persistent;
pub mod progress;

pub use file::FileStore;
pub use kv::{InMemoryStore, KeyValueStore, StorageError};
pub use persistent::PersistentStore;
pub use progress::{FlowValue, ProgressStore};
