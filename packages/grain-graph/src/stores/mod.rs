//! Topic Index and its storage backends.

mod index;
mod json_file;
mod memory;

pub use index::{TopicIndex, DEFAULT_INDEX_CAPACITY};
pub use json_file::JsonFileStore;
pub use memory::MemoryIndexStore;
