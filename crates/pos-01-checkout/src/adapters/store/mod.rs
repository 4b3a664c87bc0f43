//! Record Store Adapters
//!
//! Implementations of the `RecordStore` trait.

mod file;
mod memory;

pub use file::JsonFileRecordStore;
pub use memory::InMemoryRecordStore;
