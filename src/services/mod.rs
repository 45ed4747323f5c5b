// Service exports
pub mod loader;
pub mod memory;
pub mod source;
pub mod sqlite;

pub use loader::{CsvLoader, LoadError, LoadSummary};
pub use memory::MemorySource;
pub use source::{CollegeSource, SourceError};
pub use sqlite::SqliteSource;
