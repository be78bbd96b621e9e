pub mod archive;
pub mod directory;
/// The line-oriented interchange format.
pub mod gedcom;
mod store;

pub use archive::{Archive, ArchiveError, PersistError};
pub use directory::{DirectoryStore, DirectoryStoreError};
pub use store::{MemoryStore, RecordKind, RecordStore, Records};
