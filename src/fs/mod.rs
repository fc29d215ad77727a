//! FileSystem abstraction over project snapshots

mod mock;
mod real;
mod r#trait;

pub use mock::MockFileSystem;
pub use r#trait::{FileEntry, FileSystem, FileType};
pub use real::RealFileSystem;
