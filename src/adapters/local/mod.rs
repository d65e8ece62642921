//! Local adapters for monolith deployment.

pub mod fs;
pub mod memory;
pub mod process;

pub use fs::FsStorage;
pub use memory::MemoryStore;
pub use process::ProcessRunner;
