//! Ports - Trait seams to external collaborators.

pub mod repository;
pub mod storage;
pub mod tools;

/// Error type returned by collaborator ports.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;
