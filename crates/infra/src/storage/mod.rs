//! Persistent credential storage

pub mod file;

pub use file::FileCredentialStore;
