//! Stores are for loading/storing the calendar state.
//!
//! The remote backend is the primary store, a local snapshot cache is always written as well and is used when
//! the remote backend is unavailable.
//!
//! Remote backends:
//! * In memory, see [`memory::InMemoryRemote`].
//! * A directory of JSON table files, see [`directory::DirectoryRemote`].
//! * Databases, REST services, etc. by implementing [`backend::RemoteStore`].
pub mod adapter;
pub mod backend;
pub mod cache;
pub mod debounce;
pub mod directory;
pub mod memory;
pub mod rows;
pub mod sequence;
pub mod storage;
pub mod transfer;
