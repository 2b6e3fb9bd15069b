//! A hierarchical, POSIX-like filesystem abstraction synthesised from two primitive services: an
//! immutable, content-addressed chunk store and a mutable, time-indexed pointer feed.

mod address;
mod chunk;
mod config;
mod context;
mod directory;
mod driver;
mod error;
mod metadata;
mod node_store;
mod path;
mod pointer;
mod writer;

pub use address::ChunkAddress;
pub use chunk::{ChunkIo, ChunkStore, MemChunkStore, SeekableReader};
pub use config::{DriverConfig, OwnerId};
pub use context::Context;
pub use driver::{Driver, Stat, StorageDriver};
pub use error::{Error, Result};
pub use metadata::Metadata;
pub use path::{basename, is_valid_path, join_basename, parent, ROOT};
pub use pointer::{MemPointerService, PointerIo, PointerService, Topic};
pub use writer::Writer;
