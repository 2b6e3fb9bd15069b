//! The buffered writer state machine. Stage bytes in memory, commit publishes `data` then
//! `mtdt` and runs the directory maintainer, exactly the way `sn_api`'s upload flow stages
//! files locally before a single network-visible publish.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::instrument;

use crate::context::Context;
use crate::directory::DirectoryMaintainer;
use crate::error::Error;
use crate::metadata::Metadata;
use crate::node_store::{unix_now, NodeStore};

/// A single-consumer, in-memory staging buffer for a path's content, committed atomically (from
/// the caller's point of view) under the driver's write lock.
pub struct Writer {
    core: Arc<RwLock<NodeStore>>,
    path: String,
    buffer: Vec<u8>,
    closed: bool,
    committed: bool,
    cancelled: bool,
}

impl Writer {
    pub(crate) fn new(core: Arc<RwLock<NodeStore>>, path: String, append: bool) -> Result<Self, Error> {
        let buffer = if append {
            let guard = core.write();
            let ctx = Context::background();
            match guard.get_data(&ctx, &path) {
                Ok(bytes) => bytes,
                Err(Error::PathNotFound { .. }) => Vec::new(),
                Err(e) => return Err(e),
            }
        } else {
            Vec::new()
        };
        Ok(Self {
            core,
            path,
            buffer,
            closed: false,
            committed: false,
            cancelled: false,
        })
    }

    /// Appends `bytes` to the staging buffer. Fails with [`Error::WriterState`] once the writer
    /// has been closed, committed, or cancelled.
    #[instrument(skip(self, bytes), level = "debug")]
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        let _guard = self.core.write();
        if self.closed || self.committed || self.cancelled {
            return Err(Error::writer_state("write on a closed, committed, or cancelled writer"));
        }
        self.buffer.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    /// The current staging buffer's length. Never changes state.
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Marks the writer closed. Does not flush; [`Writer::commit`] is always explicit. Fails
    /// with [`Error::WriterState`] if already closed.
    #[instrument(skip(self), level = "debug")]
    pub fn close(&mut self) -> Result<(), Error> {
        let _guard = self.core.write();
        if self.closed {
            return Err(Error::writer_state("writer already closed"));
        }
        self.closed = true;
        Ok(())
    }

    /// Discards the staging buffer. Fails with [`Error::WriterState`] if already closed or
    /// committed.
    #[instrument(skip(self), level = "debug")]
    pub fn cancel(&mut self) -> Result<(), Error> {
        let _guard = self.core.write();
        if self.closed || self.committed {
            return Err(Error::writer_state("cannot cancel a closed or committed writer"));
        }
        self.cancelled = true;
        self.buffer.clear();
        Ok(())
    }

    /// Publishes the staging buffer as the path's new content and metadata, then runs the
    /// directory maintainer so the path becomes reachable from its ancestors. Fails with
    /// [`Error::WriterState`] once the writer has been closed, committed, or cancelled.
    #[instrument(skip(self), level = "debug")]
    pub fn commit(&mut self) -> Result<(), Error> {
        let guard = self.core.write();
        if self.closed || self.committed || self.cancelled {
            return Err(Error::writer_state("commit on a closed, committed, or cancelled writer"));
        }
        let ctx = Context::background();
        guard.put_data(&ctx, &self.path, &self.buffer)?;
        guard.put_metadata(
            &ctx,
            &Metadata::new_file(self.path.clone(), unix_now(), self.buffer.len() as u64),
        )?;
        DirectoryMaintainer::new(&guard).maintain(&ctx, &self.path)?;
        self.committed = true;
        self.buffer.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkIo, MemChunkStore};
    use crate::pointer::{MemPointerService, PointerIo};

    fn core() -> Arc<RwLock<NodeStore>> {
        Arc::new(RwLock::new(NodeStore::new(
            ChunkIo::new(Box::new(MemChunkStore::new()), false),
            PointerIo::new(Box::new(MemPointerService::new())),
        )))
    }

    #[test]
    fn fresh_writer_commits_new_content() {
        let core = core();
        {
            let guard = core.write();
            DirectoryMaintainer::new(&guard).bootstrap_root(&Context::background()).unwrap();
        }
        let mut w = Writer::new(core.clone(), "/f".to_string(), false).unwrap();
        w.write(b"hello").unwrap();
        assert_eq!(w.size(), 5);
        w.commit().unwrap();

        let guard = core.read();
        assert_eq!(guard.get_data(&Context::background(), "/f").unwrap(), b"hello");
    }

    #[test]
    fn append_seeds_buffer_from_existing_content() {
        let core = core();
        {
            let guard = core.write();
            let ctx = Context::background();
            DirectoryMaintainer::new(&guard).bootstrap_root(&ctx).unwrap();
            guard.put_data(&ctx, "/f", b"abc").unwrap();
            guard.put_metadata(&ctx, &Metadata::new_file("/f", unix_now(), 3)).unwrap();
        }
        let mut w = Writer::new(core.clone(), "/f".to_string(), true).unwrap();
        assert_eq!(w.size(), 3);
        w.write(b"def").unwrap();
        w.commit().unwrap();

        let guard = core.read();
        assert_eq!(guard.get_data(&Context::background(), "/f").unwrap(), b"abcdef");
    }

    #[test]
    fn write_after_close_fails() {
        let mut w = Writer::new(core(), "/f".to_string(), false).unwrap();
        w.close().unwrap();
        assert!(matches!(w.write(b"x"), Err(Error::WriterState { .. })));
    }

    #[test]
    fn double_close_fails() {
        let mut w = Writer::new(core(), "/f".to_string(), false).unwrap();
        w.close().unwrap();
        assert!(matches!(w.close(), Err(Error::WriterState { .. })));
    }

    #[test]
    fn cancel_then_commit_fails_and_leaves_no_content() {
        let core = core();
        {
            let guard = core.write();
            DirectoryMaintainer::new(&guard).bootstrap_root(&Context::background()).unwrap();
        }
        let mut w = Writer::new(core.clone(), "/f".to_string(), false).unwrap();
        w.write(b"zz").unwrap();
        w.cancel().unwrap();
        assert!(matches!(w.commit(), Err(Error::WriterState { .. })));

        let guard = core.read();
        assert!(matches!(
            guard.get_metadata(&Context::background(), "/f"),
            Err(Error::PathNotFound { .. })
        ));
    }

    #[test]
    fn cancel_after_commit_fails() {
        let core = core();
        {
            let guard = core.write();
            DirectoryMaintainer::new(&guard).bootstrap_root(&Context::background()).unwrap();
        }
        let mut w = Writer::new(core, "/f".to_string(), false).unwrap();
        w.commit().unwrap();
        assert!(matches!(w.cancel(), Err(Error::WriterState { .. })));
    }
}
