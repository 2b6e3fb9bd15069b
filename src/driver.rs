//! The filesystem API: the consumer-facing storage-driver surface implemented against the node
//! store and directory maintainer under a single process-wide lock, in the shape of
//! `sn_api/src/app/files/mod.rs`'s `FilesContainer` CRUD surface.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::instrument;

use crate::chunk::{ChunkIo, SeekableReader};
use crate::config::DriverConfig;
use crate::context::Context;
use crate::directory::DirectoryMaintainer;
use crate::error::Error;
use crate::metadata::Metadata;
use crate::node_store::{unix_now, NodeStore};
use crate::path::{self, is_valid_path, ROOT};
use crate::pointer::PointerIo;
use crate::writer::Writer;

/// The subset of a node's metadata a caller typically wants without decoding the full record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stat {
    /// The node's absolute path.
    pub path: String,
    /// Whether the node is a directory.
    pub is_dir: bool,
    /// Unix seconds of the node's last modification.
    pub mod_time: u64,
    /// Payload size in bytes; 0 for directories.
    pub size: u64,
}

impl From<Metadata> for Stat {
    fn from(m: Metadata) -> Self {
        Self {
            path: m.path,
            is_dir: m.is_dir,
            mod_time: m.mod_time,
            size: if m.is_dir { 0 } else { m.size },
        }
    }
}

/// The consumer-facing storage-driver surface, implemented by [`Driver`].
///
/// Every method here is also available in a `*_ctx` form taking an explicit
/// [`Context`] for cancellation/deadlines; the plain methods use [`Context::background`].
pub trait StorageDriver {
    /// See [`Driver::get_content_ctx`].
    fn get_content(&self, path: &str) -> Result<Vec<u8>, Error>;
    /// See [`Driver::put_content_ctx`].
    fn put_content(&self, path: &str, bytes: &[u8]) -> Result<(), Error>;
    /// See [`Driver::reader_ctx`].
    fn reader(&self, path: &str, offset: i64) -> Result<Box<dyn SeekableReader>, Error>;
    /// See [`Driver::stat_ctx`].
    fn stat(&self, path: &str) -> Result<Stat, Error>;
    /// See [`Driver::list_ctx`].
    fn list(&self, path: &str) -> Result<Vec<String>, Error>;
    /// See [`Driver::delete_ctx`].
    fn delete(&self, path: &str) -> Result<(), Error>;
    /// See [`Driver::move_path_ctx`].
    fn move_path(&self, src: &str, dst: &str) -> Result<(), Error>;
    /// See [`Driver::writer_ctx`].
    fn writer(&self, path: &str, append: bool) -> Result<Writer, Error>;
    /// Not supported by this backend; always returns `None`.
    fn redirect_url(&self, path: &str) -> Option<String>;
    /// See [`Driver::walk_ctx`].
    fn walk(&self, path: &str, visit: &mut dyn FnMut(&Stat) -> Result<(), Error>) -> Result<(), Error>;
}

/// The driver instance: the sole unit of shared state, holding the process-wide lock over the
/// node store.
pub struct Driver {
    core: Arc<RwLock<NodeStore>>,
}

impl Driver {
    /// Builds a driver from a validated [`DriverConfig`], bootstrapping root metadata if absent.
    #[instrument(skip(config), level = "debug")]
    pub fn new(config: DriverConfig) -> Result<Self, Error> {
        let (_owner, store, pointers, encrypt) = config.build()?;
        let node_store = NodeStore::new(ChunkIo::new(store, encrypt), PointerIo::new(pointers));
        let core = Arc::new(RwLock::new(node_store));
        {
            let guard = core.write();
            DirectoryMaintainer::new(&guard).bootstrap_root(&Context::background())?;
        }
        Ok(Self { core })
    }

    fn require_valid(path: &str) -> Result<(), Error> {
        if is_valid_path(path) {
            Ok(())
        } else {
            Err(Error::invalid_path(path))
        }
    }

    /// Reads the full content of the file at `path`. Fails with [`Error::InvalidPath`] if `path`
    /// names a directory, and with [`Error::PathNotFound`] if `path` is unreachable from root.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn get_content_ctx(&self, ctx: &Context, path: &str) -> Result<Vec<u8>, Error> {
        Self::require_valid(path)?;
        let guard = self.core.read();
        let maint = DirectoryMaintainer::new(&guard);
        if !maint.child_exists(ctx, path)? {
            return Err(Error::path_not_found(path));
        }
        let meta = guard.get_metadata(ctx, path)?;
        if meta.is_dir {
            return Err(Error::invalid_path(path));
        }
        guard.get_data(ctx, path)
    }

    /// Overwrites (or creates) the file at `path` with `bytes`, then runs the directory
    /// maintainer so every ancestor knows about it.
    #[instrument(skip(self, ctx, bytes), level = "debug")]
    pub fn put_content_ctx(&self, ctx: &Context, path: &str, bytes: &[u8]) -> Result<(), Error> {
        Self::require_valid(path)?;
        if path == ROOT {
            return Err(Error::invalid_path(path));
        }
        let guard = self.core.write();
        guard.put_data(ctx, path, bytes)?;
        guard.put_metadata(ctx, &Metadata::new_file(path, unix_now(), bytes.len() as u64))?;
        DirectoryMaintainer::new(&guard).maintain(ctx, path)
    }

    /// Opens a seekable reader over the file at `path`, seeked to `offset` bytes from the start.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn reader_ctx(&self, ctx: &Context, path: &str, offset: i64) -> Result<Box<dyn SeekableReader>, Error> {
        Self::require_valid(path)?;
        if offset < 0 {
            return Err(Error::InvalidOffset {
                path: path.to_string(),
                offset,
            });
        }
        let guard = self.core.read();
        let maint = DirectoryMaintainer::new(&guard);
        if !maint.child_exists(ctx, path)? {
            return Err(Error::path_not_found(path));
        }
        let mut reader = guard.open_data_reader(ctx, path)?;
        std::io::Seek::seek(&mut reader, std::io::SeekFrom::Start(offset as u64)).map_err(Error::chunk_io)?;
        Ok(reader)
    }

    /// Returns the metadata summary for `path`, whether file or directory.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn stat_ctx(&self, ctx: &Context, path: &str) -> Result<Stat, Error> {
        Self::require_valid(path)?;
        let guard = self.core.read();
        Ok(guard.get_metadata(ctx, path)?.into())
    }

    /// Lists the full paths of `path`'s immediate children. Fails with [`Error::InvalidPath`] if
    /// `path` names a file.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn list_ctx(&self, ctx: &Context, path: &str) -> Result<Vec<String>, Error> {
        Self::require_valid(path)?;
        let guard = self.core.read();
        let maint = DirectoryMaintainer::new(&guard);
        if !maint.child_exists(ctx, path)? {
            return Err(Error::path_not_found(path));
        }
        let meta = guard.get_metadata(ctx, path)?;
        if !meta.is_dir {
            return Err(Error::invalid_path(path));
        }
        Ok(meta
            .children
            .iter()
            .map(|name| path::join_basename(path, name))
            .collect())
    }

    /// Removes `path`: detaches its basename from its parent and zeroes its own `data`/`mtdt`
    /// pointers. Does **not** recurse into descendants. A directory deleted this way leaves its
    /// former children's pointers intact but unreachable from root.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn delete_ctx(&self, ctx: &Context, path: &str) -> Result<(), Error> {
        Self::require_valid(path)?;
        let guard = self.core.write();
        let maint = DirectoryMaintainer::new(&guard);
        if path != ROOT {
            maint.remove_child(ctx, &path::parent(path), path::basename(path))?;
        }
        guard.delete_data(ctx, path)?;
        guard.delete_metadata(ctx, path)
    }

    /// Moves the subtree rooted at `src` to `dst`: copies metadata and (pointer-only) data for
    /// every node in the subtree to their new paths, attaches `dst` to its parent, detaches `src`
    /// from its parent, and then nullifies every pointer in the source subtree so it is no longer
    /// directly resolvable either, since `stat(src)` must fail once a move completes.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn move_path_ctx(&self, ctx: &Context, src: &str, dst: &str) -> Result<(), Error> {
        Self::require_valid(src)?;
        Self::require_valid(dst)?;
        if src == ROOT {
            return Err(Error::invalid_path(src));
        }
        if dst == ROOT {
            return Err(Error::invalid_path(dst));
        }
        let guard = self.core.write();
        // Fail fast if the source doesn't exist at all.
        guard.get_metadata(ctx, src)?;

        Self::copy_subtree(&guard, ctx, src, dst)?;
        DirectoryMaintainer::new(&guard).maintain(ctx, dst)?;
        DirectoryMaintainer::new(&guard).remove_child(ctx, &path::parent(src), path::basename(src))?;
        Self::nullify_subtree(&guard, ctx, src)
    }

    fn copy_subtree(store: &NodeStore, ctx: &Context, src: &str, dst: &str) -> Result<(), Error> {
        let meta = store.get_metadata(ctx, src)?;
        if !meta.is_dir {
            store.copy_data_pointer(ctx, src, dst)?;
        }
        let new_meta = Metadata {
            is_dir: meta.is_dir,
            path: dst.to_string(),
            mod_time: unix_now(),
            size: meta.size,
            children: meta.children.clone(),
        };
        store.put_metadata(ctx, &new_meta)?;
        for child in &meta.children {
            let src_child = path::join_basename(src, child);
            let dst_child = path::join_basename(dst, child);
            Self::copy_subtree(store, ctx, &src_child, &dst_child)?;
        }
        Ok(())
    }

    fn nullify_subtree(store: &NodeStore, ctx: &Context, path: &str) -> Result<(), Error> {
        let meta = match store.get_metadata(ctx, path) {
            Ok(m) => m,
            Err(Error::PathNotFound { .. }) => return Ok(()),
            Err(e) => return Err(e),
        };
        for child in &meta.children {
            Self::nullify_subtree(store, ctx, &path::join_basename(path, child))?;
        }
        store.delete_data(ctx, path)?;
        store.delete_metadata(ctx, path)
    }

    /// Opens a buffered writer over `path`. If `append`, the buffer is seeded from the path's
    /// current content.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn writer_ctx(&self, ctx: &Context, path: &str, append: bool) -> Result<Writer, Error> {
        Self::require_valid(path)?;
        if path == ROOT {
            return Err(Error::invalid_path(path));
        }
        ctx.check()?;
        Writer::new(self.core.clone(), path.to_string(), append)
    }

    /// Not supported by this backend; documented as a no-op.
    pub fn redirect_url_ctx(&self, _ctx: &Context, _path: &str) -> Option<String> {
        None
    }

    /// Depth-first walk of the metadata tree rooted at `path`, invoking `visit` for every node
    /// (the node itself, then each child in order), built as a DFS over the same metadata the
    /// rest of the driver already maintains.
    #[instrument(skip(self, ctx, visit), level = "debug")]
    pub fn walk_ctx(&self, ctx: &Context, path: &str, visit: &mut dyn FnMut(&Stat) -> Result<(), Error>) -> Result<(), Error> {
        Self::require_valid(path)?;
        let guard = self.core.read();
        Self::walk_node(&guard, ctx, path, visit)
    }

    fn walk_node(store: &NodeStore, ctx: &Context, path: &str, visit: &mut dyn FnMut(&Stat) -> Result<(), Error>) -> Result<(), Error> {
        ctx.check()?;
        let meta = store.get_metadata(ctx, path)?;
        let children = meta.children.clone();
        let is_dir = meta.is_dir;
        visit(&meta.into())?;
        if is_dir {
            for child in &children {
                Self::walk_node(store, ctx, &path::join_basename(path, child), visit)?;
            }
        }
        Ok(())
    }
}

impl StorageDriver for Driver {
    fn get_content(&self, path: &str) -> Result<Vec<u8>, Error> {
        self.get_content_ctx(&Context::background(), path)
    }

    fn put_content(&self, path: &str, bytes: &[u8]) -> Result<(), Error> {
        self.put_content_ctx(&Context::background(), path, bytes)
    }

    fn reader(&self, path: &str, offset: i64) -> Result<Box<dyn SeekableReader>, Error> {
        self.reader_ctx(&Context::background(), path, offset)
    }

    fn stat(&self, path: &str) -> Result<Stat, Error> {
        self.stat_ctx(&Context::background(), path)
    }

    fn list(&self, path: &str) -> Result<Vec<String>, Error> {
        self.list_ctx(&Context::background(), path)
    }

    fn delete(&self, path: &str) -> Result<(), Error> {
        self.delete_ctx(&Context::background(), path)
    }

    fn move_path(&self, src: &str, dst: &str) -> Result<(), Error> {
        self.move_path_ctx(&Context::background(), src, dst)
    }

    fn writer(&self, path: &str, append: bool) -> Result<Writer, Error> {
        self.writer_ctx(&Context::background(), path, append)
    }

    fn redirect_url(&self, path: &str) -> Option<String> {
        self.redirect_url_ctx(&Context::background(), path)
    }

    fn walk(&self, path: &str, visit: &mut dyn FnMut(&Stat) -> Result<(), Error>) -> Result<(), Error> {
        self.walk_ctx(&Context::background(), path, visit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::MemChunkStore;
    use crate::config::{DriverConfig, OwnerId};
    use crate::pointer::MemPointerService;
    use assert_matches::assert_matches;

    fn new_driver() -> Driver {
        Driver::new(
            DriverConfig::new()
                .owner(OwnerId([0u8; 20]))
                .store(Box::new(MemChunkStore::new()))
                .pointers(Box::new(MemPointerService::new())),
        )
        .unwrap()
    }

    // S1, round-trip.
    #[test]
    fn s1_round_trip() {
        let d = new_driver();
        d.put_content("/a/b", b"hello").unwrap();
        assert_eq!(d.get_content("/a/b").unwrap(), b"hello");
        let st = d.stat("/a/b").unwrap();
        assert!(!st.is_dir);
        assert_eq!(st.size, 5);
        assert_eq!(d.list("/a").unwrap(), vec!["/a/b".to_string()]);
        assert!(d.list("/").unwrap().contains(&"/a".to_string()));
    }

    // S2, overwrite.
    #[test]
    fn s2_overwrite() {
        let d = new_driver();
        d.put_content("/x", b"A").unwrap();
        d.put_content("/x", b"BBB").unwrap();
        assert_eq!(d.get_content("/x").unwrap(), b"BBB");
        assert_eq!(d.stat("/x").unwrap().size, 3);
        let root_children = d.list("/").unwrap();
        assert_eq!(root_children.iter().filter(|p| *p == "/x").count(), 1);
    }

    // S3, append writer.
    #[test]
    fn s3_append_writer() {
        let d = new_driver();
        d.put_content("/f", b"abc").unwrap();
        let mut w = d.writer("/f", true).unwrap();
        w.write(b"def").unwrap();
        w.commit().unwrap();
        assert_eq!(d.get_content("/f").unwrap(), b"abcdef");
    }

    // S4, cancel writer.
    #[test]
    fn s4_cancel_writer() {
        let d = new_driver();
        d.put_content("/f", b"orig").unwrap();
        let mut w = d.writer("/f", false).unwrap();
        w.write(b"zz").unwrap();
        w.cancel().unwrap();
        assert_matches!(w.commit(), Err(Error::WriterState { .. }));
        assert_eq!(d.get_content("/f").unwrap(), b"orig");
    }

    // S5, move subtree.
    #[test]
    fn s5_move_subtree() {
        let d = new_driver();
        d.put_content("/a/b/c", b"X").unwrap();
        d.move_path("/a", "/q").unwrap();
        assert_eq!(d.get_content("/q/b/c").unwrap(), b"X");
        assert_matches!(d.stat("/a/b/c"), Err(Error::PathNotFound { .. }));
        assert_matches!(d.stat("/a"), Err(Error::PathNotFound { .. }));
        assert!(d.list("/").unwrap().contains(&"/q".to_string()));
    }

    // S6, delete leaf.
    #[test]
    fn s6_delete_leaf() {
        let d = new_driver();
        d.put_content("/p", b"Y").unwrap();
        d.delete("/p").unwrap();
        assert_matches!(d.get_content("/p"), Err(Error::PathNotFound { .. }));
        assert!(!d.list("/").unwrap().contains(&"/p".to_string()));
    }

    // S7, invalid paths.
    #[test]
    fn s7_invalid_paths() {
        let d = new_driver();
        for bad in ["", "a/b", "/a/", "/a//b", "/a*b"] {
            assert_matches!(d.get_content(bad), Err(Error::InvalidPath { .. }));
            assert_matches!(d.put_content(bad, b"x"), Err(Error::InvalidPath { .. }));
        }
        // "/" is a valid directory path but not a valid *file* target.
        assert_matches!(d.get_content("/"), Err(Error::InvalidPath { .. }));
        assert_matches!(d.put_content("/", b"x"), Err(Error::InvalidPath { .. }));
    }

    // S8, reader offset.
    #[test]
    fn s8_reader_offset() {
        let d = new_driver();
        d.put_content("/f", b"abcdef").unwrap();
        let mut reader = d.reader("/f", 2).unwrap();
        let mut out = Vec::new();
        std::io::Read::read_to_end(&mut reader, &mut out).unwrap();
        assert_eq!(out, b"cdef");
        assert_matches!(d.reader("/f", -1), Err(Error::InvalidOffset { .. }));
    }

    #[test]
    fn get_content_on_directory_is_invalid_path() {
        let d = new_driver();
        d.put_content("/a/b", b"x").unwrap();
        assert_matches!(d.get_content("/a"), Err(Error::InvalidPath { .. }));
    }

    #[test]
    fn list_on_file_is_invalid_path() {
        let d = new_driver();
        d.put_content("/a", b"x").unwrap();
        assert_matches!(d.list("/a"), Err(Error::InvalidPath { .. }));
    }

    #[test]
    fn list_empty_directory_is_empty_not_an_error() {
        let d = new_driver();
        d.put_content("/a/b", b"x").unwrap();
        d.delete("/a/b").unwrap();
        // "/a" itself was created by the directory maintainer and has no children left.
        assert_eq!(d.list("/a").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn delete_does_not_recurse_into_descendants() {
        let d = new_driver();
        d.put_content("/a/b", b"x").unwrap();
        d.delete("/a").unwrap();
        assert_matches!(d.stat("/a"), Err(Error::PathNotFound { .. }));
        // "/a" is gone from root's listing...
        assert!(!d.list("/").unwrap().contains(&"/a".to_string()));
        // ...but "/a/b"'s own pointers were never touched by a non-recursive delete, so its
        // metadata is still directly resolvable even though it is unreachable from root.
        assert!(d.stat("/a/b").is_ok());
    }

    #[test]
    fn redirect_url_is_always_none() {
        let d = new_driver();
        d.put_content("/a", b"x").unwrap();
        assert_eq!(d.redirect_url("/a"), None);
    }

    #[test]
    fn walk_visits_every_node_depth_first() {
        let d = new_driver();
        d.put_content("/a/b", b"1").unwrap();
        d.put_content("/a/c", b"22").unwrap();
        d.put_content("/z", b"3").unwrap();

        let mut seen = Vec::new();
        d.walk("/", &mut |stat| {
            seen.push(stat.path.clone());
            Ok(())
        })
        .unwrap();

        for expected in ["/", "/a", "/a/b", "/a/c", "/z"] {
            assert!(seen.contains(&expected.to_string()), "missing {expected} in {seen:?}");
        }
        // "/" must be visited before its descendants.
        assert_eq!(seen[0], "/");
    }

    #[test]
    fn move_into_nonexistent_destination_parent_creates_it() {
        let d = new_driver();
        d.put_content("/src", b"v").unwrap();
        d.move_path("/src", "/new/dst").unwrap();
        assert_eq!(d.get_content("/new/dst").unwrap(), b"v");
        assert!(d.list("/new").unwrap().contains(&"/new/dst".to_string()));
    }

    #[test]
    fn move_nonexistent_source_is_path_not_found() {
        let d = new_driver();
        assert_matches!(d.move_path("/nope", "/dst"), Err(Error::PathNotFound { .. }));
    }
}
