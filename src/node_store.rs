//! Read/write a single node's `data` and `mtdt` pointers, composing [`ChunkIo`] and [`PointerIo`]
//! the way `sn/src/client/client_api/file_apis.rs` composes chunk retrieval with decoding, and
//! `register_apis.rs` composes a write with its publish.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::instrument;

use crate::address::ChunkAddress;
use crate::chunk::{ChunkIo, SeekableReader};
use crate::context::Context;
use crate::error::Error;
use crate::metadata::Metadata;
use crate::pointer::{PointerIo, Topic};

/// Current wall-clock time in unix seconds, used for every publish.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before the unix epoch")
        .as_secs()
}

/// Owns the chunk and pointer façades and implements the per-node read/write primitives the
/// rest of the core (directory maintainer, filesystem API, writer) builds on.
pub struct NodeStore {
    chunks: ChunkIo,
    pointers: PointerIo,
}

impl NodeStore {
    /// Builds a node store over the given chunk and pointer façades.
    pub fn new(chunks: ChunkIo, pointers: PointerIo) -> Self {
        Self { chunks, pointers }
    }

    /// Loads and decodes the metadata record for `path`.
    ///
    /// Fails with [`Error::PathNotFound`] if the `mtdt` pointer has no entry, or resolves to the
    /// zero address (a node whose metadata was deleted).
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn get_metadata(&self, ctx: &Context, path: &str) -> Result<Metadata, Error> {
        ctx.check()?;
        let topic = Topic::mtdt(path);
        let addr = self
            .pointers
            .lookup(&topic, unix_now())
            .map_err(|_| Error::path_not_found(path))?;
        if addr.is_zero() {
            return Err(Error::path_not_found(path));
        }
        ctx.check()?;
        let mut reader = self.chunks.join(addr)?;
        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut reader, &mut bytes).map_err(Error::chunk_io)?;
        Metadata::decode(&bytes)
    }

    /// Encodes and publishes `meta` under its own `mtdt` topic.
    #[instrument(skip(self, ctx, meta), level = "debug")]
    pub fn put_metadata(&self, ctx: &Context, meta: &Metadata) -> Result<(), Error> {
        ctx.check()?;
        let encoded = meta.encode()?;
        let addr = self.chunks.split(&encoded)?;
        ctx.check()?;
        self.pointers.publish(&Topic::mtdt(&meta.path), unix_now(), addr)
    }

    /// Loads the full payload bytes for `path`.
    ///
    /// An empty file (zero address published deliberately) yields an empty `Vec`, the same as a
    /// file whose content happens to be zero bytes, both are legitimate "no content".
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn get_data(&self, ctx: &Context, path: &str) -> Result<Vec<u8>, Error> {
        ctx.check()?;
        let addr = self
            .pointers
            .lookup(&Topic::data(path), unix_now())
            .map_err(|_| Error::path_not_found(path))?;
        if addr.is_zero() {
            return Ok(Vec::new());
        }
        ctx.check()?;
        let mut reader = self.chunks.join(addr)?;
        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut reader, &mut bytes).map_err(Error::chunk_io)?;
        Ok(bytes)
    }

    /// Publishes `bytes` as `path`'s payload. Empty content publishes the zero address as the
    /// sentinel for "empty file", rather than round-tripping an empty chunk.
    #[instrument(skip(self, ctx, bytes), level = "debug")]
    pub fn put_data(&self, ctx: &Context, path: &str, bytes: &[u8]) -> Result<(), Error> {
        ctx.check()?;
        let addr = if bytes.is_empty() {
            ChunkAddress::ZERO
        } else {
            self.chunks.split(bytes)?
        };
        ctx.check()?;
        self.pointers.publish(&Topic::data(path), unix_now(), addr)
    }

    /// Publishes the zero address to `path`'s `data` topic.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn delete_data(&self, ctx: &Context, path: &str) -> Result<(), Error> {
        ctx.check()?;
        self.pointers.publish(&Topic::data(path), unix_now(), ChunkAddress::ZERO)
    }

    /// Publishes the zero address to `path`'s `mtdt` topic.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn delete_metadata(&self, ctx: &Context, path: &str) -> Result<(), Error> {
        ctx.check()?;
        self.pointers.publish(&Topic::mtdt(path), unix_now(), ChunkAddress::ZERO)
    }

    /// Opens a seekable reader directly over `path`'s current payload, without buffering the
    /// whole thing through a `Vec` first (unlike [`NodeStore::get_data`]). A node whose `data`
    /// topic resolves to the zero address (an empty or deleted file) yields an empty reader.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn open_data_reader(&self, ctx: &Context, path: &str) -> Result<Box<dyn SeekableReader>, Error> {
        ctx.check()?;
        let addr = self
            .pointers
            .lookup(&Topic::data(path), unix_now())
            .map_err(|_| Error::path_not_found(path))?;
        if addr.is_zero() {
            return Ok(Box::new(std::io::Cursor::new(Vec::new())));
        }
        ctx.check()?;
        self.chunks.join(addr)
    }

    /// Copies `src_path`'s current `data` pointer onto `dst_path`, without touching chunk
    /// content: a move is pointer-only, chunks are shared by content address. A `src_path` that
    /// never had a `data` topic published (a pure directory) is left alone.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn copy_data_pointer(&self, ctx: &Context, src_path: &str, dst_path: &str) -> Result<(), Error> {
        ctx.check()?;
        match self.pointers.lookup(&Topic::data(src_path), unix_now()) {
            Ok(addr) => {
                ctx.check()?;
                self.pointers.publish(&Topic::data(dst_path), unix_now(), addr)
            }
            Err(_) => Ok(()),
        }
    }
}
