//! The pointer façade over a named, time-indexed feed, in the shape of
//! `sn/src/client/client_api/register_apis.rs`'s publish/lookup surface over a CRDT register log.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use tracing::{instrument, trace};

use crate::address::ChunkAddress;
use crate::error::Error;

/// A pointer topic: always `<path>/<suffix>`, `suffix` one of [`Topic::DATA`]/[`Topic::MTDT`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Topic(String);

impl Topic {
    /// Suffix for a node's payload pointer.
    pub const DATA: &'static str = "data";
    /// Suffix for a node's metadata pointer.
    pub const MTDT: &'static str = "mtdt";

    /// Builds the topic `path/suffix`.
    pub fn new(path: &str, suffix: &str) -> Self {
        Self(format!("{path}/{suffix}"))
    }

    /// The `path/data` topic for `path`.
    pub fn data(path: &str) -> Self {
        Self::new(path, Self::DATA)
    }

    /// The `path/mtdt` topic for `path`.
    pub fn mtdt(path: &str) -> Self {
        Self::new(path, Self::MTDT)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The opaque, external pointer feed collaborator: an append-only, owner-scoped log per topic
/// supporting "publish at time" and "lookup latest entry at or before time". Implementations
/// are provided by the host application; this crate depends only on this trait.
pub trait PointerService: Send + Sync {
    /// Appends `(time, addr)` to `topic`'s log.
    fn publish(&self, topic: &Topic, time: u64, addr: ChunkAddress) -> Result<(), Error>;

    /// Returns the most recent entry in `topic`'s log with `entry.time <= time`.
    ///
    /// Fails with [`Error::Pointer`] if the topic has no such entry (including an empty topic).
    fn lookup(&self, topic: &Topic, time: u64) -> Result<ChunkAddress, Error>;
}

/// A thin façade retained for symmetry with [`crate::chunk::ChunkIo`] and as the single place the
/// core calls into the pointer service, so every publish/lookup is traced uniformly.
pub struct PointerIo {
    service: Box<dyn PointerService>,
}

impl PointerIo {
    /// Wraps `service`.
    pub fn new(service: Box<dyn PointerService>) -> Self {
        Self { service }
    }

    /// See [`PointerService::publish`].
    #[instrument(skip(self), level = "trace")]
    pub fn publish(&self, topic: &Topic, time: u64, addr: ChunkAddress) -> Result<(), Error> {
        trace!(%topic, time, %addr, "publishing pointer");
        self.service.publish(topic, time, addr)
    }

    /// See [`PointerService::lookup`].
    #[instrument(skip(self), level = "trace")]
    pub fn lookup(&self, topic: &Topic, time: u64) -> Result<ChunkAddress, Error> {
        let addr = self.service.lookup(topic, time)?;
        trace!(%topic, time, %addr, "looked up pointer");
        Ok(addr)
    }
}

/// An in-memory [`PointerService`] reference implementation, backing each topic with a
/// time-ordered `Vec` of entries rather than a real feed/CRDT register.
#[derive(Default)]
pub struct MemPointerService {
    topics: RwLock<HashMap<Topic, Vec<(u64, ChunkAddress)>>>,
}

impl MemPointerService {
    /// An empty in-memory pointer service.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PointerService for MemPointerService {
    fn publish(&self, topic: &Topic, time: u64, addr: ChunkAddress) -> Result<(), Error> {
        let mut topics = self.topics.write();
        let entries = topics.entry(topic.clone()).or_default();
        entries.push((time, addr));
        entries.sort_by_key(|(t, _)| *t);
        Ok(())
    }

    fn lookup(&self, topic: &Topic, time: u64) -> Result<ChunkAddress, Error> {
        let topics = self.topics.read();
        let entries = topics
            .get(topic)
            .ok_or_else(|| Error::pointer(format!("topic {topic} has no entries")))?;
        entries
            .iter()
            .rev()
            .find(|(t, _)| *t <= time)
            .map(|(_, addr)| *addr)
            .ok_or_else(|| Error::pointer(format!("topic {topic} has no entry at or before {time}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> ChunkAddress {
        ChunkAddress::new(xor_name::XorName([byte; 32]))
    }

    #[test]
    fn lookup_returns_latest_entry_at_or_before_time() {
        let svc = MemPointerService::new();
        let topic = Topic::new("/a", Topic::DATA);
        svc.publish(&topic, 10, addr(1)).unwrap();
        svc.publish(&topic, 20, addr(2)).unwrap();
        assert_eq!(svc.lookup(&topic, 15).unwrap(), addr(1));
        assert_eq!(svc.lookup(&topic, 20).unwrap(), addr(2));
        assert_eq!(svc.lookup(&topic, 1000).unwrap(), addr(2));
    }

    #[test]
    fn lookup_before_first_entry_fails() {
        let svc = MemPointerService::new();
        let topic = Topic::new("/a", Topic::DATA);
        svc.publish(&topic, 10, addr(1)).unwrap();
        assert!(matches!(svc.lookup(&topic, 5), Err(Error::Pointer { .. })));
    }

    #[test]
    fn lookup_on_empty_topic_fails() {
        let svc = MemPointerService::new();
        let topic = Topic::new("/missing", Topic::MTDT);
        assert!(matches!(svc.lookup(&topic, 0), Err(Error::Pointer { .. })));
    }

    #[test]
    fn out_of_order_publish_is_still_ordered_by_time() {
        let svc = MemPointerService::new();
        let topic = Topic::new("/a", Topic::DATA);
        svc.publish(&topic, 20, addr(2)).unwrap();
        svc.publish(&topic, 10, addr(1)).unwrap();
        assert_eq!(svc.lookup(&topic, 10).unwrap(), addr(1));
        assert_eq!(svc.lookup(&topic, 20).unwrap(), addr(2));
    }
}
