//! Driver construction parameters, validated eagerly rather than deferred to first use.

use crate::chunk::ChunkStore;
use crate::error::Error;
use crate::pointer::PointerService;

/// A 20-byte account identity, namespacing the pointer feed topics this driver publishes under.
///
/// The identity itself is opaque to this crate (key generation and signing are the host
/// application's concern); it is carried only so a future multi-owner host can disambiguate feeds.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct OwnerId(pub [u8; 20]);

/// Builder for a [`crate::driver::Driver`]'s configuration. Mirrors `sn_api`'s connection
/// builders, which validate required identity/endpoint fields before constructing a client
/// rather than failing lazily on first use.
pub struct DriverConfig {
    owner: Option<OwnerId>,
    store: Option<Box<dyn ChunkStore>>,
    pointers: Option<Box<dyn PointerService>>,
    encrypt: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            owner: None,
            store: None,
            pointers: None,
            encrypt: false,
        }
    }
}

impl DriverConfig {
    /// Starts an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the owner identity for the pointer feed namespace.
    pub fn owner(mut self, owner: OwnerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Sets the chunk store handle.
    pub fn store(mut self, store: Box<dyn ChunkStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the pointer service handle.
    pub fn pointers(mut self, pointers: Box<dyn PointerService>) -> Self {
        self.pointers = Some(pointers);
        self
    }

    /// Sets the `encrypt` flag threaded through every `split`. Defaults to `false`.
    pub fn encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    /// Validates and consumes this configuration into its parts, or fails with
    /// [`Error::Config`] if `owner`, `store`, or `pointers` were never supplied.
    pub(crate) fn build(self) -> Result<(OwnerId, Box<dyn ChunkStore>, Box<dyn PointerService>, bool), Error> {
        let owner = self
            .owner
            .ok_or_else(|| Error::Config { detail: "missing required parameter: owner".into() })?;
        let store = self
            .store
            .ok_or_else(|| Error::Config { detail: "missing required parameter: store".into() })?;
        let pointers = self
            .pointers
            .ok_or_else(|| Error::Config { detail: "missing required parameter: pointers".into() })?;
        Ok((owner, store, pointers, self.encrypt))
    }
}
