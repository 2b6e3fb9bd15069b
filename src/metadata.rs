//! Node metadata records and their self-describing, tolerant-of-extras encoding, following the
//! same pattern `sn_api`'s `FileInfo` attribute maps use.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Metadata record published under a node's `mtdt` pointer topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Whether this node is a directory.
    pub is_dir: bool,
    /// The node's absolute path.
    pub path: String,
    /// Unix seconds of the last publish that modified this node.
    pub mod_time: u64,
    /// Payload size in bytes; always 0 for directories.
    #[serde(default)]
    pub size: u64,
    /// Ordered basenames of this node's children; always empty for files.
    #[serde(default)]
    pub children: Vec<String>,
}

impl Metadata {
    /// A fresh, empty directory record.
    pub fn new_dir(path: impl Into<String>, mod_time: u64) -> Self {
        Self {
            is_dir: true,
            path: path.into(),
            mod_time,
            size: 0,
            children: Vec::new(),
        }
    }

    /// A fresh file record with no children.
    pub fn new_file(path: impl Into<String>, mod_time: u64, size: u64) -> Self {
        Self {
            is_dir: false,
            path: path.into(),
            mod_time,
            size,
            children: Vec::new(),
        }
    }

    /// Appends `name` to `children` if not already present, bumping `mod_time`.
    ///
    /// Returns `true` if the child was newly added.
    pub fn add_child_if_absent(&mut self, name: &str, mod_time: u64) -> bool {
        if self.children.iter().any(|c| c == name) {
            return false;
        }
        self.children.push(name.to_string());
        self.mod_time = mod_time;
        true
    }

    /// Removes `name` from `children` if present, bumping `mod_time`.
    ///
    /// Returns `true` if a child was removed.
    pub fn remove_child(&mut self, name: &str, mod_time: u64) -> bool {
        let before = self.children.len();
        self.children.retain(|c| c != name);
        let removed = self.children.len() != before;
        if removed {
            self.mod_time = mod_time;
        }
        removed
    }

    /// Serialises this record to its on-the-wire, self-describing form.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(Error::chunk_io)
    }

    /// Deserialises a record previously produced by [`Metadata::encode`]. Unknown fields are
    /// ignored; missing optional fields (`size`, `children`) default.
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(bytes).map_err(Error::chunk_io)
    }
}
