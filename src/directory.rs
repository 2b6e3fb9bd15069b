//! The directory maintainer, the upward child-list upkeep protocol that keeps every ancestor's
//! `children` list in sync with what actually lives below it. Built the way
//! `sn_api/src/app/files/files_map.rs::add_or_update_file_item` folds one new entry into an
//! existing map, generalised here to walk as many ancestors as necessary.

use tracing::{debug, instrument};

use crate::error::Error;
use crate::metadata::Metadata;
use crate::node_store::{unix_now, NodeStore};
use crate::path::{self, ROOT};

/// Maintains the invariant that every live node's basename is listed in its parent's `children`,
/// propagating upward only as far as necessary.
pub struct DirectoryMaintainer<'a> {
    store: &'a NodeStore,
}

impl<'a> DirectoryMaintainer<'a> {
    /// Builds a maintainer over the given node store.
    pub fn new(store: &'a NodeStore) -> Self {
        Self { store }
    }

    /// Ensures root metadata exists, creating an empty directory record if absent. Called once at
    /// driver construction.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn bootstrap_root(&self, ctx: &crate::context::Context) -> Result<(), Error> {
        match self.store.get_metadata(ctx, ROOT) {
            Ok(_) => Ok(()),
            Err(Error::PathNotFound { .. }) => {
                self.store.put_metadata(ctx, &Metadata::new_dir(ROOT, unix_now()))
            }
            Err(e) => Err(e),
        }
    }

    /// After `p`'s own metadata has been published, walks upward ensuring every ancestor's
    /// `children` list names the node immediately below it, stopping at the first ancestor that
    /// already lists its child.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn maintain(&self, ctx: &crate::context::Context, p: &str) -> Result<(), Error> {
        if p == ROOT {
            return Ok(());
        }
        let mut child_path = p.to_string();
        loop {
            let cur = path::parent(&child_path);
            let name = path::basename(&child_path).to_string();

            let mut parent_meta = match self.store.get_metadata(ctx, &cur) {
                Ok(m) => m,
                Err(Error::PathNotFound { .. }) => Metadata::new_dir(cur.clone(), unix_now()),
                Err(e) => return Err(e),
            };

            let added = parent_meta.add_child_if_absent(&name, unix_now());
            if !added {
                debug!(ancestor = %cur, child = %name, "child already known, stopping propagation");
                break;
            }
            self.store.put_metadata(ctx, &parent_meta)?;

            if cur == ROOT {
                break;
            }
            child_path = cur;
        }
        Ok(())
    }

    /// True iff `p` is the root, or `p`'s parent's metadata lists `p`'s basename.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn child_exists(&self, ctx: &crate::context::Context, p: &str) -> Result<bool, Error> {
        if p == ROOT {
            return Ok(true);
        }
        let parent = path::parent(p);
        let name = path::basename(p);
        match self.store.get_metadata(ctx, &parent) {
            Ok(m) => Ok(m.children.iter().any(|c| c == name)),
            Err(Error::PathNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Removes `child_name` from the directory at `parent_path`, republishing its metadata if a
    /// removal actually happened. A no-op (not an error) if `parent_path` has no metadata at all.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn remove_child(&self, ctx: &crate::context::Context, parent_path: &str, child_name: &str) -> Result<(), Error> {
        let mut parent_meta = match self.store.get_metadata(ctx, parent_path) {
            Ok(m) => m,
            Err(Error::PathNotFound { .. }) => return Ok(()),
            Err(e) => return Err(e),
        };
        if parent_meta.remove_child(child_name, unix_now()) {
            self.store.put_metadata(ctx, &parent_meta)?;
        }
        Ok(())
    }
}
