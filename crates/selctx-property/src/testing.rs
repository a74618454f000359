//! Test doubles shared by the unit test modules.

use std::cell::Cell;
use std::path::{Path, PathBuf};

use selctx_label::InMemoryAccessor;

use crate::error::{ResourceError, ResourceResult};
use crate::resource::ManagedResource;

pub(crate) const INDEX: &str = "/var/www/html/index.html";

/// Resource whose existence mirrors the in-memory label store.
pub(crate) struct StoreResource<'a> {
    path: PathBuf,
    store: &'a InMemoryAccessor,
    created_label: Option<&'static str>,
    creations: Cell<usize>,
}

impl<'a> StoreResource<'a> {
    /// Resource at [`INDEX`]; creation stores `created_label` or fails when `None`.
    pub(crate) fn new(store: &'a InMemoryAccessor, created_label: Option<&'static str>) -> Self {
        Self {
            path: PathBuf::from(INDEX),
            store,
            created_label,
            creations: Cell::new(0),
        }
    }

    pub(crate) fn creations(&self) -> usize {
        self.creations.get()
    }
}

impl ManagedResource for StoreResource<'_> {
    fn path(&self) -> &Path {
        &self.path
    }

    fn exists(&self) -> bool {
        self.store.raw_label(&self.path).is_some()
    }

    fn ensure_exists(&self) -> ResourceResult<()> {
        self.creations.set(self.creations.get() + 1);
        match self.created_label {
            Some(label) => {
                self.store.insert_label(&self.path, label);
                Ok(())
            }
            None => Err(ResourceError::Missing {
                path: self.path.clone(),
            }),
        }
    }
}
