//! Batch document operations behind the CLI command surface.

pub mod annotate;
pub mod compress;
pub mod document;
pub mod ocr;
pub mod redact;
pub mod sign;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::warn;

use crate::engine::{Document, SaveMode};
use crate::error::Result;

/// Cooperative cancellation flag for long batch loops.
///
/// Checked once per page/image unit, never preemptively: a canceled
/// operation stops before the next unit and discards only output it has
/// not produced yet.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress callback: (completed units, total units).
pub type Progress<'a> = &'a mut dyn FnMut(usize, usize);

/// Save with a linearized layout, retrying once without linearization
/// when the engine rejects it.
pub fn save_linearized<D: Document>(doc: &mut D, path: &Path) -> Result<()> {
    match doc.save(path, SaveMode::Linearized) {
        Ok(()) => Ok(()),
        Err(err) => {
            warn!("linearized save of {} failed ({err}), retrying without linearization", path.display());
            doc.save(path, SaveMode::Compressed)
        }
    }
}
