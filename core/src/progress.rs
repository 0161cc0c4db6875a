use crate::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Progress sink called synchronously as `(current, total)` after each file.
pub type ProgressFn<'a> = dyn FnMut(u64, u64) + 'a;

/// Shared flag a collaborator can set from any thread to stop a scan or
/// recreation between files.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub(crate) fn check(flag: Option<&CancelFlag>) -> Result<()> {
    match flag {
        Some(flag) if flag.is_cancelled() => Err(Error::Cancelled),
        _ => Ok(()),
    }
}

pub(crate) fn report(progress: &mut Option<&mut ProgressFn<'_>>, current: u64, total: u64) {
    if let Some(callback) = progress.as_mut() {
        callback(current, total);
    }
}
