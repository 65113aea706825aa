use super::filter_bank::{FilterBank, Sample};
use crate::error::Result;
use crate::filters::{Cascade, FilterSpec};

use std::sync::{Arc, Mutex, MutexGuard};

/// Handle to a [`FilterBank`] shared between the settings thread and the
/// acquisition thread.
///
/// `configure` designs the new cascade and allocates the new state before
/// taking the lock, so the acquisition thread only ever waits for a pointer
/// swap and never sees a cascade or state vector from two configurations.
#[derive(Clone, Default)]
pub struct SharedFilterBank {
    inner: Arc<Mutex<FilterBank>>,
}

impl SharedFilterBank {
    pub fn new(bank: FilterBank) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bank)),
        }
    }

    // A panic while holding the lock cannot leave the bank half-written
    // (configure swaps a whole value), so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, FilterBank> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn configure(&self, num_channels: usize, spec: FilterSpec) -> Result<()> {
        let mut replacement = FilterBank::with_config(num_channels, spec)?;
        let mut bank = self.lock();
        replacement.set_parallel(bank.is_parallel());
        *bank = replacement;
        Ok(())
    }

    pub fn process<S, C>(&self, buffer: &mut [C]) -> Result<()>
    where
        S: Sample,
        C: AsMut<[S]> + Send,
    {
        self.lock().process(buffer)
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn set_parallel(&self, parallel: bool) {
        self.lock().set_parallel(parallel);
    }

    pub fn num_channels(&self) -> usize {
        self.lock().num_channels()
    }

    pub fn is_configured(&self) -> bool {
        self.lock().is_configured()
    }

    pub fn spec(&self) -> Option<FilterSpec> {
        self.lock().spec().copied()
    }

    pub fn cascade(&self) -> Option<Arc<Cascade>> {
        self.lock().cascade().cloned()
    }

    /// Run `f` with the bank locked, e.g. to inspect channel state.
    pub fn with_bank<R>(&self, f: impl FnOnce(&FilterBank) -> R) -> R {
        f(&self.lock())
    }
}
