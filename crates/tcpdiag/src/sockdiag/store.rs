//! Growable sample store.

use std::time::Duration;

use crate::netlink::{Error, Result};

use super::sample::Sample;

/// Capacity allocated by the first append after a reset.
pub const INITIAL_CAPACITY: usize = 16;

/// Append-only collection of [`Sample`]s produced by one sampling call.
///
/// Capacity starts at [`INITIAL_CAPACITY`] and doubles whenever an append
/// finds the store full. Growth goes through a fallible reservation, so an
/// allocation failure surfaces as [`Error::OutOfMemory`] instead of aborting
/// the process.
#[derive(Debug, Default)]
pub struct SampleStore {
    samples: Vec<Sample>,
    cap: usize,
    elapsed: Duration,
}

impl SampleStore {
    /// Create an empty store. Nothing is allocated until the first append.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the backing storage and return to the empty state.
    pub fn reset(&mut self) {
        self.samples = Vec::new();
        self.cap = 0;
        self.elapsed = Duration::ZERO;
    }

    /// Append a sample, growing the store first if it is full.
    pub fn append(&mut self, sample: Sample) -> Result<()> {
        if self.samples.len() == self.cap {
            self.grow()?;
        }
        self.samples.push(sample);
        Ok(())
    }

    fn grow(&mut self) -> Result<()> {
        let requested = if self.cap == 0 {
            INITIAL_CAPACITY
        } else {
            self.cap
                .checked_mul(2)
                .ok_or(Error::OutOfMemory { requested: usize::MAX })?
        };

        self.samples
            .try_reserve_exact(requested - self.samples.len())
            .map_err(|_| Error::OutOfMemory { requested })?;
        self.cap = requested;
        Ok(())
    }

    /// Give up the store and everything it owns.
    pub fn release(self) {}

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the store holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Slots available before the next growth.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Sample at `index`, in append order.
    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Iterate samples in append order.
    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_vec(self) -> Vec<Sample> {
        self.samples
    }

    /// How long the sampling call that filled this store took.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub(crate) fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }
}

impl Clone for SampleStore {
    fn clone(&self) -> Self {
        let samples = self.samples.clone();
        // The clone's allocation may be smaller than ours.
        Self {
            cap: samples.capacity(),
            samples,
            elapsed: self.elapsed,
        }
    }
}

impl<'a> IntoIterator for &'a SampleStore {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

impl IntoIterator for SampleStore {
    type Item = Sample;
    type IntoIter = std::vec::IntoIter<Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.into_iter()
    }
}
