use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::domain::ApartmentId;

/// Per-apartment mutual exclusion for queue mutations.
///
/// Operations on the same apartment run one at a time in lock-acquisition order;
/// different apartments never contend.
#[derive(Debug, Default)]
pub struct ApartmentLocks {
    locks: Mutex<HashMap<ApartmentId, Arc<Mutex<()>>>>,
}

impl ApartmentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, apartment_id: &ApartmentId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(*apartment_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `critical_section` while holding the apartment's lock.
    pub fn with_apartment<T>(
        &self,
        apartment_id: &ApartmentId,
        critical_section: impl FnOnce() -> T,
    ) -> T {
        let lock = self.lock_for(apartment_id);
        // A panicked holder never committed its snapshot, so the queue behind a
        // poisoned lock is still consistent.
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        critical_section()
    }

    /// Run `critical_section` while holding the locks of every listed apartment.
    ///
    /// Locks are taken in ascending apartment id order so overlapping multi-apartment
    /// sections cannot deadlock each other.
    pub fn with_apartments<T>(
        &self,
        apartment_ids: &[ApartmentId],
        critical_section: impl FnOnce() -> T,
    ) -> T {
        let mut ids = apartment_ids.to_vec();
        ids.sort();
        ids.dedup();
        let locks: Vec<Arc<Mutex<()>>> = ids.iter().map(|id| self.lock_for(id)).collect();
        let _guards: Vec<_> = locks
            .iter()
            .map(|lock| lock.lock().unwrap_or_else(PoisonError::into_inner))
            .collect();
        critical_section()
    }

    pub fn tracked_apartments(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
