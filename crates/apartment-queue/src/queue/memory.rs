use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    ApartmentId, Application, ApplicationId, Reservation, ReservationId, ReservationState,
    StateChangeEvent,
};
use super::snapshot::ApartmentQueue;
use super::store::{ReservationStore, StoreError};

/// Process-local reservation store.
///
/// Commits swap a whole apartment queue under one mutex, which gives readers
/// committed-only visibility.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReservationStore {
    state: Arc<Mutex<StoreState>>,
}

#[derive(Debug, Default)]
struct StoreState {
    queues: HashMap<ApartmentId, Vec<Reservation>>,
    index: HashMap<ReservationId, ApartmentId>,
    applications: HashMap<ApplicationId, Application>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("reservation store mutex poisoned".to_string()))
    }

    pub fn apartment_ids(&self) -> Result<Vec<ApartmentId>, StoreError> {
        let state = self.state()?;
        let mut ids: Vec<ApartmentId> = state.queues.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

impl ReservationStore for InMemoryReservationStore {
    fn load_queue(&self, apartment_id: &ApartmentId) -> Result<ApartmentQueue, StoreError> {
        let state = self.state()?;
        let reservations = state.queues.get(apartment_id).cloned().unwrap_or_default();
        Ok(ApartmentQueue::new(*apartment_id, reservations))
    }

    fn commit(&self, queue: ApartmentQueue) -> Result<(), StoreError> {
        let mut state = self.state()?;
        let apartment_id = queue.apartment_id();
        let reservations = queue.into_reservations();
        for reservation in &reservations {
            match state.index.get(&reservation.id) {
                Some(owner) if owner != &apartment_id => return Err(StoreError::Conflict),
                _ => {}
            }
        }
        for reservation in &reservations {
            state.index.insert(reservation.id, apartment_id);
        }
        if let Some(previous) = state.queues.insert(apartment_id, reservations) {
            let StoreState { queues, index, .. } = &mut *state;
            let current = &queues[&apartment_id];
            for dropped in previous
                .iter()
                .filter(|old| current.iter().all(|reservation| reservation.id != old.id))
            {
                index.remove(&dropped.id);
            }
        }
        Ok(())
    }

    fn fetch(&self, id: &ReservationId) -> Result<Option<Reservation>, StoreError> {
        let state = self.state()?;
        let Some(apartment_id) = state.index.get(id) else {
            return Ok(None);
        };
        Ok(state
            .queues
            .get(apartment_id)
            .and_then(|reservations| reservations.iter().find(|r| &r.id == id))
            .cloned())
    }

    fn insert_application(&self, application: Application) -> Result<(), StoreError> {
        let mut state = self.state()?;
        if state.applications.contains_key(&application.id) {
            return Err(StoreError::Conflict);
        }
        state
            .applications
            .insert(application.id.clone(), application);
        Ok(())
    }

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        let state = self.state()?;
        Ok(state.applications.get(id).cloned())
    }

    fn remove_application(&self, id: &ApplicationId) -> Result<(), StoreError> {
        self.state()?.applications.remove(id);
        Ok(())
    }

    fn state_changes_into(
        &self,
        state: ReservationState,
    ) -> Result<Vec<StateChangeEvent>, StoreError> {
        let guard = self.state()?;
        let mut events: Vec<StateChangeEvent> = guard
            .queues
            .values()
            .flatten()
            .flat_map(|reservation| reservation.state_changes.iter())
            .filter(|event| event.state == state)
            .cloned()
            .collect();
        events.sort_by_key(|event| event.timestamp);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::tests::common::{apartment_id, reservation};

    #[test]
    fn commit_replaces_queue_and_indexes_reservations() {
        let store = InMemoryReservationStore::new();
        let mut queue = store.load_queue(&apartment_id()).expect("load");
        assert!(queue.is_empty());

        let first = reservation(Some(1), Some(1), 1, false);
        queue.push(first.clone());
        store.commit(queue).expect("commit");

        assert_eq!(store.fetch(&first.id).expect("fetch"), Some(first.clone()));
        assert_eq!(
            store.load_queue(&apartment_id()).expect("load").reservations(),
            &[first]
        );
        assert_eq!(store.apartment_ids().expect("ids"), vec![apartment_id()]);
    }

    #[test]
    fn uncommitted_snapshots_are_invisible() {
        let store = InMemoryReservationStore::new();
        let mut queue = store.load_queue(&apartment_id()).expect("load");
        queue.push(reservation(Some(1), Some(1), 1, false));

        assert!(store
            .active_reservations(&apartment_id())
            .expect("read")
            .is_empty());
    }

    #[test]
    fn duplicate_applications_conflict() {
        let store = InMemoryReservationStore::new();
        let application = crate::queue::tests::common::application(
            crate::queue::domain::OwnershipType::Hitas,
            0,
            false,
        );

        store
            .insert_application(application.clone())
            .expect("first insert");
        assert!(matches!(
            store.insert_application(application),
            Err(StoreError::Conflict)
        ));
    }

    #[test]
    fn committing_an_earlier_snapshot_forgets_dropped_reservations() {
        let store = InMemoryReservationStore::new();
        let before = store.load_queue(&apartment_id()).expect("load");
        let mut queue = before.clone();
        let placed = reservation(Some(1), Some(1), 1, false);
        queue.push(placed.clone());
        store.commit(queue).expect("commit");

        store.commit(before).expect("restore");

        assert_eq!(store.fetch(&placed.id).expect("fetch"), None);
        assert!(store.load_queue(&apartment_id()).expect("load").is_empty());
    }

    #[test]
    fn removed_application_can_be_inserted_again() {
        let store = InMemoryReservationStore::new();
        let application = crate::queue::tests::common::application(
            crate::queue::domain::OwnershipType::Haso,
            4,
            false,
        );
        store
            .insert_application(application.clone())
            .expect("first insert");

        store.remove_application(&application.id).expect("removed");
        store
            .remove_application(&application.id)
            .expect("unknown id tolerated");

        assert_eq!(store.application(&application.id).expect("read"), None);
        store
            .insert_application(application)
            .expect("id free again");
    }

    #[test]
    fn filtered_reads_follow_queue_order() {
        let store = InMemoryReservationStore::new();
        let mut canceled = reservation(None, Some(2), 2, false);
        canceled.state = ReservationState::Canceled;
        let late = reservation(Some(2), Some(3), 1, true);
        let on_time = reservation(Some(1), Some(1), 3, false);
        store
            .commit(ApartmentQueue::new(
                apartment_id(),
                vec![late.clone(), canceled.clone(), on_time.clone()],
            ))
            .expect("commit");

        let active = store.active_reservations(&apartment_id()).expect("active");
        assert_eq!(active, vec![on_time.clone(), late.clone()]);
        assert_eq!(
            store
                .reservations_in_state(&apartment_id(), ReservationState::Canceled)
                .expect("canceled"),
            vec![canceled.clone()]
        );
        assert_eq!(
            store
                .reservations_by_lateness(&apartment_id(), false)
                .expect("on time"),
            vec![on_time, canceled]
        );
        assert_eq!(
            store
                .reservations_by_lateness(&apartment_id(), true)
                .expect("late"),
            vec![late]
        );
    }
}
