use super::domain::{
    ApartmentId, Application, ApplicationId, Reservation, ReservationId, ReservationState,
    StateChangeEvent,
};
use super::snapshot::ApartmentQueue;

/// Durable home of applications and per-apartment reservation queues.
///
/// Implementations must make `commit` all-or-nothing and must only expose committed
/// queues to readers, so exports never observe a half-shifted queue.
pub trait ReservationStore: Send + Sync {
    /// Load a working copy of the apartment's queue, canceled reservations included.
    fn load_queue(&self, apartment_id: &ApartmentId) -> Result<ApartmentQueue, StoreError>;

    /// Replace the apartment's committed queue with the given snapshot.
    fn commit(&self, queue: ApartmentQueue) -> Result<(), StoreError>;

    fn fetch(&self, id: &ReservationId) -> Result<Option<Reservation>, StoreError>;

    fn insert_application(&self, application: Application) -> Result<(), StoreError>;

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError>;

    /// Drop an application record; unknown ids are not an error.
    fn remove_application(&self, id: &ApplicationId) -> Result<(), StoreError>;

    /// Non-canceled reservations of the apartment by ascending queue position.
    fn active_reservations(
        &self,
        apartment_id: &ApartmentId,
    ) -> Result<Vec<Reservation>, StoreError> {
        let queue = self.load_queue(apartment_id)?;
        Ok(queue.active().into_iter().cloned().collect())
    }

    fn reservations_in_state(
        &self,
        apartment_id: &ApartmentId,
        state: ReservationState,
    ) -> Result<Vec<Reservation>, StoreError> {
        let queue = self.load_queue(apartment_id)?;
        Ok(queue
            .by_queue_position()
            .into_iter()
            .filter(|reservation| reservation.state == state)
            .cloned()
            .collect())
    }

    /// Reservations of one lateness pool by ascending queue position.
    fn reservations_by_lateness(
        &self,
        apartment_id: &ApartmentId,
        submitted_late: bool,
    ) -> Result<Vec<Reservation>, StoreError> {
        let queue = self.load_queue(apartment_id)?;
        Ok(queue
            .by_queue_position()
            .into_iter()
            .filter(|reservation| reservation.submitted_late() == submitted_late)
            .cloned()
            .collect())
    }

    /// Every recorded transition into `state`, across all apartments.
    fn state_changes_into(
        &self,
        state: ReservationState,
    ) -> Result<Vec<StateChangeEvent>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
