use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::allocator::{self, OrderingRegime};
use super::domain::{
    ApartmentId, Application, CancellationReason, Reservation, ReservationId, ReservationState,
    StateChangeEvent,
};
use super::error::QueueError;
use super::lifecycle::{self, Withdrawal};
use super::locks::ApartmentLocks;
use super::snapshot::ApartmentQueue;
use super::store::{ReservationStore, StoreError};

/// Service composing the reservation store with per-apartment serialization.
///
/// Every mutation loads the apartment queue inside its critical section, applies the
/// change to that snapshot and commits it in one step.
pub struct QueueService<S> {
    store: Arc<S>,
    locks: ApartmentLocks,
}

impl<S> QueueService<S>
where
    S: ReservationStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: ApartmentLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Admit a new application to the queues of every apartment it lists, in priority order.
    ///
    /// The application id is claimed before any placement. Every listed apartment is
    /// locked for the whole submission and nothing is committed unless each placement
    /// succeeds, so a rejected submission leaves neither reservations nor the
    /// application record behind.
    pub fn submit(
        &self,
        application: Application,
        comment: &str,
        changed_by: Option<&str>,
    ) -> Result<Vec<Reservation>, QueueError> {
        OrderingRegime::for_ownership(&application.ownership_type)?;
        let apartment_ids: Vec<ApartmentId> = application
            .apartments_by_priority()
            .into_iter()
            .map(|applied| applied.apartment_id)
            .collect();

        self.store.insert_application(application.clone())?;
        let placed = self.locks.with_apartments(&apartment_ids, || {
            self.place_all(&application, &apartment_ids, comment, changed_by)
        });

        match placed {
            Ok(reservations) => {
                for reservation in &reservations {
                    log_admission(&application, reservation);
                }
                Ok(reservations)
            }
            Err(err) => {
                self.release_application(&application);
                Err(err)
            }
        }
    }

    /// Place the application into one apartment queue.
    ///
    /// The application record is stored on first use; an application that already
    /// joined other queues keeps its record.
    pub fn admit(
        &self,
        application: &Application,
        apartment_id: &ApartmentId,
        comment: &str,
        changed_by: Option<&str>,
    ) -> Result<Reservation, QueueError> {
        let claimed = match self.store.insert_application(application.clone()) {
            Ok(()) => true,
            Err(StoreError::Conflict) => false,
            Err(err) => return Err(err.into()),
        };

        let placed = self.mutate(apartment_id, |queue| {
            allocator::admit(queue, application, comment, changed_by)
        });
        match placed {
            Ok(reservation) => {
                log_admission(application, &reservation);
                Ok(reservation)
            }
            Err(err) => {
                if claimed {
                    self.release_application(application);
                }
                Err(err)
            }
        }
    }

    /// Cancel the reservation and renumber the rest of its queue.
    pub fn withdraw(
        &self,
        reservation_id: &ReservationId,
        cancellation_reason: Option<CancellationReason>,
        comment: Option<&str>,
        changed_by: Option<&str>,
    ) -> Result<Withdrawal, QueueError> {
        let apartment_id = self.reservation(reservation_id)?.apartment_id;
        let withdrawal = self.mutate(&apartment_id, |queue| {
            lifecycle::withdraw(
                queue,
                reservation_id,
                cancellation_reason,
                comment,
                changed_by,
            )
        })?;

        if withdrawal.already_removed {
            debug!(%reservation_id, "withdrawal found no queue position to release");
        }
        info!(%apartment_id, %reservation_id, "reservation removed from queue");
        Ok(withdrawal)
    }

    pub fn set_state(
        &self,
        reservation_id: &ReservationId,
        state: ReservationState,
        comment: Option<&str>,
        changed_by: Option<&str>,
    ) -> Result<StateChangeEvent, QueueError> {
        let apartment_id = self.reservation(reservation_id)?.apartment_id;
        let event = self.mutate(&apartment_id, |queue| {
            lifecycle::set_state(queue, reservation_id, state, comment, changed_by)
        })?;
        info!(%reservation_id, state = state.label(), "reservation state changed");
        Ok(event)
    }

    pub fn reservation(&self, reservation_id: &ReservationId) -> Result<Reservation, QueueError> {
        self.store
            .fetch(reservation_id)?
            .ok_or(QueueError::ReservationNotFound(*reservation_id))
    }

    /// Active reservations of the apartment by ascending queue position.
    pub fn active_queue(
        &self,
        apartment_id: &ApartmentId,
    ) -> Result<Vec<Reservation>, QueueError> {
        Ok(self.store.active_reservations(apartment_id)?)
    }

    /// Application a reservation was created from.
    pub fn application_for(&self, reservation: &Reservation) -> Result<Application, QueueError> {
        self.store
            .application(&reservation.application_id)?
            .ok_or_else(|| QueueError::ApplicationNotFound(reservation.application_id.clone()))
    }

    fn mutate<T>(
        &self,
        apartment_id: &ApartmentId,
        operation: impl FnOnce(&mut ApartmentQueue) -> Result<T, QueueError>,
    ) -> Result<T, QueueError> {
        self.locks.with_apartment(apartment_id, || {
            let mut queue = self.store.load_queue(apartment_id)?;
            let value = operation(&mut queue)?;
            self.store.commit(queue)?;
            Ok(value)
        })
    }

    /// Caller holds the locks of every apartment in `apartment_ids`.
    fn place_all(
        &self,
        application: &Application,
        apartment_ids: &[ApartmentId],
        comment: &str,
        changed_by: Option<&str>,
    ) -> Result<Vec<Reservation>, QueueError> {
        let mut originals: Vec<ApartmentQueue> = Vec::new();
        let mut working: Vec<ApartmentQueue> = Vec::new();
        let mut reservations = Vec::with_capacity(apartment_ids.len());

        for apartment_id in apartment_ids {
            let existing = working
                .iter()
                .position(|queue| queue.apartment_id() == *apartment_id);
            let index = match existing {
                Some(index) => index,
                None => {
                    let queue = self.store.load_queue(apartment_id)?;
                    originals.push(queue.clone());
                    working.push(queue);
                    working.len() - 1
                }
            };
            let reservation =
                allocator::admit(&mut working[index], application, comment, changed_by)?;
            reservations.push(reservation);
        }

        for (committed, queue) in working.into_iter().enumerate() {
            if let Err(err) = self.store.commit(queue) {
                self.restore(&originals[..committed]);
                return Err(err.into());
            }
        }
        Ok(reservations)
    }

    /// Put back queues committed earlier in a submission that later failed.
    fn restore(&self, originals: &[ApartmentQueue]) {
        for original in originals {
            let apartment_id = original.apartment_id();
            if let Err(err) = self.store.commit(original.clone()) {
                error!(
                    %apartment_id,
                    error = %err,
                    "failed to restore queue after rejected submission"
                );
            }
        }
    }

    fn release_application(&self, application: &Application) {
        if let Err(err) = self.store.remove_application(&application.id) {
            warn!(
                application_id = %application.id,
                error = %err,
                "failed to release application id"
            );
        }
    }
}

fn log_admission(application: &Application, reservation: &Reservation) {
    info!(
        apartment_id = %reservation.apartment_id,
        reservation_id = %reservation.id,
        application_id = %application.id,
        queue_position = ?reservation.queue_position,
        list_position = ?reservation.list_position,
        "reservation added to queue"
    );
}
