use super::domain::{ApartmentId, ApplicationId, OwnershipType, ReservationId};
use super::store::StoreError;

/// Failures that abort a queue mutation. Nothing is persisted when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("unsupported ownership type {0}")]
    UnsupportedOwnershipType(OwnershipType),
    #[error("application {0} has no right of residence ordering number")]
    MissingOrderingNumber(ApplicationId),
    #[error("apartment {apartment_id} has reservations without a queue position")]
    InconsistentQueueState { apartment_id: ApartmentId },
    #[error("application {application_id} does not apply to apartment {apartment_id}")]
    ApartmentNotApplied {
        application_id: ApplicationId,
        apartment_id: ApartmentId,
    },
    #[error("reservation {0} not found")]
    ReservationNotFound(ReservationId),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("reservation {0} is canceled")]
    ReservationCanceled(ReservationId),
    #[error(transparent)]
    Store(#[from] StoreError),
}
