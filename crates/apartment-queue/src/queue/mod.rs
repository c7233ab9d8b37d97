//! Apartment reservation queues: placement, shifting and reservation lifecycle.
//!
//! Every mutation of a queue runs inside the apartment's critical section against a
//! freshly loaded [`ApartmentQueue`] snapshot, which is committed as a whole.

pub mod allocator;
pub mod domain;
mod error;
pub mod lifecycle;
mod locks;
pub mod memory;
pub mod router;
pub mod service;
pub mod shift;
mod snapshot;
pub mod store;

#[cfg(test)]
mod tests;

pub use allocator::{OrderingRegime, Placement};
pub use domain::{
    ApartmentId, ApplicantSnapshot, Application, ApplicationApartment, ApplicationId,
    CancellationReason, Customer, CustomerId, OrderingNumber, OwnershipType, Profile, ProjectId,
    QueueChangeEvent, QueueChangeKind, Reservation, ReservationId, ReservationState,
    StateChangeEvent,
};
pub use error::QueueError;
pub use lifecycle::Withdrawal;
pub use locks::ApartmentLocks;
pub use memory::InMemoryReservationStore;
pub use router::{queue_router, CancelRequest, QueueEntryView, StateChangeRequest};
pub use service::QueueService;
pub use shift::{ShiftDirection, ShiftOutcome};
pub use snapshot::ApartmentQueue;
pub use store::{ReservationStore, StoreError};
