use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;
use uuid::Uuid;

use crate::queue::domain::{
    ApartmentId, ApplicantSnapshot, Application, ApplicationApartment, ApplicationId, Customer,
    CustomerId, OrderingNumber, OwnershipType, Profile, Reservation, ReservationId,
    ReservationState, StateChangeEvent,
};
use crate::queue::memory::InMemoryReservationStore;
use crate::queue::service::QueueService;
use crate::queue::snapshot::ApartmentQueue;
use crate::queue::store::{ReservationStore, StoreError};

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

pub(crate) fn apartment_id() -> ApartmentId {
    ApartmentId(Uuid::from_u128(0x6a1d_57c0_0000_4000_8000_0000_0000_0001))
}

pub(crate) fn second_apartment_id() -> ApartmentId {
    ApartmentId(Uuid::from_u128(0x6a1d_57c0_0000_4000_8000_0000_0000_0002))
}

pub(crate) fn profile(first_name: &str, last_name: &str) -> Profile {
    Profile {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        street_address: "Mannerheimintie 1".to_string(),
        email: format!("{}@example.com", first_name.to_ascii_lowercase()),
    }
}

pub(crate) fn customer(suffix: u64) -> Customer {
    Customer {
        id: CustomerId(format!("customer-{suffix}")),
        primary_profile: profile("Aino", &format!("Applicant{suffix}")),
        secondary_profile: None,
    }
}

/// Application to [`apartment_id`] with the given ordering number and lateness.
pub(crate) fn application(ownership_type: OwnershipType, key: u64, late: bool) -> Application {
    let suffix = next_id();
    Application {
        id: ApplicationId(format!("application-{suffix}")),
        ownership_type,
        customer: customer(suffix),
        apartments: vec![ApplicationApartment {
            apartment_id: apartment_id(),
            priority_number: 1,
        }],
        right_of_residence: Some(format!("{key:08}")),
        right_of_residence_ordering_number: Some(OrderingNumber(key)),
        right_of_residence_is_old_batch: false,
        submitted_late: late,
        has_children: false,
        has_hitas_ownership: false,
        is_age_over_55: false,
        is_right_of_occupancy_housing_changer: false,
    }
}

pub(crate) fn reservation(
    queue_position: Option<u32>,
    list_position: Option<u32>,
    key: u64,
    late: bool,
) -> Reservation {
    let suffix = next_id();
    Reservation {
        id: ReservationId::generate(),
        apartment_id: apartment_id(),
        application_id: ApplicationId(format!("application-{suffix}")),
        customer_id: CustomerId(format!("customer-{suffix}")),
        priority_number: 1,
        queue_position,
        list_position,
        state: ReservationState::Submitted,
        applicant: ApplicantSnapshot {
            right_of_residence: Some(format!("{key:08}")),
            right_of_residence_ordering_number: Some(OrderingNumber(key)),
            right_of_residence_is_old_batch: false,
            submitted_late: late,
            has_children: false,
            has_hitas_ownership: false,
            is_age_over_55: false,
            is_right_of_occupancy_housing_changer: false,
        },
        queue_changes: Vec::new(),
        state_changes: Vec::new(),
    }
}

pub(crate) fn queue_with(reservations: Vec<Reservation>) -> ApartmentQueue {
    ApartmentQueue::new(apartment_id(), reservations)
}

pub(crate) fn build_service() -> (
    QueueService<InMemoryReservationStore>,
    Arc<InMemoryReservationStore>,
) {
    let store = Arc::new(InMemoryReservationStore::new());
    let service = QueueService::new(store.clone());
    (service, store)
}

/// Positions of the apartment's active queue, read back from the store.
pub(crate) fn active_positions(
    store: &InMemoryReservationStore,
    apartment_id: &ApartmentId,
) -> Vec<u32> {
    store
        .active_reservations(apartment_id)
        .expect("store readable")
        .iter()
        .filter_map(|reservation| reservation.queue_position)
        .collect()
}

/// Store whose commits always fail after the operation ran against its snapshot.
#[derive(Default)]
pub(crate) struct FailingCommitStore {
    pub(crate) inner: InMemoryReservationStore,
}

impl ReservationStore for FailingCommitStore {
    fn load_queue(&self, apartment_id: &ApartmentId) -> Result<ApartmentQueue, StoreError> {
        self.inner.load_queue(apartment_id)
    }

    fn commit(&self, _queue: ApartmentQueue) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection reset during commit".to_string()))
    }

    fn fetch(&self, id: &ReservationId) -> Result<Option<Reservation>, StoreError> {
        self.inner.fetch(id)
    }

    fn insert_application(&self, application: Application) -> Result<(), StoreError> {
        self.inner.insert_application(application)
    }

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        self.inner.application(id)
    }

    fn remove_application(&self, id: &ApplicationId) -> Result<(), StoreError> {
        self.inner.remove_application(id)
    }

    fn state_changes_into(
        &self,
        state: ReservationState,
    ) -> Result<Vec<StateChangeEvent>, StoreError> {
        self.inner.state_changes_into(state)
    }
}

/// Store that refuses commits for one apartment only.
pub(crate) struct RejectingApartmentStore {
    pub(crate) inner: InMemoryReservationStore,
    pub(crate) rejected: ApartmentId,
}

impl ReservationStore for RejectingApartmentStore {
    fn load_queue(&self, apartment_id: &ApartmentId) -> Result<ApartmentQueue, StoreError> {
        self.inner.load_queue(apartment_id)
    }

    fn commit(&self, queue: ApartmentQueue) -> Result<(), StoreError> {
        if queue.apartment_id() == self.rejected {
            return Err(StoreError::Unavailable("apartment shard offline".to_string()));
        }
        self.inner.commit(queue)
    }

    fn fetch(&self, id: &ReservationId) -> Result<Option<Reservation>, StoreError> {
        self.inner.fetch(id)
    }

    fn insert_application(&self, application: Application) -> Result<(), StoreError> {
        self.inner.insert_application(application)
    }

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        self.inner.application(id)
    }

    fn remove_application(&self, id: &ApplicationId) -> Result<(), StoreError> {
        self.inner.remove_application(id)
    }

    fn state_changes_into(
        &self,
        state: ReservationState,
    ) -> Result<Vec<StateChangeEvent>, StoreError> {
        self.inner.state_changes_into(state)
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
