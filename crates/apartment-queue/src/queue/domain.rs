use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an apartment in the external catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApartmentId(pub Uuid);

/// Identifier of a sales project in the external catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub Uuid);

/// Identifier of a submitted application bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

/// Identifier of a single (application, apartment) queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(pub Uuid);

impl ReservationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

macro_rules! display_inner {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        })*
    };
}

display_inner!(ApartmentId, ProjectId, ApplicationId, ReservationId, CustomerId);

/// Ownership type of the applied apartments. Drives which queue ordering regime applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OwnershipType {
    /// Right-of-residence housing, ordered by the right-of-residence number.
    Haso,
    Hitas,
    PuoliHitas,
    /// Any ownership type without a queue regime of its own.
    Other(String),
}

impl OwnershipType {
    pub fn label(&self) -> &str {
        match self {
            OwnershipType::Haso => "HASO",
            OwnershipType::Hitas => "HITAS",
            OwnershipType::PuoliHitas => "PUOLIHITAS",
            OwnershipType::Other(name) => name,
        }
    }
}

impl From<String> for OwnershipType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "HASO" => Self::Haso,
            "HITAS" => Self::Hitas,
            "PUOLIHITAS" => Self::PuoliHitas,
            _ => Self::Other(value),
        }
    }
}

impl From<OwnershipType> for String {
    fn from(value: OwnershipType) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for OwnershipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pre-computed, totally ordered right-of-residence key produced by the lottery draw.
/// Smaller numbers rank earlier in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderingNumber(pub u64);

/// Contact details of one applicant of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub street_address: String,
    pub email: String,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub primary_profile: Profile,
    #[serde(default)]
    pub secondary_profile: Option<Profile>,
}

/// One apartment listed on an application, with the applicant's priority for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationApartment {
    pub apartment_id: ApartmentId,
    pub priority_number: u8,
}

/// Application bundle as received from the sales form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub ownership_type: OwnershipType,
    pub customer: Customer,
    pub apartments: Vec<ApplicationApartment>,
    #[serde(default)]
    pub right_of_residence: Option<String>,
    #[serde(default)]
    pub right_of_residence_ordering_number: Option<OrderingNumber>,
    #[serde(default)]
    pub right_of_residence_is_old_batch: bool,
    #[serde(default)]
    pub submitted_late: bool,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub has_hitas_ownership: bool,
    #[serde(default)]
    pub is_age_over_55: bool,
    #[serde(default)]
    pub is_right_of_occupancy_housing_changer: bool,
}

impl Application {
    /// Apartments in the order the applicant prioritized them.
    pub fn apartments_by_priority(&self) -> Vec<&ApplicationApartment> {
        let mut apartments: Vec<&ApplicationApartment> = self.apartments.iter().collect();
        apartments.sort_by_key(|apartment| apartment.priority_number);
        apartments
    }

    pub fn applies_to(&self, apartment_id: &ApartmentId) -> Option<&ApplicationApartment> {
        self.apartments
            .iter()
            .find(|apartment| &apartment.apartment_id == apartment_id)
    }
}

/// Application values copied onto a reservation when it is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantSnapshot {
    pub right_of_residence: Option<String>,
    pub right_of_residence_ordering_number: Option<OrderingNumber>,
    pub right_of_residence_is_old_batch: bool,
    pub submitted_late: bool,
    pub has_children: bool,
    pub has_hitas_ownership: bool,
    pub is_age_over_55: bool,
    pub is_right_of_occupancy_housing_changer: bool,
}

impl From<&Application> for ApplicantSnapshot {
    fn from(application: &Application) -> Self {
        Self {
            right_of_residence: application.right_of_residence.clone(),
            right_of_residence_ordering_number: application.right_of_residence_ordering_number,
            right_of_residence_is_old_batch: application.right_of_residence_is_old_batch,
            submitted_late: application.submitted_late,
            has_children: application.has_children,
            has_hitas_ownership: application.has_hitas_ownership,
            is_age_over_55: application.is_age_over_55,
            is_right_of_occupancy_housing_changer: application
                .is_right_of_occupancy_housing_changer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationState {
    /// Initial state of every queued reservation.
    Submitted,
    Reserved,
    Review,
    Offered,
    OfferAccepted,
    OfferExpired,
    AcceptedByMunicipality,
    Sold,
    Canceled,
}

impl ReservationState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Reserved => "reserved",
            Self::Review => "review",
            Self::Offered => "offered",
            Self::OfferAccepted => "offer_accepted",
            Self::OfferExpired => "offer_expired",
            Self::AcceptedByMunicipality => "accepted_by_municipality",
            Self::Sold => "sold",
            Self::Canceled => "canceled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationReason {
    Canceled,
    Terminated,
    ReservationAgreementCanceled,
    Transferred,
    OtherApartmentOffered,
    LowerPriority,
}

/// Audit record of a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChangeEvent {
    pub reservation_id: ReservationId,
    pub apartment_id: ApartmentId,
    pub state: ReservationState,
    pub comment: Option<String>,
    pub cancellation_reason: Option<CancellationReason>,
    pub changed_by: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueChangeKind {
    Added,
    Removed,
}

/// Append-only record of a reservation entering or leaving its queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueChangeEvent {
    pub kind: QueueChangeKind,
    pub comment: String,
    pub timestamp: DateTime<Utc>,
}

/// A single application's place in one apartment's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub apartment_id: ApartmentId,
    pub application_id: ApplicationId,
    pub customer_id: CustomerId,
    pub priority_number: u8,
    pub queue_position: Option<u32>,
    pub list_position: Option<u32>,
    pub state: ReservationState,
    pub applicant: ApplicantSnapshot,
    pub queue_changes: Vec<QueueChangeEvent>,
    pub state_changes: Vec<StateChangeEvent>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.state != ReservationState::Canceled
    }

    pub fn ordering_number(&self) -> Option<OrderingNumber> {
        self.applicant.right_of_residence_ordering_number
    }

    pub fn submitted_late(&self) -> bool {
        self.applicant.submitted_late
    }

    pub(crate) fn record_queue_change(&mut self, kind: QueueChangeKind, comment: &str) {
        self.queue_changes.push(QueueChangeEvent {
            kind,
            comment: comment.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn last_state_change(&self) -> Option<&StateChangeEvent> {
        self.state_changes.last()
    }
}
