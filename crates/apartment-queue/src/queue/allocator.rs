use chrono::Utc;
use serde::Serialize;

use super::domain::{
    ApplicantSnapshot, Application, OrderingNumber, OwnershipType, QueueChangeKind, Reservation,
    ReservationId, ReservationState, StateChangeEvent,
};
use super::error::QueueError;
use super::shift::{shift_positions, ShiftDirection};
use super::snapshot::ApartmentQueue;

/// Placement strategy of an apartment queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingRegime {
    /// Ranked by the right-of-residence ordering number, late applicants in a pool of their own.
    OrderingNumber,
    /// Appended to the end of the queue in admission order.
    ArrivalOrder,
}

impl OrderingRegime {
    pub fn for_ownership(ownership_type: &OwnershipType) -> Result<Self, QueueError> {
        match ownership_type {
            OwnershipType::Haso => Ok(Self::OrderingNumber),
            OwnershipType::Hitas | OwnershipType::PuoliHitas => Ok(Self::ArrivalOrder),
            OwnershipType::Other(_) => Err(QueueError::UnsupportedOwnershipType(
                ownership_type.clone(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub queue_position: u32,
    pub list_position: u32,
}

/// Apartment-wide queue position for a new ordering-number applicant.
///
/// Single pass over the active queue in position order: the applicant takes the place
/// of the first reservation in its own lateness pool with a strictly greater number.
/// On-time applicants never pass the first late reservation. Without a match the
/// applicant goes to the end of the queue.
pub fn ordering_number_position(
    queue: &ApartmentQueue,
    ordering_number: OrderingNumber,
    submitted_late: bool,
) -> u32 {
    for reservation in queue.active() {
        let Some(position) = reservation.queue_position else {
            continue;
        };
        if reservation.submitted_late() == submitted_late {
            if matches!(reservation.ordering_number(), Some(other) if ordering_number < other) {
                return position;
            }
        } else if !submitted_late {
            return position;
        }
    }

    queue.max_active_position().unwrap_or(0) + 1
}

/// Arrival-order placement. List positions count canceled reservations too and are
/// never reused.
pub fn arrival_order_placement(queue: &ApartmentQueue) -> Placement {
    Placement {
        queue_position: queue.max_active_position().unwrap_or(0) + 1,
        list_position: queue.len() as u32 + 1,
    }
}

/// Place `application` into the apartment queue and record the "added" event.
///
/// Must run inside the apartment's critical section on a freshly loaded snapshot.
pub fn admit(
    queue: &mut ApartmentQueue,
    application: &Application,
    comment: &str,
    changed_by: Option<&str>,
) -> Result<Reservation, QueueError> {
    let regime = OrderingRegime::for_ownership(&application.ownership_type)?;
    let apartment_id = queue.apartment_id();
    let applied = application
        .applies_to(&apartment_id)
        .ok_or_else(|| QueueError::ApartmentNotApplied {
            application_id: application.id.clone(),
            apartment_id,
        })?;

    let placement = match regime {
        OrderingRegime::OrderingNumber => {
            let ordering_number = application
                .right_of_residence_ordering_number
                .ok_or_else(|| QueueError::MissingOrderingNumber(application.id.clone()))?;
            let queue_position =
                ordering_number_position(queue, ordering_number, application.submitted_late);
            shift_positions(queue, Some(queue_position), ShiftDirection::Insert(regime))?;
            Placement {
                queue_position,
                list_position: queue_position,
            }
        }
        OrderingRegime::ArrivalOrder => arrival_order_placement(queue),
    };

    let id = ReservationId::generate();
    let mut reservation = Reservation {
        id,
        apartment_id,
        application_id: application.id.clone(),
        customer_id: application.customer.id.clone(),
        priority_number: applied.priority_number,
        queue_position: Some(placement.queue_position),
        list_position: Some(placement.list_position),
        state: ReservationState::Submitted,
        applicant: ApplicantSnapshot::from(application),
        queue_changes: Vec::new(),
        state_changes: vec![StateChangeEvent {
            reservation_id: id,
            apartment_id,
            state: ReservationState::Submitted,
            comment: None,
            cancellation_reason: None,
            changed_by: changed_by.map(str::to_string),
            timestamp: Utc::now(),
        }],
    };
    reservation.record_queue_change(QueueChangeKind::Added, comment);
    queue.push(reservation.clone());

    Ok(reservation)
}
