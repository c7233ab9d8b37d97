use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use super::domain::{
    CancellationReason, QueueChangeKind, ReservationId, ReservationState, StateChangeEvent,
};
use super::error::QueueError;
use super::shift::{shift_positions, ShiftDirection};
use super::snapshot::ApartmentQueue;

/// Result of taking a reservation out of its apartment queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Withdrawal {
    pub state_change: StateChangeEvent,
    /// The reservation had no queue position left when the withdrawal started.
    pub already_removed: bool,
}

/// Cancel a reservation and close the gap it leaves in the queue.
///
/// Withdrawing an already canceled reservation changes nothing and hands back the
/// cancellation that was recorded earlier.
pub fn withdraw(
    queue: &mut ApartmentQueue,
    reservation_id: &ReservationId,
    cancellation_reason: Option<CancellationReason>,
    comment: Option<&str>,
    changed_by: Option<&str>,
) -> Result<Withdrawal, QueueError> {
    let reservation = queue
        .get(reservation_id)
        .ok_or(QueueError::ReservationNotFound(*reservation_id))?;

    if reservation.state == ReservationState::Canceled {
        debug!(%reservation_id, "reservation already canceled");
        let state_change = match reservation
            .state_changes
            .iter()
            .rev()
            .find(|event| event.state == ReservationState::Canceled)
        {
            Some(previous) => previous.clone(),
            // Imported reservations can be canceled without a recorded transition.
            None => StateChangeEvent {
                reservation_id: *reservation_id,
                apartment_id: reservation.apartment_id,
                state: ReservationState::Canceled,
                comment: comment.map(str::to_string),
                cancellation_reason,
                changed_by: changed_by.map(str::to_string),
                timestamp: Utc::now(),
            },
        };
        return Ok(Withdrawal {
            state_change,
            already_removed: true,
        });
    }

    let old_position = reservation.queue_position;
    if let Some(reservation) = queue.get_mut(reservation_id) {
        reservation.queue_position = None;
    }
    shift_positions(queue, old_position, ShiftDirection::Delete)?;

    let reservation = queue
        .get_mut(reservation_id)
        .ok_or(QueueError::ReservationNotFound(*reservation_id))?;
    let state_change = StateChangeEvent {
        reservation_id: *reservation_id,
        apartment_id: reservation.apartment_id,
        state: ReservationState::Canceled,
        comment: comment.map(str::to_string),
        cancellation_reason,
        changed_by: changed_by.map(str::to_string),
        timestamp: Utc::now(),
    };
    reservation.state = ReservationState::Canceled;
    reservation.state_changes.push(state_change.clone());
    reservation.record_queue_change(QueueChangeKind::Removed, comment.unwrap_or_default());

    Ok(Withdrawal {
        state_change,
        already_removed: old_position.is_none(),
    })
}

/// Record a lifecycle transition. Transitions into `Canceled` go through [`withdraw`];
/// canceled reservations cannot move to any other state.
pub fn set_state(
    queue: &mut ApartmentQueue,
    reservation_id: &ReservationId,
    state: ReservationState,
    comment: Option<&str>,
    changed_by: Option<&str>,
) -> Result<StateChangeEvent, QueueError> {
    if state == ReservationState::Canceled {
        return withdraw(queue, reservation_id, None, comment, changed_by)
            .map(|withdrawal| withdrawal.state_change);
    }

    let reservation = queue
        .get_mut(reservation_id)
        .ok_or(QueueError::ReservationNotFound(*reservation_id))?;
    if reservation.state == ReservationState::Canceled {
        return Err(QueueError::ReservationCanceled(*reservation_id));
    }

    let event = StateChangeEvent {
        reservation_id: *reservation_id,
        apartment_id: reservation.apartment_id,
        state,
        comment: comment.map(str::to_string),
        cancellation_reason: None,
        changed_by: changed_by.map(str::to_string),
        timestamp: Utc::now(),
    };
    reservation.state = state;
    reservation.state_changes.push(event.clone());
    Ok(event)
}
