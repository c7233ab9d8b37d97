use tracing::warn;

use super::allocator::OrderingRegime;
use super::error::QueueError;
use super::snapshot::ApartmentQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    /// Open a slot at the pivot for a new reservation placed under the given regime.
    Insert(OrderingRegime),
    /// Close the slot left behind by a removed reservation.
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOutcome {
    Shifted { moved: usize },
    /// The pivot was undefined so nothing moved.
    MissingPivot,
}

/// Renumber every active reservation at or after `pivot` by one.
///
/// Insert shifts refuse to run while any reservation of the apartment lacks a queue
/// position; the queue would end up with gaps otherwise. List positions only move on
/// inserts under the ordering-number regime.
pub fn shift_positions(
    queue: &mut ApartmentQueue,
    pivot: Option<u32>,
    direction: ShiftDirection,
) -> Result<ShiftOutcome, QueueError> {
    let apartment_id = queue.apartment_id();
    let Some(pivot) = pivot else {
        warn!(%apartment_id, ?direction, "shift pivot is missing, bad reservation data");
        return Ok(ShiftOutcome::MissingPivot);
    };

    let inserting = matches!(direction, ShiftDirection::Insert(_));
    if inserting && queue.has_unplaced() {
        return Err(QueueError::InconsistentQueueState { apartment_id });
    }

    let shift_list = direction == ShiftDirection::Insert(OrderingRegime::OrderingNumber);
    let mut moved = 0;

    for reservation in queue.reservations_mut() {
        if !reservation.is_active() {
            continue;
        }
        let Some(position) = reservation.queue_position else {
            continue;
        };
        if position < pivot {
            continue;
        }

        reservation.queue_position = Some(if inserting {
            position + 1
        } else {
            position.saturating_sub(1)
        });
        if shift_list {
            reservation.list_position = reservation.list_position.map(|list| list + 1);
        }
        moved += 1;
    }

    Ok(ShiftOutcome::Shifted { moved })
}
