use super::domain::{ApartmentId, Reservation, ReservationId};

/// Working copy of every reservation of one apartment.
///
/// Queue mutations are applied to a snapshot loaded inside the apartment's critical
/// section and handed back to the store in one commit, so a failed operation leaves
/// the committed queue untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApartmentQueue {
    apartment_id: ApartmentId,
    reservations: Vec<Reservation>,
}

impl ApartmentQueue {
    pub fn new(apartment_id: ApartmentId, reservations: Vec<Reservation>) -> Self {
        Self {
            apartment_id,
            reservations,
        }
    }

    pub fn apartment_id(&self) -> ApartmentId {
        self.apartment_id
    }

    /// Every reservation of the apartment, canceled ones included.
    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn into_reservations(self) -> Vec<Reservation> {
        self.reservations
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    pub fn get(&self, id: &ReservationId) -> Option<&Reservation> {
        self.reservations.iter().find(|reservation| &reservation.id == id)
    }

    pub fn get_mut(&mut self, id: &ReservationId) -> Option<&mut Reservation> {
        self.reservations
            .iter_mut()
            .find(|reservation| &reservation.id == id)
    }

    pub(crate) fn reservations_mut(&mut self) -> impl Iterator<Item = &mut Reservation> {
        self.reservations.iter_mut()
    }

    pub(crate) fn push(&mut self, reservation: Reservation) {
        self.reservations.push(reservation);
    }

    /// Reservations sorted by queue position; entries without a position come last.
    pub fn by_queue_position(&self) -> Vec<&Reservation> {
        let mut ordered: Vec<&Reservation> = self.reservations.iter().collect();
        ordered.sort_by_key(|reservation| {
            (
                reservation.queue_position.is_none(),
                reservation.queue_position,
            )
        });
        ordered
    }

    /// Active reservations sorted by queue position.
    pub fn active(&self) -> Vec<&Reservation> {
        self.by_queue_position()
            .into_iter()
            .filter(|reservation| reservation.is_active())
            .collect()
    }

    pub fn max_active_position(&self) -> Option<u32> {
        self.reservations
            .iter()
            .filter(|reservation| reservation.is_active())
            .filter_map(|reservation| reservation.queue_position)
            .max()
    }

    pub fn has_unplaced(&self) -> bool {
        self.reservations
            .iter()
            .any(|reservation| reservation.queue_position.is_none())
    }

    /// True when the active queue positions are exactly `1..=N` without duplicates.
    pub fn is_contiguous(&self) -> bool {
        let mut positions: Vec<u32> = Vec::new();
        for reservation in self.reservations.iter().filter(|r| r.is_active()) {
            match reservation.queue_position {
                Some(position) => positions.push(position),
                None => return false,
            }
        }
        positions.sort_unstable();
        positions
            .iter()
            .enumerate()
            .all(|(index, position)| *position as usize == index + 1)
    }
}
