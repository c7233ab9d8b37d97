use crate::catalog::ApartmentCatalog;
use crate::queue::{ProjectId, Reservation, ReservationStore};

use super::{applicant_cells, Cell, CsvExport, ExportError, ReservationRow};

const COLUMNS: &[&str] = &[
    "Primary applicant",
    "Primary applicant address",
    "Primary applicant e-mail",
    "Secondary applicant",
    "Secondary applicant address",
    "Secondary applicant e-mail",
    "Queue position",
    "Has children",
    "Project address",
    "Apartment number",
    "Apartment structure",
    "Apartment area",
];

/// Contact listing for a given set of reservations, one row per reservation.
pub struct ApplicantExport<'a, C: ?Sized, S: ?Sized> {
    catalog: &'a C,
    store: &'a S,
    reservations: Vec<Reservation>,
}

impl<'a, C, S> ApplicantExport<'a, C, S>
where
    C: ApartmentCatalog + ?Sized,
    S: ReservationStore + ?Sized,
{
    pub fn new(catalog: &'a C, store: &'a S, reservations: Vec<Reservation>) -> Self {
        Self {
            catalog,
            store,
            reservations,
        }
    }

    /// Active reservations of every apartment in the project, apartment by apartment.
    pub fn for_project(
        catalog: &'a C,
        store: &'a S,
        project_id: &ProjectId,
    ) -> Result<Self, ExportError> {
        let mut reservations = Vec::new();
        for apartment_id in catalog.apartment_ids(project_id)? {
            reservations.extend(store.active_reservations(&apartment_id)?);
        }
        Ok(Self::new(catalog, store, reservations))
    }

    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }
}

impl<C, S> CsvExport for ApplicantExport<'_, C, S>
where
    C: ApartmentCatalog + ?Sized,
    S: ReservationStore + ?Sized,
{
    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn rows(&self) -> Result<Vec<Vec<Cell>>, ExportError> {
        self.reservations
            .iter()
            .map(|reservation| {
                let row = ReservationRow::load(self.catalog, self.store, reservation.clone())?;
                let mut cells = applicant_cells(&row.application.customer);
                cells.push(Cell::from(row.reservation.queue_position));
                cells.push(Cell::Flag(row.reservation.applicant.has_children));
                cells.push(Cell::Text(row.project_street_address));
                cells.push(Cell::Text(row.apartment.apartment_number));
                cells.push(Cell::Text(row.apartment.apartment_structure));
                cells.push(Cell::Decimal(row.apartment.living_area));
                Ok(cells)
            })
            .collect()
    }
}
