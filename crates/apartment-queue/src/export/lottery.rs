use crate::catalog::ApartmentCatalog;
use crate::queue::{ProjectId, ReservationStore};

use super::{applicant_cells, Cell, CsvExport, ExportError, ReservationRow};

const COLUMNS: &[&str] = &[
    "Project address",
    "Apartment number",
    "Apartment structure",
    "Apartment area",
    "Apartment floor",
    "Queue position",
    "Right of residence",
    "Primary applicant",
    "Primary applicant address",
    "Primary applicant e-mail",
    "Secondary applicant",
    "Secondary applicant address",
    "Secondary applicant e-mail",
    "Has children",
];

/// Lottery outcome of a project: each apartment's active queue in position order.
pub struct ProjectLotteryResultExport<'a, C: ?Sized, S: ?Sized> {
    catalog: &'a C,
    store: &'a S,
    project_id: ProjectId,
}

impl<'a, C, S> ProjectLotteryResultExport<'a, C, S>
where
    C: ApartmentCatalog + ?Sized,
    S: ReservationStore + ?Sized,
{
    pub fn new(catalog: &'a C, store: &'a S, project_id: ProjectId) -> Self {
        Self {
            catalog,
            store,
            project_id,
        }
    }
}

impl<C, S> CsvExport for ProjectLotteryResultExport<'_, C, S>
where
    C: ApartmentCatalog + ?Sized,
    S: ReservationStore + ?Sized,
{
    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn rows(&self) -> Result<Vec<Vec<Cell>>, ExportError> {
        let mut rows = Vec::new();
        for apartment_id in self.catalog.apartment_ids(&self.project_id)? {
            for reservation in self.store.active_reservations(&apartment_id)? {
                let row = ReservationRow::load(self.catalog, self.store, reservation)?;
                let mut cells = vec![
                    Cell::Text(row.project_street_address),
                    Cell::Text(row.apartment.apartment_number),
                    Cell::Text(row.apartment.apartment_structure),
                    Cell::Decimal(row.apartment.living_area),
                    Cell::Integer(i64::from(row.apartment.floor)),
                    Cell::from(row.reservation.queue_position),
                    row.application
                        .right_of_residence
                        .map_or(Cell::Empty, Cell::Text),
                ];
                cells.extend(applicant_cells(&row.application.customer));
                cells.push(Cell::Flag(row.reservation.applicant.has_children));
                rows.push(cells);
            }
        }
        Ok(rows)
    }
}
