use std::collections::HashSet;

use chrono::NaiveDate;

use crate::catalog::{ApartmentCatalog, ApartmentState, Project};
use crate::queue::{
    OwnershipType, ProjectId, ReservationState, ReservationStore, StateChangeEvent,
};

use super::{Cell, CsvExport, ExportError};

const COLUMNS: &[&str] = &[
    "Project address",
    "Sold HITAS apartments",
    "Sold HASO apartments",
    "Unsold apartments",
];

/// Transitions into `sold` whose timestamp falls on a day within `start..=end` (UTC).
pub fn sold_events_between<S>(
    store: &S,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<StateChangeEvent>, ExportError>
where
    S: ReservationStore + ?Sized,
{
    Ok(store
        .state_changes_into(ReservationState::Sold)?
        .into_iter()
        .filter(|event| {
            let day = event.timestamp.date_naive();
            start <= day && day <= end
        })
        .collect())
}

/// Per-project sales summary built from sold events, closed by a `Total` row.
pub struct SaleReportExport<'a, C: ?Sized, S: ?Sized> {
    catalog: &'a C,
    store: &'a S,
    sold_events: Vec<StateChangeEvent>,
    project_ids: Vec<ProjectId>,
}

impl<'a, C, S> SaleReportExport<'a, C, S>
where
    C: ApartmentCatalog + ?Sized,
    S: ReservationStore + ?Sized,
{
    pub fn new(
        catalog: &'a C,
        store: &'a S,
        sold_events: Vec<StateChangeEvent>,
    ) -> Result<Self, ExportError> {
        let mut seen = HashSet::new();
        let mut project_ids = Vec::new();
        for event in &sold_events {
            let project_id = catalog.apartment(&event.apartment_id)?.project_id;
            if seen.insert(project_id) {
                project_ids.push(project_id);
            }
        }
        Ok(Self {
            catalog,
            store,
            sold_events,
            project_ids,
        })
    }

    pub fn project_ids(&self) -> &[ProjectId] {
        &self.project_ids
    }

    fn project_row(&self, project: &Project) -> Result<(Vec<Cell>, i64, u32), ExportError> {
        let apartment_ids = self.catalog.apartment_ids(&project.id)?;

        let mut sold_apartments = 0u32;
        for apartment_id in &apartment_ids {
            let apartment = self.catalog.apartment(apartment_id)?;
            let has_sold_reservation = !self
                .store
                .reservations_in_state(apartment_id, ReservationState::Sold)?
                .is_empty();
            if apartment.state == ApartmentState::Sold || has_sold_reservation {
                sold_apartments += 1;
            }
        }
        let reported_sold = self
            .sold_events
            .iter()
            .filter(|event| apartment_ids.contains(&event.apartment_id))
            .count() as i64;
        let unsold = project.apartment_count.saturating_sub(sold_apartments);

        let sold_cell = |ownership_type: OwnershipType| {
            if project.ownership_type == ownership_type {
                Cell::Integer(reported_sold)
            } else {
                Cell::Empty
            }
        };
        let cells = vec![
            Cell::Text(project.street_address.clone()),
            sold_cell(OwnershipType::Hitas),
            sold_cell(OwnershipType::Haso),
            Cell::Integer(i64::from(unsold)),
        ];
        Ok((cells, reported_sold, unsold))
    }
}

impl<C, S> CsvExport for SaleReportExport<'_, C, S>
where
    C: ApartmentCatalog + ?Sized,
    S: ReservationStore + ?Sized,
{
    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn rows(&self) -> Result<Vec<Vec<Cell>>, ExportError> {
        let mut rows = Vec::with_capacity(self.project_ids.len() + 1);
        let (mut hitas_sold, mut haso_sold, mut unsold) = (0i64, 0i64, 0i64);

        for project_id in &self.project_ids {
            let project = self.catalog.project(project_id)?;
            let (cells, reported_sold, remaining) = self.project_row(&project)?;
            match project.ownership_type {
                OwnershipType::Hitas => hitas_sold += reported_sold,
                OwnershipType::Haso => haso_sold += reported_sold,
                _ => {}
            }
            unsold += i64::from(remaining);
            rows.push(cells);
        }

        rows.push(vec![
            Cell::from("Total"),
            Cell::Integer(hitas_sold),
            Cell::Integer(haso_sold),
            Cell::Integer(unsold),
        ]);
        Ok(rows)
    }
}
