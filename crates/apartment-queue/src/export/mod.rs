//! CSV projections of committed queue state for sales staff.
//!
//! Every export renders a header row followed by data rows, separated by `;`, with
//! non-numeric cells quoted. Files are written as UTF-8 with a byte order mark so
//! spreadsheet tools pick up the encoding.

mod applicants;
mod lottery;
mod sales;


use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::catalog::{Apartment, ApartmentCatalog, CatalogError};
use crate::queue::{
    Application, ApplicationId, Customer, Profile, Reservation, ReservationStore, StoreError,
};

pub use applicants::ApplicantExport;
pub use lottery::ProjectLotteryResultExport;
pub use sales::{sold_events_between, SaleReportExport};

pub const CSV_DELIMITER: u8 = b';';
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write export file: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv output is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("application {0} referenced by a reservation is missing")]
    MissingApplication(ApplicationId),
    #[error("row has {found} cells but the header has {expected}")]
    RowWidth { expected: usize, found: usize },
}

/// One rendered value of an export row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Flag(bool),
}

impl Cell {
    fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(value) => value.clone(),
            Cell::Integer(value) => value.to_string(),
            Cell::Decimal(value) => value.to_string(),
            Cell::Flag(true) => "True".to_string(),
            Cell::Flag(false) => "False".to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<Option<u32>> for Cell {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Cell::Empty, |value| Cell::Integer(i64::from(value)))
    }
}

/// An export with a fixed header and data rows computed from the store and catalog.
pub trait CsvExport {
    fn columns(&self) -> &'static [&'static str];

    fn rows(&self) -> Result<Vec<Vec<Cell>>, ExportError>;

    fn lines(&self) -> Result<Vec<Vec<Cell>>, ExportError> {
        let mut lines = vec![self
            .columns()
            .iter()
            .map(|column| Cell::from(*column))
            .collect::<Vec<_>>()];
        lines.extend(self.rows()?);
        Ok(lines)
    }

    fn to_csv_string(&self) -> Result<String, ExportError> {
        make_csv(&self.lines()?)
    }

    fn write_csv_file(&self, path: &Path) -> Result<(), ExportError> {
        let contents = self.to_csv_string()?;
        let mut file = File::create(path)?;
        file.write_all(UTF8_BOM)?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Render lines as CSV. No lines renders as an empty string.
pub fn make_csv(lines: &[Vec<Cell>]) -> Result<String, ExportError> {
    let Some(first) = lines.first() else {
        return Ok(String::new());
    };
    let expected = first.len();
    if let Some(line) = lines.iter().find(|line| line.len() != expected) {
        return Err(ExportError::RowWidth {
            expected,
            found: line.len(),
        });
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .quote_style(csv::QuoteStyle::NonNumeric)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    for line in lines {
        writer.write_record(line.iter().map(Cell::render))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

fn profile_cells(profile: Option<&Profile>) -> [Cell; 3] {
    match profile {
        Some(profile) => [
            Cell::Text(profile.full_name()),
            Cell::Text(profile.street_address.clone()),
            Cell::Text(profile.email.clone()),
        ],
        None => [Cell::Empty, Cell::Empty, Cell::Empty],
    }
}

fn applicant_cells(customer: &Customer) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(6);
    cells.extend(profile_cells(Some(&customer.primary_profile)));
    cells.extend(profile_cells(customer.secondary_profile.as_ref()));
    cells
}

/// Catalog and application data joined onto one reservation.
struct ReservationRow {
    reservation: Reservation,
    application: Application,
    apartment: Apartment,
    project_street_address: String,
}

impl ReservationRow {
    fn load<C, S>(catalog: &C, store: &S, reservation: Reservation) -> Result<Self, ExportError>
    where
        C: ApartmentCatalog + ?Sized,
        S: ReservationStore + ?Sized,
    {
        let application = store
            .application(&reservation.application_id)?
            .ok_or_else(|| ExportError::MissingApplication(reservation.application_id.clone()))?;
        let apartment = catalog.apartment(&reservation.apartment_id)?;
        let project = catalog.project(&apartment.project_id)?;
        Ok(Self {
            reservation,
            application,
            apartment,
            project_street_address: project.street_address,
        })
    }
}
