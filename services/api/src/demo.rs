use crate::infra::{load_applications, load_catalog};
use apartment_queue::catalog::{
    Apartment, ApartmentState, CatalogDocument, InMemoryCatalog, Project,
};
use apartment_queue::config::CatalogConfig;
use apartment_queue::error::AppError;
use apartment_queue::export::{ApplicantExport, CsvExport, ProjectLotteryResultExport};
use apartment_queue::queue::{
    ApartmentId, Application, ApplicationApartment, ApplicationId, CancellationReason, Customer,
    CustomerId, InMemoryReservationStore, OrderingNumber, OwnershipType, Profile, ProjectId,
    QueueService,
};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Ordering numbers of on-time HASO applicants, in arrival order
    #[arg(long, value_delimiter = ',', default_values_t = vec![42u64, 7, 19])]
    pub(crate) ordering_numbers: Vec<u64>,
    /// Ordering numbers of late HASO applicants, in arrival order
    #[arg(long, value_delimiter = ',', default_values_t = vec![3u64])]
    pub(crate) late_ordering_numbers: Vec<u64>,
    /// Print the lottery result CSV of the demo HASO project
    #[arg(long)]
    pub(crate) show_csv: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ExportKind {
    Applicants,
    LotteryResult,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Catalog JSON with the project's apartments
    #[arg(long)]
    pub(crate) catalog: PathBuf,
    /// JSON array of applications, replayed in order
    #[arg(long)]
    pub(crate) applications: PathBuf,
    /// Project to export
    #[arg(long)]
    pub(crate) project: Uuid,
    #[arg(long, value_enum)]
    pub(crate) kind: ExportKind,
    /// Write the CSV here (with a byte order mark) instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

const HASO_PROJECT: u128 = 0xd3_0000_0001;
const HITAS_PROJECT: u128 = 0xd3_0000_0002;
const HASO_APARTMENT: u128 = 0xd3_0001_0001;
const HITAS_APARTMENT: u128 = 0xd3_0001_0002;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        ordering_numbers,
        late_ordering_numbers,
        show_csv,
    } = args;

    let catalog = demo_catalog();
    let store = Arc::new(InMemoryReservationStore::new());
    let service = QueueService::new(store.clone());
    let haso_apartment = ApartmentId(Uuid::from_u128(HASO_APARTMENT));
    let hitas_apartment = ApartmentId(Uuid::from_u128(HITAS_APARTMENT));
    let mut sequence = 0u32;

    println!("Apartment queue demo");
    println!("\nHASO apartment A1: on-time applicants ranked by ordering number");
    for key in ordering_numbers {
        sequence += 1;
        let application = demo_application(
            sequence,
            OwnershipType::Haso,
            haso_apartment,
            Some(key),
            false,
        );
        service.submit(application, "demo admission", Some("demo"))?;
    }
    print_queue(&service, &haso_apartment)?;

    println!("\nLate applicants join after every on-time applicant");
    for key in late_ordering_numbers {
        sequence += 1;
        let application = demo_application(
            sequence,
            OwnershipType::Haso,
            haso_apartment,
            Some(key),
            true,
        );
        service.submit(application, "late admission", Some("demo"))?;
    }
    print_queue(&service, &haso_apartment)?;

    if let Some(first) = service.active_queue(&haso_apartment)?.first() {
        println!("\nFirst in line withdraws; the rest move up");
        service.withdraw(
            &first.id,
            Some(CancellationReason::Canceled),
            Some("applicant withdrew"),
            Some("demo"),
        )?;
        print_queue(&service, &haso_apartment)?;
    }

    println!("\nHITAS apartment B1: arrival order, list positions never reused");
    let mut hitas_reservations = Vec::new();
    for _ in 0..3 {
        sequence += 1;
        let application =
            demo_application(sequence, OwnershipType::Hitas, hitas_apartment, None, false);
        hitas_reservations.extend(service.submit(application, "", Some("demo"))?);
    }
    if let Some(second) = hitas_reservations.get(1) {
        service.withdraw(
            &second.id,
            Some(CancellationReason::Transferred),
            None,
            Some("demo"),
        )?;
    }
    sequence += 1;
    service.submit(
        demo_application(sequence, OwnershipType::Hitas, hitas_apartment, None, false),
        "",
        Some("demo"),
    )?;
    print_queue(&service, &hitas_apartment)?;

    if show_csv {
        let export = ProjectLotteryResultExport::new(
            &catalog,
            store.as_ref(),
            ProjectId(Uuid::from_u128(HASO_PROJECT)),
        );
        println!("\nLottery result export");
        print!("{}", export.to_csv_string()?);
    }

    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let ExportArgs {
        catalog,
        applications,
        project,
        kind,
        output,
    } = args;

    let catalog = load_catalog(&CatalogConfig {
        path: Some(catalog),
    })?;
    let store = Arc::new(InMemoryReservationStore::new());
    let service = QueueService::new(store.clone());
    for application in load_applications(&applications)? {
        let application_id = application.id.clone();
        if let Err(err) = service.submit(application, "replayed from file", None) {
            warn!(%application_id, error = %err, "application skipped");
        }
    }

    let project_id = ProjectId(project);
    let export: Box<dyn CsvExport + '_> = match kind {
        ExportKind::Applicants => Box::new(ApplicantExport::for_project(
            &catalog,
            store.as_ref(),
            &project_id,
        )?),
        ExportKind::LotteryResult => Box::new(ProjectLotteryResultExport::new(
            &catalog,
            store.as_ref(),
            project_id,
        )),
    };

    match output {
        Some(path) => {
            export.write_csv_file(&path)?;
            println!("Export written to {}", path.display());
        }
        None => print!("{}", export.to_csv_string()?),
    }
    Ok(())
}

fn print_queue(
    service: &QueueService<InMemoryReservationStore>,
    apartment_id: &ApartmentId,
) -> Result<(), AppError> {
    for reservation in service.active_queue(apartment_id)? {
        let key = reservation
            .ordering_number()
            .map(|number| number.0.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>2}. {} | list {} | ordering number {} | {}",
            reservation.queue_position.unwrap_or_default(),
            reservation.application_id,
            reservation.list_position.unwrap_or_default(),
            key,
            if reservation.submitted_late() {
                "late"
            } else {
                "on time"
            }
        );
    }
    Ok(())
}

fn demo_application(
    sequence: u32,
    ownership_type: OwnershipType,
    apartment_id: ApartmentId,
    ordering_number: Option<u64>,
    submitted_late: bool,
) -> Application {
    Application {
        id: ApplicationId(format!("demo-{sequence:03}")),
        ownership_type,
        customer: Customer {
            id: CustomerId(format!("demo-customer-{sequence:03}")),
            primary_profile: Profile {
                first_name: "Applicant".to_string(),
                last_name: format!("{sequence:03}"),
                street_address: format!("Demotie {sequence}"),
                email: format!("applicant{sequence}@example.com"),
            },
            secondary_profile: None,
        },
        apartments: vec![ApplicationApartment {
            apartment_id,
            priority_number: 1,
        }],
        right_of_residence: ordering_number.map(|key| format!("{key:06}")),
        right_of_residence_ordering_number: ordering_number.map(OrderingNumber),
        right_of_residence_is_old_batch: false,
        submitted_late,
        has_children: sequence % 3 == 0,
        has_hitas_ownership: false,
        is_age_over_55: false,
        is_right_of_occupancy_housing_changer: false,
    }
}

fn demo_catalog() -> InMemoryCatalog {
    let haso_project = ProjectId(Uuid::from_u128(HASO_PROJECT));
    let hitas_project = ProjectId(Uuid::from_u128(HITAS_PROJECT));
    InMemoryCatalog::from_document(CatalogDocument {
        projects: vec![
            Project {
                id: haso_project,
                street_address: "Asumisoikeustie 1".to_string(),
                ownership_type: OwnershipType::Haso,
                apartment_count: 1,
            },
            Project {
                id: hitas_project,
                street_address: "Hitaskatu 2".to_string(),
                ownership_type: OwnershipType::Hitas,
                apartment_count: 1,
            },
        ],
        apartments: vec![
            Apartment {
                id: ApartmentId(Uuid::from_u128(HASO_APARTMENT)),
                project_id: haso_project,
                ownership_type: OwnershipType::Haso,
                apartment_number: "A1".to_string(),
                apartment_structure: "3h+k".to_string(),
                living_area: 72.0,
                floor: 2,
                state: ApartmentState::Free,
            },
            Apartment {
                id: ApartmentId(Uuid::from_u128(HITAS_APARTMENT)),
                project_id: hitas_project,
                ownership_type: OwnershipType::Hitas,
                apartment_number: "B1".to_string(),
                apartment_structure: "2h+kk".to_string(),
                living_area: 51.5,
                floor: 4,
                state: ApartmentState::Free,
            },
        ],
    })
}
