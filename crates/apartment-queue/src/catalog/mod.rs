//! Read-only view of the apartment and project catalog maintained by another service.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::queue::domain::{ApartmentId, OwnershipType, ProjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApartmentState {
    Free,
    Reserved,
    ReviewOfferAccepted,
    OfferMade,
    Sold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Apartment {
    pub id: ApartmentId,
    pub project_id: ProjectId,
    pub ownership_type: OwnershipType,
    pub apartment_number: String,
    pub apartment_structure: String,
    pub living_area: f64,
    pub floor: i32,
    #[serde(default = "default_apartment_state")]
    pub state: ApartmentState,
}

fn default_apartment_state() -> ApartmentState {
    ApartmentState::Free
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub street_address: String,
    pub ownership_type: OwnershipType,
    pub apartment_count: u32,
}

/// Lookups the queue and export layers need from the catalog.
pub trait ApartmentCatalog: Send + Sync {
    fn apartment(&self, id: &ApartmentId) -> Result<Apartment, CatalogError>;

    /// Apartment ids of the project in catalog order.
    fn apartment_ids(&self, project_id: &ProjectId) -> Result<Vec<ApartmentId>, CatalogError>;

    fn project(&self, id: &ProjectId) -> Result<Project, CatalogError>;

    fn project_of(&self, apartment_id: &ApartmentId) -> Result<Project, CatalogError> {
        let apartment = self.apartment(apartment_id)?;
        self.project(&apartment.project_id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("apartment {0} not found in catalog")]
    ApartmentNotFound(ApartmentId),
    #[error("project {0} not found in catalog")]
    ProjectNotFound(ProjectId),
}

/// Serialized catalog layout accepted by [`InMemoryCatalog`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub projects: Vec<Project>,
    pub apartments: Vec<Apartment>,
}

/// Catalog snapshot held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    projects: HashMap<ProjectId, Project>,
    apartments: HashMap<ApartmentId, Apartment>,
    order: Vec<ApartmentId>,
}

impl InMemoryCatalog {
    pub fn from_document(document: CatalogDocument) -> Self {
        let order = document.apartments.iter().map(|a| a.id).collect();
        Self {
            projects: document
                .projects
                .into_iter()
                .map(|project| (project.id, project))
                .collect(),
            apartments: document
                .apartments
                .into_iter()
                .map(|apartment| (apartment.id, apartment))
                .collect(),
            order,
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_reader(reader)?;
        Ok(Self::from_document(document))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }
}

impl ApartmentCatalog for InMemoryCatalog {
    fn apartment(&self, id: &ApartmentId) -> Result<Apartment, CatalogError> {
        self.apartments
            .get(id)
            .cloned()
            .ok_or(CatalogError::ApartmentNotFound(*id))
    }

    fn apartment_ids(&self, project_id: &ProjectId) -> Result<Vec<ApartmentId>, CatalogError> {
        if !self.projects.contains_key(project_id) {
            return Err(CatalogError::ProjectNotFound(*project_id));
        }
        Ok(self
            .order
            .iter()
            .filter(|id| {
                self.apartments
                    .get(id)
                    .is_some_and(|apartment| &apartment.project_id == project_id)
            })
            .copied()
            .collect())
    }

    fn project(&self, id: &ProjectId) -> Result<Project, CatalogError> {
        self.projects
            .get(id)
            .cloned()
            .ok_or(CatalogError::ProjectNotFound(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const CATALOG: &str = r#"{
        "projects": [
            {
                "id": "00000000-0000-4000-8000-000000000100",
                "street_address": "Aleksanterinkatu 5",
                "ownership_type": "HASO",
                "apartment_count": 2
            }
        ],
        "apartments": [
            {
                "id": "00000000-0000-4000-8000-000000000002",
                "project_id": "00000000-0000-4000-8000-000000000100",
                "ownership_type": "HASO",
                "apartment_number": "A2",
                "apartment_structure": "2h+k",
                "living_area": 48.5,
                "floor": 2
            },
            {
                "id": "00000000-0000-4000-8000-000000000001",
                "project_id": "00000000-0000-4000-8000-000000000100",
                "ownership_type": "HASO",
                "apartment_number": "A1",
                "apartment_structure": "1h+kk",
                "living_area": 31.0,
                "floor": 1,
                "state": "sold"
            }
        ]
    }"#;

    fn project_id() -> ProjectId {
        ProjectId(Uuid::from_u128(0x100))
    }

    #[test]
    fn loads_catalog_document_and_keeps_apartment_order() {
        let catalog = InMemoryCatalog::from_reader(CATALOG.as_bytes()).expect("catalog parses");
        let project_id: ProjectId =
            serde_json::from_str("\"00000000-0000-4000-8000-000000000100\"").expect("uuid");

        let ids = catalog.apartment_ids(&project_id).expect("project exists");
        let numbers: Vec<String> = ids
            .iter()
            .map(|id| catalog.apartment(id).expect("apartment").apartment_number)
            .collect();
        assert_eq!(numbers, vec!["A2", "A1"]);

        let first = catalog.apartment(&ids[0]).expect("apartment");
        assert_eq!(first.state, ApartmentState::Free);
        assert_eq!(first.ownership_type, OwnershipType::Haso);
        assert_eq!(
            catalog.project_of(&ids[1]).expect("project").street_address,
            "Aleksanterinkatu 5"
        );
        assert_eq!(catalog.projects().count(), 1);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let catalog = InMemoryCatalog::default();
        let apartment = ApartmentId(Uuid::new_v4());

        assert!(matches!(
            catalog.apartment(&apartment),
            Err(CatalogError::ApartmentNotFound(id)) if id == apartment
        ));
        assert!(matches!(
            catalog.apartment_ids(&project_id()),
            Err(CatalogError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn malformed_catalog_is_rejected() {
        assert!(matches!(
            InMemoryCatalog::from_reader("{\"projects\": 3}".as_bytes()),
            Err(CatalogError::Json(_))
        ));
    }
}
