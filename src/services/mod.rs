//! Business logic services

pub mod assistant;
pub mod borrows;
pub mod catalog;
pub mod fines;
pub mod reports;
pub mod shelves;
pub mod users;

use std::sync::Arc;

use crate::{
    config::{AssistantConfig, AuthConfig, BorrowingConfig, FinesConfig},
    error::AppResult,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub assistant: assistant::AssistantService,
    pub borrows: borrows::BorrowsService,
    pub catalog: catalog::CatalogService,
    pub fines: fines::FinesService,
    pub reports: reports::ReportsService,
    pub shelves: shelves::ShelvesService,
    pub users: users::UsersService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        borrowing_config: BorrowingConfig,
        fines_config: FinesConfig,
        assistant_config: AssistantConfig,
    ) -> AppResult<Self> {
        let catalog = catalog::CatalogService::new(repository.clone());

        Ok(Self {
            assistant: assistant::AssistantService::new(catalog.clone(), assistant_config)?,
            borrows: borrows::BorrowsService::new(
                Arc::new(repository.borrows.clone()),
                borrowing_config,
                fines_config,
            ),
            catalog,
            fines: fines::FinesService::new(repository.clone()),
            reports: reports::ReportsService::new(repository.clone()),
            shelves: shelves::ShelvesService::new(repository.clone()),
            users: users::UsersService::new(repository.clone(), auth_config),
            repository,
        })
    }

    /// Database reachability, for readiness probes
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
