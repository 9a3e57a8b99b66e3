//! Shelves service

use crate::{
    error::AppResult,
    models::shelf::{BookShelf, CreateShelf, ShelfUsage, UpdateShelf},
    repository::Repository,
};

#[derive(Clone)]
pub struct ShelvesService {
    repository: Repository,
}

impl ShelvesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<ShelfUsage>> {
        self.repository.shelves.list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<ShelfUsage> {
        self.repository.shelves.get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateShelf) -> AppResult<BookShelf> {
        let shelf = self.repository.shelves.create(data).await?;
        tracing::info!("Shelf {} created: {} ({})", shelf.id, shelf.name, shelf.location);
        Ok(shelf)
    }

    pub async fn update(&self, id: i32, data: &UpdateShelf) -> AppResult<BookShelf> {
        self.repository.shelves.update(id, data).await
    }

    /// Delete a shelf. Books on it stay in the catalog, unshelved.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.shelves.delete(id).await?;
        tracing::info!("Shelf {} deleted", id);
        Ok(())
    }
}
