//! Catalog management service

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book, all copies on the shelf
    pub async fn create_book(&self, book: &CreateBook) -> AppResult<Book> {
        if let Some(shelf_id) = book.shelf_id {
            self.ensure_shelf(shelf_id).await?;
        }

        let created = self.repository.books.create(book).await?;
        tracing::info!(
            "Book {} created: \"{}\" by {} ({} copies)",
            created.id,
            created.name,
            created.author,
            created.total_copies
        );
        Ok(created)
    }

    /// Update an existing book
    pub async fn update_book(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        if let Some(Some(shelf_id)) = data.shelf_id {
            self.ensure_shelf(shelf_id).await?;
        }

        let updated = self.repository.books.update(id, data).await?;
        tracing::info!("Book {} updated", id);
        Ok(updated)
    }

    /// Delete a book. Open borrow records block the delete unless `force`.
    pub async fn delete_book(&self, id: i32, force: bool) -> AppResult<()> {
        self.repository.books.delete(id, force).await?;
        tracing::info!("Book {} deleted (force={})", id, force);
        Ok(())
    }

    pub async fn categories(&self) -> AppResult<Vec<String>> {
        self.repository.books.categories().await
    }

    /// Books with at least one available copy, capped at `limit`
    pub async fn in_stock(&self, limit: i64) -> AppResult<Vec<Book>> {
        self.repository.books.in_stock(limit).await
    }

    async fn ensure_shelf(&self, shelf_id: i32) -> AppResult<()> {
        if !self.repository.shelves.exists(shelf_id).await? {
            return Err(AppError::Validation(format!("Shelf {} does not exist", shelf_id)));
        }
        Ok(())
    }
}
