//! Shelves repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::shelf::{BookShelf, CreateShelf, ShelfUsage, UpdateShelf},
};

const USAGE_SELECT: &str = r#"
    SELECT s.*, COUNT(b.id) AS book_count, COALESCE(SUM(b.total_copies), 0)::bigint AS copies
    FROM book_shelves s
    LEFT JOIN books b ON b.shelf_id = s.id
"#;

#[derive(Clone)]
pub struct ShelvesRepository {
    pool: Pool<Postgres>,
}

impl ShelvesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all shelves with their usage
    pub async fn list(&self) -> AppResult<Vec<ShelfUsage>> {
        let rows = sqlx::query_as::<_, ShelfUsage>(&format!(
            "{} GROUP BY s.id ORDER BY s.name",
            USAGE_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ShelfUsage::with_usage).collect())
    }

    /// Get shelf by ID with its usage
    pub async fn get_by_id(&self, id: i32) -> AppResult<ShelfUsage> {
        sqlx::query_as::<_, ShelfUsage>(&format!("{} WHERE s.id = $1 GROUP BY s.id", USAGE_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(ShelfUsage::with_usage)
            .ok_or_else(|| AppError::NotFound(format!("Shelf {} not found", id)))
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM book_shelves WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Create shelf
    pub async fn create(&self, data: &CreateShelf) -> AppResult<BookShelf> {
        let row = sqlx::query_as::<_, BookShelf>(
            "INSERT INTO book_shelves (name, location, capacity) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(data.name.trim())
        .bind(data.location.trim())
        .bind(data.capacity)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update shelf
    pub async fn update(&self, id: i32, data: &UpdateShelf) -> AppResult<BookShelf> {
        sqlx::query_as::<_, BookShelf>(
            r#"
            UPDATE book_shelves SET
                name = COALESCE($2, name),
                location = COALESCE($3, location),
                capacity = COALESCE($4, capacity)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.name.as_deref().map(str::trim))
        .bind(data.location.as_deref().map(str::trim))
        .bind(data.capacity)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Shelf {} not found", id)))
    }

    /// Delete shelf; its books lose their shelf assignment
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_shelves WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Shelf {} not found", id)));
        }
        Ok(())
    }
}
