//! Books repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{like_pattern, page_bounds};
use crate::{
    error::{AppError, AppResult},
    models::book::{patched, rebalance_available, Book, BookQuery, CreateBook, UpdateBook},
};

const SEARCH_FILTER: &str = r#"
    ($1::text IS NULL OR name ILIKE $1 OR author ILIKE $1 OR isbn ILIKE $1)
    AND ($2::text IS NULL OR $2 = ANY(categories))
    AND ($3::int IS NULL OR shelf_id = $3)
    AND (NOT $4 OR available_copies > 0)
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search books with filters and pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let pattern = like_pattern(query.search.as_deref());
        let in_stock = query.in_stock.unwrap_or(false);
        let (limit, offset) = page_bounds(query.page, query.per_page);

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM books WHERE {}", SEARCH_FILTER))
            .bind(&pattern)
            .bind(&query.category)
            .bind(query.shelf_id)
            .bind(in_stock)
            .fetch_one(&self.pool)
            .await?;

        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT * FROM books WHERE {} ORDER BY name, id LIMIT $5 OFFSET $6",
            SEARCH_FILTER
        ))
        .bind(&pattern)
        .bind(&query.category)
        .bind(query.shelf_id)
        .bind(in_stock)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((books, total))
    }

    /// Create a new book with all copies available
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let copies = book.total_copies.unwrap_or(1);

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (uid, name, author, categories, shelf_id, total_copies,
                               available_copies, isbn, publisher, published_year, cover_image)
            VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(book.name.trim())
        .bind(book.author.trim())
        .bind(&book.categories)
        .bind(book.shelf_id)
        .bind(copies)
        .bind(&book.isbn)
        .bind(&book.publisher)
        .bind(book.published_year)
        .bind(&book.cover_image)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update a book. A new total shifts the available count by the same delta.
    /// Nullable columns are resolved against the locked row.
    pub async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let total = data.total_copies.unwrap_or(current.total_copies);
        let available = rebalance_available(current.total_copies, current.available_copies, total)
            .ok_or_else(|| {
                AppError::BusinessRule(format!(
                    "{} copies are on loan; total cannot drop to {}",
                    current.copies_out(),
                    total
                ))
            })?;

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                name = COALESCE($2, name),
                author = COALESCE($3, author),
                categories = COALESCE($4, categories),
                shelf_id = $5,
                total_copies = $6,
                available_copies = $7,
                isbn = $8,
                publisher = $9,
                published_year = $10,
                cover_image = $11,
                updated_at = $12
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.name.as_deref().map(str::trim))
        .bind(data.author.as_deref().map(str::trim))
        .bind(&data.categories)
        .bind(patched(&data.shelf_id, &current.shelf_id))
        .bind(total)
        .bind(available)
        .bind(patched(&data.isbn, &current.isbn))
        .bind(patched(&data.publisher, &current.publisher))
        .bind(patched(&data.published_year, &current.published_year))
        .bind(patched(&data.cover_image, &current.cover_image))
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a book. Refused while requests or loans are open unless forced.
    pub async fn delete(&self, id: i32, force: bool) -> AppResult<()> {
        if !force {
            let open = self.count_open_borrows(id).await?;
            if open > 0 {
                return Err(AppError::Conflict(format!(
                    "Book has {} pending or active borrow record(s)",
                    open
                )));
            }
        }

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    /// Pending requests plus copies currently out
    pub async fn count_open_borrows(&self, book_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_records WHERE book_id = $1 AND status IN ('pending', 'borrowed', 'overdue')",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Distinct categories in use, alphabetically
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT UNNEST(categories) AS category FROM books ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    /// Books with at least one copy on the shelf, most copies first
    pub async fn in_stock(&self, limit: i64) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE available_copies > 0 ORDER BY available_copies DESC, name LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }
}
