//! Repository layer for database operations

pub mod books;
pub mod borrows;
pub mod fines;
pub mod reports;
pub mod shelves;
pub mod users;

use sqlx::{Pool, Postgres};

pub use borrows::BorrowLedger;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub borrows: borrows::BorrowsRepository,
    pub fines: fines::FinesRepository,
    pub reports: reports::ReportsRepository,
    pub shelves: shelves::ShelvesRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            borrows: borrows::BorrowsRepository::new(pool.clone()),
            fines: fines::FinesRepository::new(pool.clone()),
            reports: reports::ReportsRepository::new(pool.clone()),
            shelves: shelves::ShelvesRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> crate::AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 200;

/// LIMIT / OFFSET for a 1-based page
pub fn page_bounds(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let page = page.unwrap_or(1).max(1);
    (per_page, (page - 1).saturating_mul(per_page))
}

/// `%term%` pattern for ILIKE searches; `None` for blank input
pub fn like_pattern(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| format!("%{}%", t.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds_clamp_input() {
        assert_eq!(page_bounds(None, None), (20, 0));
        assert_eq!(page_bounds(Some(3), Some(10)), (10, 20));
        assert_eq!(page_bounds(Some(0), Some(0)), (1, 0));
        assert_eq!(page_bounds(Some(2), Some(10_000)), (MAX_PER_PAGE, MAX_PER_PAGE));
    }

    #[test]
    fn page_bounds_saturate_huge_pages() {
        let (limit, offset) = page_bounds(Some(i64::MAX), Some(20));
        assert_eq!(limit, 20);
        assert_eq!(offset, i64::MAX);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(Some(" dune ")), Some("%dune%".to_string()));
        assert_eq!(like_pattern(Some("100%")), Some("%100\\%%".to_string()));
        assert_eq!(like_pattern(Some("   ")), None);
        assert_eq!(like_pattern(None), None);
    }
}
