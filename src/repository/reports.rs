//! Read-only queries feeding the reports

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, Pool, Postgres, Row};
use uuid::Uuid;

use crate::{error::AppResult, models::enums::BorrowStatus};

/// One approved loan, with enough context for grouping and export
#[derive(Debug, Clone, FromRow)]
pub struct LoanRow {
    pub record_id: i32,
    pub book_id: i32,
    pub book_name: String,
    pub book_author: String,
    pub member_id: Uuid,
    pub member_name: String,
    pub member_email: String,
    pub status: BorrowStatus,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

/// Raw counters for the summary report
#[derive(Debug, Clone, Default)]
pub struct SummaryCounts {
    pub books: i64,
    pub total_copies: i64,
    pub available_copies: i64,
    pub members: i64,
    pub pending_requests: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub outstanding_fines: Decimal,
}

#[derive(Clone)]
pub struct ReportsRepository {
    pool: Pool<Postgres>,
}

impl ReportsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Every record that was ever lent out, oldest first
    pub async fn loan_rows(&self, since: Option<DateTime<Utc>>) -> AppResult<Vec<LoanRow>> {
        let rows = sqlx::query_as::<_, LoanRow>(
            r#"
            SELECT r.id AS record_id, r.book_id, b.name AS book_name, b.author AS book_author,
                   r.member_id, u.name AS member_name, u.email AS member_email,
                   r.status, r.borrowed_at, r.due_date, r.returned_at
            FROM borrow_records r
            JOIN books b ON b.id = r.book_id
            JOIN users u ON u.id = r.member_id
            WHERE r.status IN ('borrowed', 'returned', 'overdue')
              AND ($1::timestamptz IS NULL OR r.borrowed_at >= $1)
            ORDER BY r.borrowed_at, r.id
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn summary(&self, now: DateTime<Utc>) -> AppResult<SummaryCounts> {
        let books = sqlx::query(
            r#"
            SELECT COUNT(*) AS books,
                   COALESCE(SUM(total_copies), 0)::bigint AS total_copies,
                   COALESCE(SUM(available_copies), 0)::bigint AS available_copies
            FROM books
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let members: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'member'")
            .fetch_one(&self.pool)
            .await?;

        let borrows = sqlx::query(
            r#"
            SELECT COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                   COUNT(*) FILTER (WHERE status IN ('borrowed', 'overdue')) AS active,
                   COUNT(*) FILTER (WHERE status IN ('borrowed', 'overdue') AND due_date < $1) AS overdue
            FROM borrow_records
            "#,
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        let outstanding_fines: Decimal =
            sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM fines WHERE paid = FALSE")
                .fetch_one(&self.pool)
                .await?;

        Ok(SummaryCounts {
            books: books.get("books"),
            total_copies: books.get("total_copies"),
            available_copies: books.get("available_copies"),
            members,
            pending_requests: borrows.get("pending"),
            active_loans: borrows.get("active"),
            overdue_loans: borrows.get("overdue"),
            outstanding_fines,
        })
    }
}
