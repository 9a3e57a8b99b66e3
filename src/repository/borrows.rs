//! Borrow records: the lending ledger
//!
//! Multi-step transitions (approve, return) run in one transaction and use
//! conditional updates, so a concurrent request can never push
//! `available_copies` below zero or return the same copy twice.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::page_bounds;
use crate::{
    error::{AppError, AppResult},
    models::{
        borrow::{ApproveOutcome, BorrowQuery, BorrowRecord, BorrowRecordRow, NewBorrowRecord, ReturnOutcome},
        fine::{Fine, NewFine},
    },
};

/// Storage operations behind the borrow workflow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowLedger: Send + Sync {
    async fn get(&self, id: i32) -> AppResult<BorrowRecord>;

    async fn book_exists(&self, book_id: i32) -> AppResult<bool>;

    async fn insert_pending(&self, record: NewBorrowRecord) -> AppResult<BorrowRecord>;

    /// `pending -> borrowed` and take one copy off the shelf, atomically
    async fn approve(&self, id: i32) -> AppResult<ApproveOutcome>;

    /// `pending -> rejected`; `None` when the record was not pending
    async fn reject(&self, id: i32) -> AppResult<Option<BorrowRecord>>;

    /// Delete a pending record, optionally only if owned by `member_id`
    async fn cancel_pending(&self, id: i32, member_id: Option<Uuid>) -> AppResult<bool>;

    /// `borrowed|overdue -> returned`, record the fine if any and put the copy back
    async fn complete_return(
        &self,
        id: i32,
        returned_at: DateTime<Utc>,
        fine: Option<NewFine>,
    ) -> AppResult<ReturnOutcome>;

    async fn list(&self, query: BorrowQuery, now: DateTime<Utc>) -> AppResult<(Vec<BorrowRecordRow>, i64)>;
}

const DETAILS_SELECT: &str = r#"
    SELECT r.*, b.name AS book_name, b.author AS book_author,
           u.name AS member_name, u.email AS member_email
    FROM borrow_records r
    JOIN books b ON b.id = r.book_id
    JOIN users u ON u.id = r.member_id
"#;

const LIST_FILTER: &str = r#"
    ($1::text IS NULL OR r.status = $1)
    AND ($2::uuid IS NULL OR r.member_id = $2)
    AND ($3::int IS NULL OR r.book_id = $3)
    AND (NOT $4 OR (r.status IN ('borrowed', 'overdue') AND r.due_date < $5))
"#;

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowLedger for BorrowsRepository {
    async fn get(&self, id: i32) -> AppResult<BorrowRecord> {
        sqlx::query_as::<_, BorrowRecord>("SELECT * FROM borrow_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow record with id {} not found", id)))
    }

    async fn book_exists(&self, book_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert_pending(&self, record: NewBorrowRecord) -> AppResult<BorrowRecord> {
        let created = sqlx::query_as::<_, BorrowRecord>(
            r#"
            INSERT INTO borrow_records (book_id, member_id, borrowed_at, due_date, status, notes)
            VALUES ($1, $2, $3, $4, 'pending', $5)
            RETURNING *
            "#,
        )
        .bind(record.book_id)
        .bind(record.member_id)
        .bind(record.borrowed_at)
        .bind(record.due_date)
        .bind(&record.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn approve(&self, id: i32) -> AppResult<ApproveOutcome> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, BorrowRecord>(
            "UPDATE borrow_records SET status = 'borrowed' WHERE id = $1 AND status = 'pending' RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(record) = record else {
            return Ok(ApproveOutcome::NotPending);
        };

        let taken = sqlx::query(
            "UPDATE books SET available_copies = available_copies - 1, updated_at = NOW() WHERE id = $1 AND available_copies > 0",
        )
        .bind(record.book_id)
        .execute(&mut *tx)
        .await?;

        if taken.rows_affected() == 0 {
            // dropping the transaction rolls back the status change
            return Ok(ApproveOutcome::NoCopiesAvailable);
        }

        tx.commit().await?;
        Ok(ApproveOutcome::Approved(record))
    }

    async fn reject(&self, id: i32) -> AppResult<Option<BorrowRecord>> {
        let record = sqlx::query_as::<_, BorrowRecord>(
            "UPDATE borrow_records SET status = 'rejected' WHERE id = $1 AND status = 'pending' RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn cancel_pending(&self, id: i32, member_id: Option<Uuid>) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM borrow_records WHERE id = $1 AND status = 'pending' AND ($2::uuid IS NULL OR member_id = $2)",
        )
        .bind(id)
        .bind(member_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn complete_return(
        &self,
        id: i32,
        returned_at: DateTime<Utc>,
        fine: Option<NewFine>,
    ) -> AppResult<ReturnOutcome> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, BorrowRecord>(
            r#"
            UPDATE borrow_records SET status = 'returned', returned_at = $2
            WHERE id = $1 AND status IN ('borrowed', 'overdue')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(returned_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(record) = record else {
            return Ok(ReturnOutcome::NotOnLoan);
        };

        let fine = match fine {
            Some(fine) => Some(
                sqlx::query_as::<_, Fine>(
                    r#"
                    INSERT INTO fines (borrow_record_id, member_id, amount, paid, description, created_at)
                    VALUES ($1, $2, $3, FALSE, $4, $5)
                    RETURNING *
                    "#,
                )
                .bind(fine.borrow_record_id)
                .bind(fine.member_id)
                .bind(fine.amount)
                .bind(&fine.description)
                .bind(returned_at)
                .fetch_one(&mut *tx)
                .await?,
            ),
            None => None,
        };

        sqlx::query(
            "UPDATE books SET available_copies = LEAST(available_copies + 1, total_copies), updated_at = NOW() WHERE id = $1",
        )
        .bind(record.book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ReturnOutcome::Returned { record, fine })
    }

    async fn list(&self, query: BorrowQuery, now: DateTime<Utc>) -> AppResult<(Vec<BorrowRecordRow>, i64)> {
        let status = query.status.map(|s| s.as_str());
        let overdue_only = query.overdue_only.unwrap_or(false);
        let (limit, offset) = page_bounds(query.page, query.per_page);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM borrow_records r WHERE {}",
            LIST_FILTER
        ))
        .bind(status)
        .bind(query.member_id)
        .bind(query.book_id)
        .bind(overdue_only)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, BorrowRecordRow>(&format!(
            "{} WHERE {} ORDER BY r.borrowed_at DESC, r.id DESC LIMIT $6 OFFSET $7",
            DETAILS_SELECT, LIST_FILTER
        ))
        .bind(status)
        .bind(query.member_id)
        .bind(query.book_id)
        .bind(overdue_only)
        .bind(now)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }
}
