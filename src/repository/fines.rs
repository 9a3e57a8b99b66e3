//! Fines repository for database operations

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use super::page_bounds;
use crate::{
    error::{AppError, AppResult},
    models::fine::{Fine, FineBalance, FineDetails, FineQuery},
};

#[derive(Clone)]
pub struct FinesRepository {
    pool: Pool<Postgres>,
}

impl FinesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get fine by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Fine> {
        sqlx::query_as::<_, Fine>("SELECT * FROM fines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Fine with id {} not found", id)))
    }

    /// List fines, newest first
    pub async fn list(&self, query: &FineQuery) -> AppResult<(Vec<FineDetails>, i64)> {
        let (limit, offset) = page_bounds(query.page, query.per_page);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM fines f
            WHERE ($1::uuid IS NULL OR f.member_id = $1) AND ($2::bool IS NULL OR f.paid = $2)
            "#,
        )
        .bind(query.member_id)
        .bind(query.paid)
        .fetch_one(&self.pool)
        .await?;

        let fines = sqlx::query_as::<_, FineDetails>(
            r#"
            SELECT f.*, u.name AS member_name, b.name AS book_name
            FROM fines f
            JOIN users u ON u.id = f.member_id
            JOIN borrow_records r ON r.id = f.borrow_record_id
            JOIN books b ON b.id = r.book_id
            WHERE ($1::uuid IS NULL OR f.member_id = $1) AND ($2::bool IS NULL OR f.paid = $2)
            ORDER BY f.created_at DESC, f.id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.member_id)
        .bind(query.paid)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((fines, total))
    }

    /// Flag an unpaid fine as paid. `None` when it was already paid.
    pub async fn mark_paid(&self, id: i32, paid_at: DateTime<Utc>) -> AppResult<Option<Fine>> {
        let fine = sqlx::query_as::<_, Fine>(
            "UPDATE fines SET paid = TRUE, paid_at = $2 WHERE id = $1 AND paid = FALSE RETURNING *",
        )
        .bind(id)
        .bind(paid_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(fine)
    }

    /// Unpaid total for one member
    pub async fn balance(&self, member_id: Uuid) -> AppResult<FineBalance> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount), 0) AS outstanding, COUNT(*) AS unpaid_count
            FROM fines WHERE member_id = $1 AND paid = FALSE
            "#,
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(FineBalance {
            member_id,
            outstanding: row.get::<Decimal, _>("outstanding"),
            unpaid_count: row.get("unpaid_count"),
        })
    }
}
