//! Users repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{like_pattern, page_bounds};
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::Role,
        user::{User, UserQuery, UserShort},
    },
};

const EMAIL_TAKEN: &str = "Email is already registered";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by email (case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Insert a new user with an already hashed password
    pub async fn create(&self, email: &str, name: &str, role: Role, password_hash: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, role, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email.trim())
        .bind(name.trim())
        .bind(role)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::on_unique_violation(e, EMAIL_TAKEN))
    }

    /// Update profile fields; `None` leaves a field unchanged
    pub async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
        password_hash: Option<&str>,
    ) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name.map(str::trim))
        .bind(email.map(str::trim))
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::on_unique_violation(e, EMAIL_TAKEN))?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Change a user's role
    pub async fn update_role(&self, id: Uuid, role: Role) -> AppResult<User> {
        sqlx::query_as::<_, User>("UPDATE users SET role = $2, updated_at = $3 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(role)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Search users by name or email with loan counters
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<UserShort>, i64)> {
        let pattern = like_pattern(query.search.as_deref());
        let role = query.role.map(|r| r.as_str());
        let (limit, offset) = page_bounds(query.page, query.per_page);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users u
            WHERE ($1::text IS NULL OR u.name ILIKE $1 OR u.email ILIKE $1)
              AND ($2::text IS NULL OR u.role = $2)
            "#,
        )
        .bind(&pattern)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        let users = sqlx::query_as::<_, UserShort>(
            r#"
            SELECT u.id, u.email, u.name, u.role,
                   COUNT(r.id) FILTER (WHERE r.status IN ('borrowed', 'overdue')) AS nb_loans,
                   COUNT(r.id) FILTER (WHERE r.status IN ('borrowed', 'overdue') AND r.due_date < NOW()) AS nb_late_loans
            FROM users u
            LEFT JOIN borrow_records r ON r.member_id = u.id
            WHERE ($1::text IS NULL OR u.name ILIKE $1 OR u.email ILIKE $1)
              AND ($2::text IS NULL OR u.role = $2)
            GROUP BY u.id
            ORDER BY u.name, u.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&pattern)
        .bind(role)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((users, total))
    }

    /// Copies currently out with this member
    pub async fn count_active_loans(&self, id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_records WHERE member_id = $1 AND status IN ('borrowed', 'overdue')",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn count_by_role(&self, role: Role) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Delete a user and their records. Copies still out with the user are
    /// put back on the shelf first.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE books b SET available_copies = LEAST(b.available_copies + out.n, b.total_copies)
            FROM (
                SELECT book_id, COUNT(*)::int AS n FROM borrow_records
                WHERE member_id = $1 AND status IN ('borrowed', 'overdue')
                GROUP BY book_id
            ) out
            WHERE b.id = out.book_id
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }
}
