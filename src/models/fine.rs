//! Fine model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Fine from database. Immutable apart from `paid` / `paid_at`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Fine {
    pub id: i32,
    pub borrow_record_id: i32,
    pub member_id: Uuid,
    pub amount: Decimal,
    pub paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Values for a fine about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewFine {
    pub borrow_record_id: i32,
    pub member_id: Uuid,
    pub amount: Decimal,
    pub description: Option<String>,
}

/// Fine joined with member and book names
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FineDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub fine: Fine,
    pub member_name: String,
    pub book_name: String,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct FineQuery {
    pub member_id: Option<Uuid>,
    pub paid: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Outstanding balance for one member
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FineBalance {
    pub member_id: Uuid,
    pub outstanding: Decimal,
    pub unpaid_count: i64,
}
