//! Report payloads

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::enums::BorrowStatus;

/// Library-wide counters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportSummary {
    pub books: i64,
    pub total_copies: i64,
    pub available_copies: i64,
    pub members: i64,
    pub pending_requests: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub outstanding_fines: Decimal,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PopularBook {
    pub book_id: i32,
    pub name: String,
    pub author: String,
    pub borrow_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActiveMember {
    pub member_id: Uuid,
    pub name: String,
    pub email: String,
    pub borrow_count: i64,
}

/// One exported loan
#[derive(Debug, Clone, Serialize)]
pub struct BorrowHistoryEntry {
    pub record_id: i32,
    pub book_id: i32,
    pub book_name: String,
    pub member_name: String,
    pub member_email: String,
    pub status: BorrowStatus,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ReportQuery {
    /// Number of rows in ranked reports (default 10)
    pub limit: Option<usize>,
    /// Only loans requested at or after this instant
    pub since: Option<DateTime<Utc>>,
}

/// Exportable report, addressed by its slug in URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    PopularBooks,
    ActiveMembers,
    BorrowHistory,
}

impl ReportKind {
    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::PopularBooks => "popular-books",
            ReportKind::ActiveMembers => "active-members",
            ReportKind::BorrowHistory => "borrow-history",
        }
    }
}

impl std::str::FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popular-books" => Ok(ReportKind::PopularBooks),
            "active-members" => Ok(ReportKind::ActiveMembers),
            "borrow-history" => Ok(ReportKind::BorrowHistory),
            _ => Err(format!("Unknown report: {}", s)),
        }
    }
}
