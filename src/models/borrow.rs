//! Borrow record model, overdue rules and lifecycle outcomes

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::BorrowStatus;
use super::fine::{Fine, NewFine};

/// Borrow record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowRecord {
    pub id: i32,
    pub book_id: i32,
    pub member_id: Uuid,
    /// When the request was made
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: BorrowStatus,
    pub notes: Option<String>,
}

impl BorrowRecord {
    /// Status as seen by readers: an active loan past its due date is overdue
    /// whether or not the stored status says so.
    pub fn effective_status(&self, now: DateTime<Utc>) -> BorrowStatus {
        match self.status {
            BorrowStatus::Borrowed if self.due_date < now => BorrowStatus::Overdue,
            status => status,
        }
    }

    /// Full days past due at `now`; zero while the copy is not late
    pub fn days_overdue(&self, now: DateTime<Utc>) -> i64 {
        overdue_days(self.due_date, now)
    }
}

/// Whole days elapsed since `due_date`, floored. Zero when not yet due.
pub fn overdue_days(due_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    if now <= due_date {
        0
    } else {
        (now - due_date).num_days()
    }
}

/// Fine owed when a loan with `due_date` comes back at `returned_at`.
/// Returns `None` unless at least one full day has passed.
pub fn assess_fine(record: &BorrowRecord, returned_at: DateTime<Utc>, daily_rate: i64) -> Option<NewFine> {
    let days = overdue_days(record.due_date, returned_at);
    if days < 1 {
        return None;
    }

    Some(NewFine {
        borrow_record_id: record.id,
        member_id: record.member_id,
        amount: Decimal::from(days) * Decimal::from(daily_rate),
        description: Some(format!(
            "Returned {} day{} late",
            days,
            if days == 1 { "" } else { "s" }
        )),
    })
}

/// Due date for a loan of `days` starting at `from`
pub fn due_date_for(from: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    from + Duration::days(days)
}

/// Values for a new pending record
#[derive(Debug, Clone, PartialEq)]
pub struct NewBorrowRecord {
    pub book_id: i32,
    pub member_id: Uuid,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Borrow request body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBorrowRequest {
    pub book_id: i32,
    /// Loan period in days; server default when omitted
    #[validate(range(min = 1, message = "Loan period must be at least one day"))]
    pub days: Option<i64>,
    /// Admins may file a request on behalf of a member
    pub member_id: Option<Uuid>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Filters for borrow record listings
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct BorrowQuery {
    /// Stored status
    pub status: Option<BorrowStatus>,
    pub member_id: Option<Uuid>,
    pub book_id: Option<i32>,
    /// Only active loans past their due date
    pub overdue_only: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Row joined with book and member names
#[derive(Debug, Clone, FromRow)]
pub struct BorrowRecordRow {
    #[sqlx(flatten)]
    pub record: BorrowRecord,
    pub book_name: String,
    pub book_author: String,
    pub member_name: String,
    pub member_email: String,
}

/// Borrow record with display details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowRecordDetails {
    #[serde(flatten)]
    pub record: BorrowRecord,
    pub book_name: String,
    pub book_author: String,
    pub member_name: String,
    pub member_email: String,
    /// `overdue` for active loans past due, otherwise the stored status
    pub effective_status: BorrowStatus,
    pub is_overdue: bool,
    pub days_overdue: i64,
}

impl BorrowRecordDetails {
    pub fn from_row(row: BorrowRecordRow, now: DateTime<Utc>) -> Self {
        let effective_status = row.record.effective_status(now);
        let is_overdue = effective_status == BorrowStatus::Overdue;
        let days_overdue = if is_overdue {
            row.record.days_overdue(now)
        } else {
            0
        };
        Self {
            record: row.record,
            book_name: row.book_name,
            book_author: row.book_author,
            member_name: row.member_name,
            member_email: row.member_email,
            effective_status,
            is_overdue,
            days_overdue,
        }
    }
}

/// Outcome of a successful return
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReturnReceipt {
    pub record: BorrowRecord,
    /// Present when the copy came back at least one full day late
    pub fine: Option<Fine>,
}

/// Result of an atomic approve attempt
#[derive(Debug, Clone)]
pub enum ApproveOutcome {
    Approved(BorrowRecord),
    /// The record left `pending` before the update landed
    NotPending,
    /// The book had no available copy; nothing was written
    NoCopiesAvailable,
}

/// Result of an atomic return attempt
#[derive(Debug, Clone)]
pub enum ReturnOutcome {
    Returned {
        record: BorrowRecord,
        fine: Option<Fine>,
    },
    /// The record was not on loan
    NotOnLoan,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(status: BorrowStatus, due_date: DateTime<Utc>) -> BorrowRecord {
        BorrowRecord {
            id: 7,
            book_id: 3,
            member_id: Uuid::nil(),
            borrowed_at: due_date - Duration::days(14),
            due_date,
            returned_at: None,
            status,
            notes: None,
        }
    }

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn on_time_return_has_no_fine() {
        let rec = record(BorrowStatus::Borrowed, due());
        assert!(assess_fine(&rec, due(), 10).is_none());
        assert!(assess_fine(&rec, due() - Duration::days(2), 10).is_none());
    }

    #[test]
    fn three_days_late_costs_thirty() {
        let rec = record(BorrowStatus::Borrowed, due());
        let fine = assess_fine(&rec, due() + Duration::days(3), 10).unwrap();
        assert_eq!(fine.amount, Decimal::from(30));
        assert_eq!(fine.borrow_record_id, 7);
        assert_eq!(fine.description.as_deref(), Some("Returned 3 days late"));
    }

    #[test]
    fn partial_days_are_floored() {
        let rec = record(BorrowStatus::Borrowed, due());
        let late = due() + Duration::days(2) + Duration::hours(23);
        assert_eq!(assess_fine(&rec, late, 10).unwrap().amount, Decimal::from(20));
        assert!(assess_fine(&rec, due() + Duration::hours(5), 10).is_none());
    }

    #[test]
    fn effective_status_flags_late_loans() {
        let rec = record(BorrowStatus::Borrowed, due());
        assert_eq!(rec.effective_status(due() - Duration::hours(1)), BorrowStatus::Borrowed);
        assert_eq!(rec.effective_status(due() + Duration::hours(1)), BorrowStatus::Overdue);

        let pending = record(BorrowStatus::Pending, due());
        assert_eq!(pending.effective_status(due() + Duration::days(9)), BorrowStatus::Pending);

        let stored = record(BorrowStatus::Overdue, due());
        assert_eq!(stored.effective_status(due() - Duration::days(1)), BorrowStatus::Overdue);
    }

    #[test]
    fn details_carry_overdue_days() {
        let row = BorrowRecordRow {
            record: record(BorrowStatus::Borrowed, due()),
            book_name: "Dune".to_string(),
            book_author: "Frank Herbert".to_string(),
            member_name: "Ada".to_string(),
            member_email: "ada@example.org".to_string(),
        };
        let details = BorrowRecordDetails::from_row(row, due() + Duration::days(4));
        assert!(details.is_overdue);
        assert_eq!(details.days_overdue, 4);
    }

    #[test]
    fn due_date_adds_days() {
        assert_eq!(due_date_for(due(), 14), due() + Duration::days(14));
    }
}
