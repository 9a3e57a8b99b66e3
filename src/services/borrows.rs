//! Borrow request lifecycle
//!
//! pending -> borrowed | rejected, borrowed -> returned (with a fine when late).
//! Pending records may be cancelled (deleted) by their member.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    config::{BorrowingConfig, FinesConfig},
    error::{AppError, AppResult},
    models::{
        borrow::{
            assess_fine, due_date_for, ApproveOutcome, BorrowQuery, BorrowRecord, BorrowRecordDetails,
            NewBorrowRecord, ReturnOutcome, ReturnReceipt,
        },
        enums::BorrowStatus,
    },
    repository::BorrowLedger,
};

#[derive(Clone)]
pub struct BorrowsService {
    ledger: Arc<dyn BorrowLedger>,
    borrowing: BorrowingConfig,
    fines: FinesConfig,
}

impl BorrowsService {
    pub fn new(ledger: Arc<dyn BorrowLedger>, borrowing: BorrowingConfig, fines: FinesConfig) -> Self {
        Self {
            ledger,
            borrowing,
            fines,
        }
    }

    pub async fn get(&self, id: i32) -> AppResult<BorrowRecord> {
        self.ledger.get(id).await
    }

    /// File a borrow request. No copy is reserved until an admin approves it.
    pub async fn request_borrow(
        &self,
        book_id: i32,
        member_id: Uuid,
        days: Option<i64>,
        notes: Option<String>,
    ) -> AppResult<BorrowRecord> {
        self.request_borrow_at(book_id, member_id, days, notes, Utc::now()).await
    }

    pub async fn request_borrow_at(
        &self,
        book_id: i32,
        member_id: Uuid,
        days: Option<i64>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<BorrowRecord> {
        let days = days.unwrap_or(self.borrowing.default_days);
        if days < 1 || days > self.borrowing.max_days {
            return Err(AppError::Validation(format!(
                "Loan period must be between 1 and {} days",
                self.borrowing.max_days
            )));
        }

        if !self.ledger.book_exists(book_id).await? {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }

        let record = self
            .ledger
            .insert_pending(NewBorrowRecord {
                book_id,
                member_id,
                borrowed_at: now,
                due_date: due_date_for(now, days),
                notes,
            })
            .await?;

        tracing::info!(
            "Borrow request {} filed: book {} for member {} ({} days)",
            record.id,
            book_id,
            member_id,
            days
        );
        Ok(record)
    }

    /// Approve a pending request and take one copy off the shelf
    pub async fn approve(&self, id: i32) -> AppResult<BorrowRecord> {
        match self.ledger.approve(id).await? {
            ApproveOutcome::Approved(record) => {
                tracing::info!("Borrow request {} approved (book {})", id, record.book_id);
                Ok(record)
            }
            ApproveOutcome::NotPending => Err(self.not_in_status(id, "pending").await),
            ApproveOutcome::NoCopiesAvailable => {
                tracing::warn!("Borrow request {} not approved: no copies available", id);
                Err(AppError::NoCopiesAvailable(
                    "Every copy of this book is already lent out".to_string(),
                ))
            }
        }
    }

    /// Reject a pending request. Copy counts are untouched.
    pub async fn reject(&self, id: i32) -> AppResult<BorrowRecord> {
        match self.ledger.reject(id).await? {
            Some(record) => {
                tracing::info!("Borrow request {} rejected", id);
                Ok(record)
            }
            None => Err(self.not_in_status(id, "pending").await),
        }
    }

    /// Delete a still-pending request. `owner` restricts the cancel to that
    /// member's own records. Records past `pending` are left alone and
    /// `false` is returned.
    pub async fn cancel(&self, id: i32, owner: Option<Uuid>) -> AppResult<bool> {
        let record = self.ledger.get(id).await?;

        if let Some(member_id) = owner {
            if record.member_id != member_id {
                return Err(AppError::Authorization(
                    "Cannot cancel another member's request".to_string(),
                ));
            }
        }

        if record.status != BorrowStatus::Pending {
            tracing::debug!("Cancel of borrow record {} ignored: status is {}", id, record.status);
            return Ok(false);
        }

        let cancelled = self.ledger.cancel_pending(id, owner).await?;
        if cancelled {
            tracing::info!("Borrow request {} cancelled", id);
        }
        Ok(cancelled)
    }

    /// Take a copy back. A fine is recorded when it is at least a day late.
    pub async fn mark_returned(&self, id: i32) -> AppResult<ReturnReceipt> {
        self.mark_returned_at(id, Utc::now()).await
    }

    pub async fn mark_returned_at(&self, id: i32, now: DateTime<Utc>) -> AppResult<ReturnReceipt> {
        let record = self.ledger.get(id).await?;
        if !record.status.is_on_loan() {
            return Err(AppError::BusinessRule(format!(
                "Borrow record {} is {}, not on loan",
                id, record.status
            )));
        }

        let fine = assess_fine(&record, now, self.fines.daily_rate);

        match self.ledger.complete_return(id, now, fine).await? {
            ReturnOutcome::Returned { record, fine } => {
                match &fine {
                    Some(f) => tracing::info!(
                        "Borrow record {} returned late, fine {} of {}",
                        id,
                        f.id,
                        f.amount
                    ),
                    None => tracing::info!("Borrow record {} returned", id),
                }
                Ok(ReturnReceipt { record, fine })
            }
            ReturnOutcome::NotOnLoan => Err(self.not_in_status(id, "on loan").await),
        }
    }

    /// All records matching `query`, with computed overdue state
    pub async fn list(&self, query: BorrowQuery) -> AppResult<(Vec<BorrowRecordDetails>, i64)> {
        let now = Utc::now();
        let (rows, total) = self.ledger.list(query, now).await?;
        let records = rows
            .into_iter()
            .map(|row| BorrowRecordDetails::from_row(row, now))
            .collect();
        Ok((records, total))
    }

    /// Records of one member
    pub async fn list_for_member(&self, member_id: Uuid, mut query: BorrowQuery) -> AppResult<(Vec<BorrowRecordDetails>, i64)> {
        query.member_id = Some(member_id);
        self.list(query).await
    }

    /// Error for a record that moved on (or never existed) when a transition was attempted
    async fn not_in_status(&self, id: i32, expected: &str) -> AppError {
        match self.ledger.get(id).await {
            Ok(record) => AppError::BusinessRule(format!(
                "Borrow record {} is {}, not {}",
                id, record.status, expected
            )),
            Err(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fine::Fine;
    use crate::repository::borrows::MockBorrowLedger;
    use chrono::{Duration, TimeZone};
    use mockall::predicate::eq;
    use rust_decimal::Decimal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap()
    }

    fn member() -> Uuid {
        Uuid::from_u128(0x5eed)
    }

    fn record(id: i32, status: BorrowStatus, due_date: DateTime<Utc>) -> BorrowRecord {
        BorrowRecord {
            id,
            book_id: 11,
            member_id: member(),
            borrowed_at: due_date - Duration::days(14),
            due_date,
            returned_at: None,
            status,
            notes: None,
        }
    }

    fn service(ledger: MockBorrowLedger) -> BorrowsService {
        BorrowsService::new(Arc::new(ledger), BorrowingConfig::default(), FinesConfig::default())
    }

    #[tokio::test]
    async fn request_creates_pending_record_due_after_period() {
        let mut ledger = MockBorrowLedger::new();
        ledger.expect_book_exists().with(eq(11)).returning(|_| Ok(true));
        ledger
            .expect_insert_pending()
            .withf(|r| r.book_id == 11 && r.due_date == now() + Duration::days(7) && r.borrowed_at == now())
            .times(1)
            .returning(|r| {
                Ok(BorrowRecord {
                    id: 1,
                    book_id: r.book_id,
                    member_id: r.member_id,
                    borrowed_at: r.borrowed_at,
                    due_date: r.due_date,
                    returned_at: None,
                    status: BorrowStatus::Pending,
                    notes: r.notes,
                })
            });
        ledger.expect_approve().never();

        let created = service(ledger)
            .request_borrow_at(11, member(), Some(7), None, now())
            .await
            .unwrap();
        assert_eq!(created.status, BorrowStatus::Pending);
    }

    #[tokio::test]
    async fn request_uses_default_period() {
        let mut ledger = MockBorrowLedger::new();
        ledger.expect_book_exists().returning(|_| Ok(true));
        ledger
            .expect_insert_pending()
            .withf(|r| r.due_date == now() + Duration::days(BorrowingConfig::default().default_days))
            .returning(|r| Ok(record(2, BorrowStatus::Pending, r.due_date)));

        service(ledger)
            .request_borrow_at(11, member(), None, None, now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn request_rejects_out_of_range_period() {
        let mut ledger = MockBorrowLedger::new();
        ledger.expect_insert_pending().never();

        let err = service(ledger)
            .request_borrow_at(11, member(), Some(10_000), None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn request_for_unknown_book_is_not_found() {
        let mut ledger = MockBorrowLedger::new();
        ledger.expect_book_exists().returning(|_| Ok(false));
        ledger.expect_insert_pending().never();

        let err = service(ledger)
            .request_borrow_at(99, member(), Some(7), None, now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn approve_returns_borrowed_record() {
        let mut ledger = MockBorrowLedger::new();
        ledger
            .expect_approve()
            .with(eq(4))
            .times(1)
            .returning(|id| Ok(ApproveOutcome::Approved(record(id, BorrowStatus::Borrowed, now()))));

        let approved = service(ledger).approve(4).await.unwrap();
        assert_eq!(approved.status, BorrowStatus::Borrowed);
    }

    #[tokio::test]
    async fn approve_without_copies_fails() {
        let mut ledger = MockBorrowLedger::new();
        ledger
            .expect_approve()
            .returning(|_| Ok(ApproveOutcome::NoCopiesAvailable));

        let err = service(ledger).approve(4).await.unwrap_err();
        assert!(matches!(err, AppError::NoCopiesAvailable(_)));
    }

    #[tokio::test]
    async fn approve_of_already_borrowed_record_is_a_business_error() {
        let mut ledger = MockBorrowLedger::new();
        ledger.expect_approve().returning(|_| Ok(ApproveOutcome::NotPending));
        ledger
            .expect_get()
            .returning(|id| Ok(record(id, BorrowStatus::Borrowed, now())));

        let err = service(ledger).approve(4).await.unwrap_err();
        match err {
            AppError::BusinessRule(msg) => assert!(msg.contains("borrowed")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn approve_of_missing_record_is_not_found() {
        let mut ledger = MockBorrowLedger::new();
        ledger.expect_approve().returning(|_| Ok(ApproveOutcome::NotPending));
        ledger
            .expect_get()
            .returning(|id| Err(AppError::NotFound(format!("Borrow record with id {} not found", id))));

        let err = service(ledger).approve(4).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn reject_never_touches_copies() {
        let mut ledger = MockBorrowLedger::new();
        ledger
            .expect_reject()
            .times(1)
            .returning(|id| Ok(Some(record(id, BorrowStatus::Rejected, now()))));
        ledger.expect_approve().never();
        ledger.expect_complete_return().never();

        let rejected = service(ledger).reject(5).await.unwrap();
        assert_eq!(rejected.status, BorrowStatus::Rejected);
    }

    #[tokio::test]
    async fn on_time_return_records_no_fine() {
        let due = now() + Duration::days(1);
        let mut ledger = MockBorrowLedger::new();
        ledger
            .expect_get()
            .returning(move |id| Ok(record(id, BorrowStatus::Borrowed, due)));
        ledger
            .expect_complete_return()
            .withf(|_, at, fine| *at == now() && fine.is_none())
            .times(1)
            .returning(move |id, at, _| {
                let mut r = record(id, BorrowStatus::Returned, due);
                r.returned_at = Some(at);
                Ok(ReturnOutcome::Returned { record: r, fine: None })
            });

        let receipt = service(ledger).mark_returned_at(8, now()).await.unwrap();
        assert!(receipt.fine.is_none());
        assert_eq!(receipt.record.status, BorrowStatus::Returned);
        assert_eq!(receipt.record.returned_at, Some(now()));
    }

    #[tokio::test]
    async fn return_three_days_late_records_fine_of_thirty() {
        let due = now() - Duration::days(3);
        let mut ledger = MockBorrowLedger::new();
        ledger
            .expect_get()
            .returning(move |id| Ok(record(id, BorrowStatus::Borrowed, due)));
        ledger
            .expect_complete_return()
            .withf(|id, _, fine| {
                matches!(fine, Some(f) if f.amount == Decimal::from(30) && f.borrow_record_id == *id)
            })
            .times(1)
            .returning(move |id, at, fine| {
                let new = fine.unwrap();
                Ok(ReturnOutcome::Returned {
                    record: record(id, BorrowStatus::Returned, due),
                    fine: Some(Fine {
                        id: 1,
                        borrow_record_id: new.borrow_record_id,
                        member_id: new.member_id,
                        amount: new.amount,
                        paid: false,
                        paid_at: None,
                        description: new.description,
                        created_at: at,
                    }),
                })
            });

        let receipt = service(ledger).mark_returned_at(8, now()).await.unwrap();
        assert_eq!(receipt.fine.unwrap().amount, Decimal::from(30));
    }

    #[tokio::test]
    async fn stored_overdue_record_can_be_returned() {
        let due = now() - Duration::days(1);
        let mut ledger = MockBorrowLedger::new();
        ledger
            .expect_get()
            .returning(move |id| Ok(record(id, BorrowStatus::Overdue, due)));
        ledger
            .expect_complete_return()
            .times(1)
            .returning(move |id, _, _| {
                Ok(ReturnOutcome::Returned {
                    record: record(id, BorrowStatus::Returned, due),
                    fine: None,
                })
            });

        assert!(service(ledger).mark_returned_at(8, now()).await.is_ok());
    }

    #[tokio::test]
    async fn returning_a_pending_record_is_refused() {
        let mut ledger = MockBorrowLedger::new();
        ledger
            .expect_get()
            .returning(|id| Ok(record(id, BorrowStatus::Pending, now())));
        ledger.expect_complete_return().never();

        let err = service(ledger).mark_returned_at(8, now()).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn cancel_deletes_pending_record() {
        let mut ledger = MockBorrowLedger::new();
        ledger
            .expect_get()
            .returning(|id| Ok(record(id, BorrowStatus::Pending, now())));
        ledger
            .expect_cancel_pending()
            .with(eq(3), eq(Some(member())))
            .times(1)
            .returning(|_, _| Ok(true));

        assert!(service(ledger).cancel(3, Some(member())).await.unwrap());
    }

    #[tokio::test]
    async fn cancel_of_borrowed_record_is_a_no_op() {
        let mut ledger = MockBorrowLedger::new();
        ledger
            .expect_get()
            .returning(|id| Ok(record(id, BorrowStatus::Borrowed, now())));
        ledger.expect_cancel_pending().never();

        assert!(!service(ledger).cancel(3, Some(member())).await.unwrap());
    }

    #[tokio::test]
    async fn cancel_of_someone_elses_request_is_forbidden() {
        let mut ledger = MockBorrowLedger::new();
        ledger
            .expect_get()
            .returning(|id| Ok(record(id, BorrowStatus::Pending, now())));
        ledger.expect_cancel_pending().never();

        let err = service(ledger)
            .cancel(3, Some(Uuid::from_u128(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }
}
