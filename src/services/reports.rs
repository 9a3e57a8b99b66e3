//! Reports and spreadsheet export
//!
//! Rankings are computed here from the raw loan rows. Groups keep the order
//! in which they first appear, so equal counts stay in fetch order.

use chrono::Utc;
use indexmap::IndexMap;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::report::{
        ActiveMember, BorrowHistoryEntry, PopularBook, ReportKind, ReportQuery, ReportSummary,
    },
    repository::{reports::LoanRow, Repository},
};

pub const DEFAULT_REPORT_LIMIT: usize = 10;

/// A rendered export
pub struct ExportFile {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
}

impl ReportsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn summary(&self) -> AppResult<ReportSummary> {
        let now = Utc::now();
        let counts = self.repository.reports.summary(now).await?;
        Ok(ReportSummary {
            books: counts.books,
            total_copies: counts.total_copies,
            available_copies: counts.available_copies,
            members: counts.members,
            pending_requests: counts.pending_requests,
            active_loans: counts.active_loans,
            overdue_loans: counts.overdue_loans,
            outstanding_fines: counts.outstanding_fines,
            generated_at: now,
        })
    }

    pub async fn popular_books(&self, query: &ReportQuery) -> AppResult<Vec<PopularBook>> {
        let rows = self.repository.reports.loan_rows(query.since).await?;
        Ok(rank_books(&rows, limit_of(query)))
    }

    pub async fn active_members(&self, query: &ReportQuery) -> AppResult<Vec<ActiveMember>> {
        let rows = self.repository.reports.loan_rows(query.since).await?;
        Ok(rank_members(&rows, limit_of(query)))
    }

    /// Render a report as CSV
    pub async fn export(&self, kind: ReportKind, query: &ReportQuery) -> AppResult<ExportFile> {
        let rows = self.repository.reports.loan_rows(query.since).await?;

        let content = match kind {
            ReportKind::PopularBooks => to_csv(rank_books(&rows, limit_of(query)))?,
            ReportKind::ActiveMembers => to_csv(rank_members(&rows, limit_of(query)))?,
            ReportKind::BorrowHistory => to_csv(rows.into_iter().map(history_entry))?,
        };

        tracing::info!("Exported {} report ({} bytes)", kind.slug(), content.len());
        Ok(ExportFile {
            filename: format!("{}-{}.csv", kind.slug(), Utc::now().format("%Y%m%d")),
            content,
        })
    }
}

fn limit_of(query: &ReportQuery) -> usize {
    query.limit.unwrap_or(DEFAULT_REPORT_LIMIT)
}

/// Books by number of loans, most borrowed first
pub fn rank_books(rows: &[LoanRow], limit: usize) -> Vec<PopularBook> {
    let mut groups: IndexMap<i32, PopularBook> = IndexMap::new();
    for row in rows.iter().filter(|r| r.status.was_lent()) {
        groups
            .entry(row.book_id)
            .or_insert_with(|| PopularBook {
                book_id: row.book_id,
                name: row.book_name.clone(),
                author: row.book_author.clone(),
                borrow_count: 0,
            })
            .borrow_count += 1;
    }

    let mut ranked: Vec<PopularBook> = groups.into_values().collect();
    // stable: ties keep first-appearance order
    ranked.sort_by(|a, b| b.borrow_count.cmp(&a.borrow_count));
    ranked.truncate(limit);
    ranked
}

/// Members by number of loans, busiest first
pub fn rank_members(rows: &[LoanRow], limit: usize) -> Vec<ActiveMember> {
    let mut groups: IndexMap<Uuid, ActiveMember> = IndexMap::new();
    for row in rows.iter().filter(|r| r.status.was_lent()) {
        groups
            .entry(row.member_id)
            .or_insert_with(|| ActiveMember {
                member_id: row.member_id,
                name: row.member_name.clone(),
                email: row.member_email.clone(),
                borrow_count: 0,
            })
            .borrow_count += 1;
    }

    let mut ranked: Vec<ActiveMember> = groups.into_values().collect();
    ranked.sort_by(|a, b| b.borrow_count.cmp(&a.borrow_count));
    ranked.truncate(limit);
    ranked
}

fn history_entry(row: LoanRow) -> BorrowHistoryEntry {
    BorrowHistoryEntry {
        record_id: row.record_id,
        book_id: row.book_id,
        book_name: row.book_name,
        member_name: row.member_name,
        member_email: row.member_email,
        status: row.status,
        borrowed_at: row.borrowed_at,
        due_date: row.due_date,
        returned_at: row.returned_at,
    }
}

/// Serialize records as CSV with a header row
pub fn to_csv<T, I>(records: I) -> AppResult<Vec<u8>>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| AppError::Internal(format!("Failed to write CSV: {}", e)))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to write CSV: {}", e)))
}
