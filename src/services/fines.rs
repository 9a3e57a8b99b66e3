//! Fine accounting

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::fine::{Fine, FineBalance, FineDetails, FineQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct FinesService {
    repository: Repository,
}

impl FinesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &FineQuery) -> AppResult<(Vec<FineDetails>, i64)> {
        self.repository.fines.list(query).await
    }

    /// Fines of one member, whatever filter the caller passed for member
    pub async fn list_for_member(&self, member_id: Uuid, mut query: FineQuery) -> AppResult<(Vec<FineDetails>, i64)> {
        query.member_id = Some(member_id);
        self.repository.fines.list(&query).await
    }

    pub async fn balance(&self, member_id: Uuid) -> AppResult<FineBalance> {
        self.repository.fines.balance(member_id).await
    }

    /// Settle a fine. Paying twice is refused.
    pub async fn mark_paid(&self, id: i32) -> AppResult<Fine> {
        match self.repository.fines.mark_paid(id, Utc::now()).await? {
            Some(fine) => {
                tracing::info!("Fine {} of {} paid by member {}", fine.id, fine.amount, fine.member_id);
                Ok(fine)
            }
            None => {
                // missing fine surfaces as NotFound here
                let fine = self.repository.fines.get_by_id(id).await?;
                Err(AppError::BusinessRule(format!(
                    "Fine {} was already paid{}",
                    id,
                    fine.paid_at
                        .map(|at| format!(" on {}", at.format("%Y-%m-%d")))
                        .unwrap_or_default()
                )))
            }
        }
    }
}
