//! Fine endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::fine::{Fine, FineBalance, FineDetails, FineQuery},
};

use super::{AuthenticatedUser, PaginatedResponse};

/// A member's fines with their outstanding balance
#[derive(Serialize, ToSchema)]
pub struct MemberFinesResponse {
    pub balance: FineBalance,
    pub items: Vec<FineDetails>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// List fines (admin only)
#[utoipa::path(
    get,
    path = "/fines",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(FineQuery),
    responses(
        (status = 200, description = "Fines", body = PaginatedResponse<FineDetails>),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_fines(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<FineQuery>,
) -> AppResult<Json<PaginatedResponse<FineDetails>>> {
    claims.require_admin()?;

    let (fines, total) = state.services.fines.list(&query).await?;
    Ok(Json(PaginatedResponse::new(fines, total, query.page, query.per_page)))
}

/// Fines of the current member
#[utoipa::path(
    get,
    path = "/fines/mine",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(FineQuery),
    responses(
        (status = 200, description = "Own fines and balance", body = MemberFinesResponse)
    )
)]
pub async fn my_fines(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<FineQuery>,
) -> AppResult<Json<MemberFinesResponse>> {
    claims.require_member()?;

    let (page, per_page) = (query.page, query.per_page);
    let (fines, total) = state
        .services
        .fines
        .list_for_member(claims.user_id, query)
        .await?;
    let balance = state.services.fines.balance(claims.user_id).await?;

    let paged = PaginatedResponse::new(fines, total, page, per_page);

    Ok(Json(MemberFinesResponse {
        balance,
        items: paged.items,
        total: paged.total,
        page: paged.page,
        per_page: paged.per_page,
    }))
}

/// Record payment of a fine (admin only)
#[utoipa::path(
    post,
    path = "/fines/{id}/pay",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Fine ID")
    ),
    responses(
        (status = 200, description = "Fine paid", body = Fine),
        (status = 404, description = "Fine not found"),
        (status = 422, description = "Fine already paid")
    )
)]
pub async fn pay_fine(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Fine>> {
    claims.require_admin()?;

    let fine = state.services.fines.mark_paid(id).await?;
    Ok(Json(fine))
}
