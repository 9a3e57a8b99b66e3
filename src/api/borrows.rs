//! Borrow request endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::borrow::{BorrowQuery, BorrowRecord, BorrowRecordDetails, CreateBorrowRequest, ReturnReceipt},
};

use super::{AuthenticatedUser, PaginatedResponse};

/// Result of a cancel request
#[derive(Serialize, ToSchema)]
pub struct CancelResponse {
    /// False when the record had already left `pending` and was kept
    pub cancelled: bool,
}

/// Request to borrow a book
#[utoipa::path(
    post,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowRequest,
    responses(
        (status = 201, description = "Pending borrow record created", body = BorrowRecord),
        (status = 400, description = "Invalid loan period"),
        (status = 403, description = "Member account required"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowRecord>)> {
    claims.require_member()?;
    request.validate()?;

    // admins may file on behalf of a member
    let member_id = request.member_id.unwrap_or(claims.user_id);
    claims.require_self_or_admin(member_id)?;
    if member_id != claims.user_id {
        state.services.users.get_by_id(member_id).await?;
    }

    let record = state
        .services
        .borrows
        .request_borrow(request.book_id, member_id, request.days, request.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// List all borrow records (admin only)
#[utoipa::path(
    get,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(BorrowQuery),
    responses(
        (status = 200, description = "Borrow records", body = PaginatedResponse<BorrowRecordDetails>),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BorrowQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowRecordDetails>>> {
    claims.require_admin()?;

    let (page, per_page) = (query.page, query.per_page);
    let (records, total) = state.services.borrows.list(query).await?;
    Ok(Json(PaginatedResponse::new(records, total, page, per_page)))
}

/// Borrow records of the current member
#[utoipa::path(
    get,
    path = "/borrows/mine",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(BorrowQuery),
    responses(
        (status = 200, description = "Own borrow records", body = PaginatedResponse<BorrowRecordDetails>)
    )
)]
pub async fn my_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BorrowQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowRecordDetails>>> {
    claims.require_member()?;

    let (page, per_page) = (query.page, query.per_page);
    let (records, total) = state
        .services
        .borrows
        .list_for_member(claims.user_id, query)
        .await?;
    Ok(Json(PaginatedResponse::new(records, total, page, per_page)))
}

/// Approve a pending request and lend a copy (admin only)
#[utoipa::path(
    post,
    path = "/borrows/{id}/approve",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow record ID")
    ),
    responses(
        (status = 200, description = "Request approved", body = BorrowRecord),
        (status = 404, description = "Borrow record not found"),
        (status = 409, description = "No copies available"),
        (status = 422, description = "Record is not pending")
    )
)]
pub async fn approve_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowRecord>> {
    claims.require_admin()?;

    let record = state.services.borrows.approve(id).await?;
    Ok(Json(record))
}

/// Reject a pending request (admin only)
#[utoipa::path(
    post,
    path = "/borrows/{id}/reject",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow record ID")
    ),
    responses(
        (status = 200, description = "Request rejected", body = BorrowRecord),
        (status = 404, description = "Borrow record not found"),
        (status = 422, description = "Record is not pending")
    )
)]
pub async fn reject_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowRecord>> {
    claims.require_admin()?;

    let record = state.services.borrows.reject(id).await?;
    Ok(Json(record))
}

/// Take a lent copy back, assessing a fine when late (admin only)
#[utoipa::path(
    post,
    path = "/borrows/{id}/return",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow record ID")
    ),
    responses(
        (status = 200, description = "Copy returned", body = ReturnReceipt),
        (status = 404, description = "Borrow record not found"),
        (status = 422, description = "Record is not on loan")
    )
)]
pub async fn return_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ReturnReceipt>> {
    claims.require_admin()?;

    let receipt = state.services.borrows.mark_returned(id).await?;
    Ok(Json(receipt))
}

/// Withdraw a pending request. Members may only withdraw their own.
#[utoipa::path(
    delete,
    path = "/borrows/{id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow record ID")
    ),
    responses(
        (status = 200, description = "Cancel outcome", body = CancelResponse),
        (status = 403, description = "Not the owner of the record"),
        (status = 404, description = "Borrow record not found")
    )
)]
pub async fn cancel_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<CancelResponse>> {
    let owner = if claims.is_admin() {
        None
    } else {
        Some(claims.user_id)
    };

    let cancelled = state.services.borrows.cancel(id, owner).await?;
    Ok(Json(CancelResponse { cancelled }))
}
