//! Report endpoints (admin)

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::report::{ActiveMember, PopularBook, ReportKind, ReportQuery, ReportSummary},
};

use super::AuthenticatedUser;

/// Library-wide counters
#[utoipa::path(
    get,
    path = "/reports/summary",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Summary", body = ReportSummary),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn summary(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ReportSummary>> {
    claims.require_admin()?;

    let summary = state.services.reports.summary().await?;
    Ok(Json(summary))
}

/// Most borrowed books
#[utoipa::path(
    get,
    path = "/reports/popular-books",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(ReportQuery),
    responses(
        (status = 200, description = "Books by loan count", body = Vec<PopularBook>)
    )
)]
pub async fn popular_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Vec<PopularBook>>> {
    claims.require_admin()?;

    let books = state.services.reports.popular_books(&query).await?;
    Ok(Json(books))
}

/// Members with the most loans
#[utoipa::path(
    get,
    path = "/reports/active-members",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(ReportQuery),
    responses(
        (status = 200, description = "Members by loan count", body = Vec<ActiveMember>)
    )
)]
pub async fn active_members(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Vec<ActiveMember>>> {
    claims.require_admin()?;

    let members = state.services.reports.active_members(&query).await?;
    Ok(Json(members))
}

/// Download a report as CSV
#[utoipa::path(
    get,
    path = "/reports/{report}/export",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(
        ("report" = String, Path, description = "popular-books, active-members or borrow-history"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "CSV file", body = String, content_type = "text/csv"),
        (status = 404, description = "Unknown report")
    )
)]
pub async fn export_report(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(report): Path<String>,
    Query(query): Query<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    claims.require_admin()?;

    let kind: ReportKind = report.parse().map_err(AppError::NotFound)?;
    let file = state.services.reports.export(kind, &query).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        file.content,
    ))
}
