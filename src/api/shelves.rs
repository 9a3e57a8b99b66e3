//! Shelf endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::shelf::{BookShelf, CreateShelf, ShelfUsage, UpdateShelf},
};

use super::AuthenticatedUser;

/// List shelves with their usage
#[utoipa::path(
    get,
    path = "/shelves",
    tag = "shelves",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Shelves", body = Vec<ShelfUsage>)
    )
)]
pub async fn list_shelves(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<ShelfUsage>>> {
    let shelves = state.services.shelves.list().await?;
    Ok(Json(shelves))
}

#[utoipa::path(
    get,
    path = "/shelves/{id}",
    tag = "shelves",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Shelf ID")
    ),
    responses(
        (status = 200, description = "Shelf with usage", body = ShelfUsage),
        (status = 404, description = "Shelf not found")
    )
)]
pub async fn get_shelf(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ShelfUsage>> {
    let shelf = state.services.shelves.get(id).await?;
    Ok(Json(shelf))
}

#[utoipa::path(
    post,
    path = "/shelves",
    tag = "shelves",
    security(("bearer_auth" = [])),
    request_body = CreateShelf,
    responses(
        (status = 201, description = "Shelf created", body = BookShelf),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn create_shelf(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(shelf): Json<CreateShelf>,
) -> AppResult<(StatusCode, Json<BookShelf>)> {
    claims.require_admin()?;
    shelf.validate()?;

    let created = state.services.shelves.create(&shelf).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/shelves/{id}",
    tag = "shelves",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Shelf ID")
    ),
    request_body = UpdateShelf,
    responses(
        (status = 200, description = "Shelf updated", body = BookShelf),
        (status = 404, description = "Shelf not found")
    )
)]
pub async fn update_shelf(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(shelf): Json<UpdateShelf>,
) -> AppResult<Json<BookShelf>> {
    claims.require_admin()?;
    shelf.validate()?;

    let updated = state.services.shelves.update(id, &shelf).await?;
    Ok(Json(updated))
}

/// Delete a shelf; its books become unshelved
#[utoipa::path(
    delete,
    path = "/shelves/{id}",
    tag = "shelves",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Shelf ID")
    ),
    responses(
        (status = 204, description = "Shelf deleted"),
        (status = 404, description = "Shelf not found")
    )
)]
pub async fn delete_shelf(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.shelves.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
