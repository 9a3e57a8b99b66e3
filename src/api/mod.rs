//! API handlers for Lectern REST endpoints

pub mod assistant;
pub mod auth;
pub mod books;
pub mod borrows;
pub mod fines;
pub mod health;
pub mod members;
pub mod openapi;
pub mod reports;
pub mod shelves;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{delete, get, post, put},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::{Deserialize, Serialize};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{error::AppError, models::user::UserClaims, repository::page_bounds, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AppError::Authentication("Missing or invalid authorization header".to_string())
                })?;

        let claims = UserClaims::from_token(bearer.token(), &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Items of the requested page
    pub items: Vec<T>,
    /// Total number of matching items
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Echo the effective paging the repository applied
    pub fn new(items: Vec<T>, total: i64, page: Option<i64>, per_page: Option<i64>) -> Self {
        let (limit, _) = page_bounds(page, per_page);
        Self {
            items,
            total,
            page: page.unwrap_or(1).max(1),
            per_page: limit,
        }
    }
}

/// `?force=true` on deletes
#[derive(Debug, Default, Deserialize)]
pub struct ForceParams {
    pub force: Option<bool>,
}

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/profile", put(auth::update_my_profile))
        // Catalog
        .route("/books", get(books::list_books))
        .route("/books/categories", get(books::list_categories))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        .route("/admin/books", post(books::create_book))
        // Shelves
        .route("/shelves", get(shelves::list_shelves).post(shelves::create_shelf))
        .route(
            "/shelves/:id",
            get(shelves::get_shelf)
                .put(shelves::update_shelf)
                .delete(shelves::delete_shelf),
        )
        // Borrows
        .route("/borrows", get(borrows::list_borrows).post(borrows::create_borrow))
        .route("/borrows/mine", get(borrows::my_borrows))
        .route("/borrows/:id", delete(borrows::cancel_borrow))
        .route("/borrows/:id/approve", post(borrows::approve_borrow))
        .route("/borrows/:id/reject", post(borrows::reject_borrow))
        .route("/borrows/:id/return", post(borrows::return_borrow))
        // Fines
        .route("/fines", get(fines::list_fines))
        .route("/fines/mine", get(fines::my_fines))
        .route("/fines/:id/pay", post(fines::pay_fine))
        // Members
        .route("/members", get(members::list_members))
        .route(
            "/members/:id",
            get(members::get_member).delete(members::delete_member),
        )
        .route("/members/:id/role", put(members::update_role))
        // Reports
        .route("/reports/summary", get(reports::summary))
        .route("/reports/popular-books", get(reports::popular_books))
        .route("/reports/active-members", get(reports::active_members))
        .route("/reports/:report/export", get(reports::export_report))
        // Assistant
        .merge(assistant_routes(&state))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Assistant chat, rate limited per client IP. Needs the server to provide
/// `ConnectInfo<SocketAddr>`.
fn assistant_routes(state: &AppState) -> Router<AppState> {
    let limits = &state.config.assistant;
    let route = Router::new().route("/assistant/chat", post(assistant::chat));

    match GovernorConfigBuilder::default()
        .per_millisecond(limits.replenish_interval_ms())
        .burst_size(limits.burst_size)
        .finish()
    {
        Some(config) => route.layer(GovernorLayer {
            config: Box::leak(Box::new(config)),
        }),
        None => {
            tracing::warn!(
                "Invalid assistant rate limit ({} rps, burst {}), limiting disabled",
                limits.requests_per_second,
                limits.burst_size
            );
            route
        }
    }
}
