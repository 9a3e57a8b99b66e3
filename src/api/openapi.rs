//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{assistant, auth, books, borrows, fines, health, members, reports, shelves};

/// Registers the `bearer_auth` scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lectern API",
        version = "1.0.0",
        description = "Library management REST API: catalog, borrow requests, fines, shelves, members and reports"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        auth::update_my_profile,
        // Books
        books::list_books,
        books::list_categories,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Shelves
        shelves::list_shelves,
        shelves::get_shelf,
        shelves::create_shelf,
        shelves::update_shelf,
        shelves::delete_shelf,
        // Borrows
        borrows::create_borrow,
        borrows::list_borrows,
        borrows::my_borrows,
        borrows::approve_borrow,
        borrows::reject_borrow,
        borrows::return_borrow,
        borrows::cancel_borrow,
        // Fines
        fines::list_fines,
        fines::my_fines,
        fines::pay_fine,
        // Members
        members::list_members,
        members::get_member,
        members::update_role,
        members::delete_member,
        // Reports
        reports::summary,
        reports::popular_books,
        reports::active_members,
        reports::export_report,
        // Assistant
        assistant::chat,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::RegisterUser,
            crate::models::user::UpdateProfile,
            crate::models::user::UpdateRole,
            crate::models::enums::Role,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Shelves
            crate::models::shelf::BookShelf,
            crate::models::shelf::ShelfUsage,
            crate::models::shelf::CreateShelf,
            crate::models::shelf::UpdateShelf,
            // Borrows
            crate::models::enums::BorrowStatus,
            crate::models::borrow::BorrowRecord,
            crate::models::borrow::BorrowRecordDetails,
            crate::models::borrow::CreateBorrowRequest,
            crate::models::borrow::ReturnReceipt,
            borrows::CancelResponse,
            // Fines
            crate::models::fine::Fine,
            crate::models::fine::FineDetails,
            crate::models::fine::FineBalance,
            fines::MemberFinesResponse,
            // Reports
            crate::models::report::ReportSummary,
            crate::models::report::PopularBook,
            crate::models::report::ActiveMember,
            // Assistant
            crate::models::assistant::ChatRole,
            crate::models::assistant::ChatMessage,
            crate::models::assistant::ChatRequest,
            crate::models::assistant::ChatReply,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and authentication"),
        (name = "books", description = "Catalog management"),
        (name = "shelves", description = "Shelf management"),
        (name = "borrows", description = "Borrow requests and returns"),
        (name = "fines", description = "Overdue fines"),
        (name = "members", description = "Member administration"),
        (name = "reports", description = "Reports and exports"),
        (name = "assistant", description = "Reading assistant")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in [
            "/books",
            "/admin/books",
            "/borrows/{id}/approve",
            "/fines/{id}/pay",
            "/reports/{report}/export",
            "/assistant/chat",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
