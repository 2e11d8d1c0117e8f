//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, books, catalog, genres, health, instances, loans, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "1.0.0",
        description = "Library catalog REST API: books, authors, copies and loans",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Catalog
        catalog::index,
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        genres::list_genres,
        genres::create_genre,
        genres::delete_genre,
        // Instances
        instances::get_instance,
        instances::create_instance,
        instances::update_instance,
        instances::mark_returned,
        instances::renewal_form,
        instances::renew,
        // Loans
        loans::my_books,
        loans::all_borrowed,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Users
        users::set_permissions,
    ),
    components(
        schemas(
            // Catalog
            crate::models::dashboard::DashboardCounts,
            crate::models::genre::Genre,
            crate::models::genre::CreateGenre,
            crate::models::author::Author,
            crate::models::author::AuthorDetails,
            crate::models::author::AuthorForm,
            crate::models::book::AuthorShort,
            crate::models::book::Book,
            crate::models::book::BookDetails,
            crate::models::book::BookShort,
            crate::models::book::BookForm,
            crate::models::page::AuthorPage,
            crate::models::page::BookPage,
            crate::models::page::InstancePage,
            // Instances
            crate::models::instance::LoanStatus,
            crate::models::instance::BookInstance,
            crate::models::instance::BookInstanceDetails,
            crate::models::instance::CreateInstance,
            crate::models::instance::UpdateInstance,
            crate::models::instance::RenewalForm,
            crate::models::instance::RenewalProposal,
            // Auth and users
            crate::models::user::Permission,
            crate::models::user::RegisterUser,
            crate::models::user::UpdatePermissions,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            auth::MeResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Landing page counters"),
        (name = "books", description = "Book management"),
        (name = "authors", description = "Author management"),
        (name = "genres", description = "Genre management"),
        (name = "instances", description = "Book copies and renewals"),
        (name = "loans", description = "Loan listings"),
        (name = "auth", description = "Registration and authentication"),
        (name = "users", description = "User administration")
    )
)]
pub struct ApiDoc;

/// Declares the `bearer_auth` scheme referenced by secured paths
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

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
