//! Book instance (copy) endpoints, including loan renewal

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::instance::{
        BookInstance, BookInstanceDetails, CreateInstance, RenewalForm, RenewalProposal,
        UpdateInstance,
    },
};

use super::{today, AuthenticatedUser, FormJson};

/// Get one copy with its book and borrower
#[utoipa::path(
    get,
    path = "/bookinstances/{id}",
    tag = "instances",
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Book instance", body = BookInstanceDetails),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn get_instance(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstanceDetails>> {
    let instance = state.services.loans.get_instance(id, today()).await?;
    Ok(Json(instance))
}

/// Register a new physical copy
#[utoipa::path(
    post,
    path = "/bookinstances",
    tag = "instances",
    security(("bearer_auth" = [])),
    request_body = CreateInstance,
    responses(
        (status = 201, description = "Book instance created", body = BookInstance),
        (status = 400, description = "Invalid fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Requires can_mark_returned")
    )
)]
pub async fn create_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    FormJson(data): FormJson<CreateInstance>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    let instance = state.services.loans.create_instance(&claims, data).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

/// Lend, return or send a copy to maintenance
#[utoipa::path(
    put,
    path = "/bookinstances/{id}",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = UpdateInstance,
    responses(
        (status = 200, description = "Book instance updated", body = BookInstance),
        (status = 400, description = "Invalid fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Requires can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn update_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    FormJson(data): FormJson<UpdateInstance>,
) -> AppResult<Json<BookInstance>> {
    let instance = state.services.loans.update_instance(&claims, id, data).await?;
    Ok(Json(instance))
}

/// Mark a copy as returned
#[utoipa::path(
    post,
    path = "/bookinstances/{id}/return",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Book instance returned", body = BookInstance),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Requires can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn mark_returned(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstance>> {
    let instance = state.services.loans.mark_returned(&claims, id).await?;
    Ok(Json(instance))
}

/// Renewal form with the proposed due date
#[utoipa::path(
    get,
    path = "/book/{id}/renew",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Renewal proposal", body = RenewalProposal),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Requires can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renewal_form(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalProposal>> {
    let proposal = state.services.loans.renewal_form(&claims, id, today()).await?;
    Ok(Json(proposal))
}

/// Submit a new due date
#[utoipa::path(
    post,
    path = "/book/{id}/renew",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = RenewalForm,
    responses(
        (status = 200, description = "Loan renewed", body = BookInstanceDetails),
        (status = 400, description = "Date missing, in the past or too far ahead", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Requires can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    FormJson(form): FormJson<RenewalForm>,
) -> AppResult<Json<BookInstanceDetails>> {
    let instance = state.services.loans.renew(&claims, id, form, today()).await?;
    Ok(Json(instance))
}
