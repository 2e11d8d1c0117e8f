//! User administration endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::user::{Permission, UpdatePermissions},
};

use super::{AuthenticatedUser, FormJson};

/// Replace a user's permissions (superuser only)
///
/// The user's existing tokens keep their old permissions until they log in again.
#[utoipa::path(
    put,
    path = "/users/{id}/permissions",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdatePermissions,
    responses(
        (status = 200, description = "Permissions now held", body = Vec<Permission>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Superuser privileges required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_permissions(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    FormJson(data): FormJson<UpdatePermissions>,
) -> AppResult<Json<Vec<Permission>>> {
    let permissions = state
        .services
        .users
        .set_permissions(&claims, id, data.permissions)
        .await?;
    Ok(Json(permissions))
}
