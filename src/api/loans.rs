//! Loan listing endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        instance::BookInstanceDetails,
        page::{Page, PageQuery},
    },
};

use super::{today, AuthenticatedUser};

/// Copies borrowed by the current user, soonest due first
#[utoipa::path(
    get,
    path = "/mybooks",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Caller's loans", body = crate::models::page::InstancePage),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<BookInstanceDetails>>> {
    let page = state
        .services
        .loans
        .my_loans(&claims, query.page, today())
        .await?;
    Ok(Json(page))
}

/// Every copy on loan, soonest due first
#[utoipa::path(
    get,
    path = "/borrowed",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "All loans", body = crate::models::page::InstancePage),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Requires can_mark_returned")
    )
)]
pub async fn all_borrowed(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<BookInstanceDetails>>> {
    let page = state
        .services
        .loans
        .all_borrowed(&claims, query.page, today())
        .await?;
    Ok(Json(page))
}
