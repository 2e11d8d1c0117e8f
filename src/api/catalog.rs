//! Landing page endpoint

use axum::{extract::State, Json};
use tower_sessions::Session;

use crate::{error::AppResult, models::dashboard::DashboardCounts};

/// Catalog totals and the caller's visit count
///
/// Each call counts as one visit; the response carries the count before it.
#[utoipa::path(
    get,
    path = "/",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog counters", body = DashboardCounts)
    )
)]
pub async fn index(
    State(state): State<crate::AppState>,
    session: Session,
) -> AppResult<Json<DashboardCounts>> {
    let counts = state.services.catalog.dashboard(&session).await?;
    Ok(Json(counts))
}
