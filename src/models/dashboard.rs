//! Landing page counters

use serde::Serialize;
use utoipa::ToSchema;

/// Catalog totals plus the caller's visit count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DashboardCounts {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    /// Visits to the landing page earlier in this session
    pub num_visits: i64,
}
