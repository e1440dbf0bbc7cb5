use serde::Serialize;

use super::event::EventResponse;

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_events: u64,
    /// Ended before now.
    pub past_events: u64,
    pub ongoing_events: u64,
    pub upcoming_events: u64,
    /// Events with `isActive = false`.
    pub inactive_events: u64,
    /// Five most recently updated events.
    pub recent_events: Vec<EventResponse>,
}
