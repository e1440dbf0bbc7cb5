use axum::Json;
use axum::extract::State;
use sea_orm::*;
use tracing::instrument;

use super::event::timeline_counts;
use crate::authz::{self, Action};
use crate::entity::event;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::dashboard::DashboardStats;
use crate::state::AppState;

const RECENT_EVENTS: u64 = 5;

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Dashboard",
    operation_id = "getDashboardStats",
    summary = "Event dashboard",
    description = "Admin only. Event counts by timeline position and activity, plus the five most recently updated events.",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Not an admin (FORBIDDEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    authz::require_admin(auth_user.identity(), Action::View, "dashboard")?;

    let (upcoming, ongoing, past) = timeline_counts(&state.db).await?;
    let total = event::Entity::find().count(&state.db).await?;
    let inactive = event::Entity::find()
        .filter(event::Column::IsActive.eq(false))
        .count(&state.db)
        .await?;
    let recent = event::Entity::find()
        .order_by_desc(event::Column::UpdatedAt)
        .order_by_desc(event::Column::Id)
        .limit(RECENT_EVENTS)
        .all(&state.db)
        .await?;

    Ok(Json(DashboardStats {
        total_events: total,
        past_events: past,
        ongoing_events: ongoing,
        upcoming_events: upcoming,
        inactive_events: inactive,
        recent_events: recent.into_iter().map(Into::into).collect(),
    }))
}
