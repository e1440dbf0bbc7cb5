//! Atomic removal of an event together with everything that hangs off it.
//!
//! Order: calendar entries, guests, payments of the event's registrations,
//! registrations, the event. All of it runs in one transaction; any failure
//! rolls the whole unit back when the transaction is dropped uncommitted.

use sea_orm::sea_query::{LockType, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::authz::{Action, Identity, Owned};
use crate::entity::{calendar, event, guest, payment, registration};
use crate::error::AppError;

/// Row counts removed by a successful cascade.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CascadeReport {
    pub calendars: u64,
    pub guests: u64,
    pub payments: u64,
    pub registrations: u64,
}

/// Deletes event `event_id` on behalf of `identity`.
///
/// Missing event is `NotFound`, a non-owner non-admin is `Forbidden`; both
/// are detected before anything is written. Failures after that point are
/// reported as `Internal` with the database untouched.
#[instrument(skip(db, identity), fields(user_id = identity.id))]
pub async fn delete_event(
    db: &DatabaseConnection,
    identity: Identity,
    event_id: i32,
) -> Result<CascadeReport, AppError> {
    let txn = db.begin().await?;

    let event = event::Entity::find_by_id(event_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))?;
    event.authorize(identity, Action::Delete)?;

    let report = remove_dependents(&txn, event_id).await.map_err(|e| {
        tracing::error!(event_id, error = %e, "Event cascade failed, rolling back");
        AppError::Internal(format!("Failed to delete event {event_id}: {e}"))
    })?;

    txn.commit().await?;

    tracing::info!(
        event_id,
        calendars = report.calendars,
        guests = report.guests,
        payments = report.payments,
        registrations = report.registrations,
        "Event deleted"
    );
    Ok(report)
}

async fn remove_dependents(
    txn: &DatabaseTransaction,
    event_id: i32,
) -> Result<CascadeReport, DbErr> {
    let calendars = calendar::Entity::delete_many()
        .filter(calendar::Column::EventId.eq(event_id))
        .exec(txn)
        .await?
        .rows_affected;
    let guests = guest::Entity::delete_many()
        .filter(guest::Column::EventId.eq(event_id))
        .exec(txn)
        .await?
        .rows_affected;
    let payments = payment::Entity::delete_many()
        .filter(
            payment::Column::RegistrationId.in_subquery(
                SeaQuery::select()
                    .column(registration::Column::Id)
                    .from(registration::Entity)
                    .and_where(registration::Column::EventId.eq(event_id))
                    .to_owned(),
            ),
        )
        .exec(txn)
        .await?
        .rows_affected;
    let registrations = registration::Entity::delete_many()
        .filter(registration::Column::EventId.eq(event_id))
        .exec(txn)
        .await?
        .rows_affected;

    let deleted = event::Entity::delete_by_id(event_id)
        .exec(txn)
        .await?
        .rows_affected;
    if deleted != 1 {
        return Err(DbErr::RecordNotFound(format!("event {event_id}")));
    }

    Ok(CascadeReport {
        calendars,
        guests,
        payments,
        registrations,
    })
}
