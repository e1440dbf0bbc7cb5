//! Owner-or-admin authorization.
//!
//! The policy itself only compares an identity against an owner id. Callers
//! resolve the owner first: from the resource itself (event organizer, news
//! and opportunity author, registrant, notification recipient) or, for
//! resources without an owner column (guests, calendar entries), from the
//! parent event. Existence is checked before this runs, so a missing resource
//! is reported as 404 rather than 403.

use common::Role;

use crate::entity::{event, news, notification, opportunity, registration};
use crate::error::AppError;

/// The acting user as established by the authentication guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity {
    pub id: i32,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    View,
    Edit,
    Delete,
    /// Change the review status of an application.
    Review,
}

impl Action {
    fn verb(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Review => "update the status of",
        }
    }
}

/// `true` iff the identity is an admin or the owner.
pub fn allows(identity: Identity, owner_id: i32) -> bool {
    identity.is_admin() || identity.id == owner_id
}

/// Owner-or-admin check with a readable reason on denial.
pub fn authorize(
    identity: Identity,
    owner_id: i32,
    action: Action,
    resource: &str,
) -> Result<(), AppError> {
    if allows(identity, owner_id) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = identity.id,
            owner_id,
            ?action,
            resource,
            "Authorization denied"
        );
        Err(forbidden(action, resource))
    }
}

pub fn require_admin(identity: Identity, action: Action, resource: &str) -> Result<(), AppError> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(forbidden(action, resource))
    }
}

/// Organizers and admins may publish events.
pub fn require_organizer(identity: Identity) -> Result<(), AppError> {
    match identity.role {
        Role::Admin | Role::Organizer => Ok(()),
        Role::Attendee => Err(AppError::Forbidden(
            "Only organizers can create events".into(),
        )),
    }
}

/// Applications may be viewed or withdrawn by the applicant's own user as
/// well; only the opportunity author or an admin may review them.
/// Anonymous applications have no user and fall back to author-or-admin.
pub fn authorize_application(
    identity: Identity,
    applicant_user_id: Option<i32>,
    opportunity_author_id: i32,
    action: Action,
) -> Result<(), AppError> {
    let self_service = matches!(action, Action::View | Action::Delete)
        && applicant_user_id == Some(identity.id);
    if self_service {
        return Ok(());
    }
    authorize(identity, opportunity_author_id, action, "application")
}

fn forbidden(action: Action, resource: &str) -> AppError {
    AppError::Forbidden(format!("Not authorized to {} this {resource}", action.verb()))
}

/// A resource carrying its own owner column.
pub trait Owned {
    const RESOURCE: &'static str;

    fn owner_id(&self) -> i32;

    fn authorize(&self, identity: Identity, action: Action) -> Result<(), AppError> {
        authorize(identity, self.owner_id(), action, Self::RESOURCE)
    }
}

impl Owned for event::Model {
    const RESOURCE: &'static str = "event";

    fn owner_id(&self) -> i32 {
        self.organizer_id
    }
}

impl Owned for news::Model {
    const RESOURCE: &'static str = "news";

    fn owner_id(&self) -> i32 {
        self.author_id
    }
}

impl Owned for opportunity::Model {
    const RESOURCE: &'static str = "opportunity";

    fn owner_id(&self) -> i32 {
        self.author_id
    }
}

impl Owned for registration::Model {
    const RESOURCE: &'static str = "registration";

    fn owner_id(&self) -> i32 {
        self.user_id
    }
}

impl Owned for notification::Model {
    const RESOURCE: &'static str = "notification";

    fn owner_id(&self) -> i32 {
        self.user_id
    }
}
