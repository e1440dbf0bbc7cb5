use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::ApplicantStatus;
use common::storage::UploadCategory;
use sea_orm::*;
use tracing::instrument;

use super::opportunity::find_opportunity;
use super::{discard_on_error, fetch_page, found, store_upload};
use crate::authz::{self, Action, Owned};
use crate::entity::applicant;
use crate::error::{AppError, ErrorBody, unique_conflict};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::extractors::upload::UploadForm;
use crate::models::applicant::*;
use crate::models::shared::{MessageResponse, PageParams, normalize_email};
use crate::state::AppState;

pub const RESUME_FIELD: &str = "resume";
const ALREADY_APPLIED: &str = "You have already applied for this opportunity";

#[utoipa::path(
    post,
    path = "/{id}/apply",
    tag = "Applicants",
    operation_id = "applyToOpportunity",
    summary = "Apply to an opportunity",
    description = "Open to anonymous callers. When a bearer token is sent the application is linked to that user, who may apply only once per opportunity. The opportunity must be `open`. Accepts JSON, or multipart with a `payload` part and an optional `resume` (PDF, DOC or DOCX).",
    params(("id" = i32, Path, description = "Opportunity ID")),
    request_body(content = ApplyRequest, description = "Application fields (JSON body or `payload` part)"),
    responses(
        (status = 201, description = "Application submitted", body = ApplicantResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR) or opportunity closed / duplicate application (BUSINESS_RULE)", body = ErrorBody),
        (status = 401, description = "Bearer token present but invalid (UNAUTHENTICATED)", body = ErrorBody),
        (status = 404, description = "Opportunity not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user, form))]
pub async fn apply(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut form: UploadForm<ApplyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let resume = form.take(RESUME_FIELD);
    form.ensure_consumed()?;

    let opportunity = find_opportunity(&state.db, id).await?;
    validate_apply(&form.payload)?;

    if !opportunity.status.accepts_applications() {
        return Err(AppError::BusinessRule(
            "This opportunity is not open for applications".into(),
        ));
    }

    let user_id = auth_user.as_ref().map(|u| u.user_id);
    if let Some(user_id) = user_id {
        let already = applicant::Entity::find()
            .filter(applicant::Column::OpportunityId.eq(opportunity.id))
            .filter(applicant::Column::UserId.eq(user_id))
            .count(&state.db)
            .await?;
        if already > 0 {
            return Err(AppError::BusinessRule(ALREADY_APPLIED.into()));
        }
    }

    let resume = store_upload(&state, resume, UploadCategory::Resumes).await?;
    let payload = form.payload;
    let now = Utc::now();

    let application = applicant::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        email: Set(normalize_email(&payload.email)),
        phone: Set(payload.phone),
        cover_letter: Set(payload.cover_letter),
        resume: Set(resume.clone()),
        status: Set(ApplicantStatus::Pending),
        opportunity_id: Set(opportunity.id),
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    // The count above is only a fast path; the unique key settles races.
    let model = discard_on_error(&state, resume.as_slice(), async {
        application
            .insert(&state.db)
            .await
            .map_err(|e| unique_conflict(e, ALREADY_APPLIED))
    })
    .await?;

    tracing::info!(
        applicant_id = model.id,
        anonymous = user_id.is_none(),
        "Application submitted"
    );
    Ok((StatusCode::CREATED, Json(ApplicantResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}/applicants",
    tag = "Applicants",
    operation_id = "listApplicants",
    summary = "List applications to an opportunity",
    description = "Author of the opportunity or admin only. Newest first, optionally filtered by `status`.",
    params(("id" = i32, Path, description = "Opportunity ID"), ApplicantListQuery),
    responses(
        (status = 200, description = "Applications", body = ApplicantListResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Opportunity not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_applicants(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(query): AppQuery<ApplicantListQuery>,
) -> Result<Json<ApplicantListResponse>, AppError> {
    let opportunity = find_opportunity(&state.db, id).await?;
    opportunity.authorize(auth_user.identity(), Action::View)?;

    let page = PageParams::resolve(query.page, query.limit);
    let mut select = applicant::Entity::find().filter(applicant::Column::OpportunityId.eq(id));
    if let Some(status) = query.status {
        select = select.filter(applicant::Column::Status.eq(status));
    }
    let select = select
        .order_by_desc(applicant::Column::CreatedAt)
        .order_by_desc(applicant::Column::Id);

    let (applicants, pagination) = fetch_page(&state.db, select, page).await?;
    Ok(Json(ApplicantListResponse {
        applicants: applicants.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Applicants",
    operation_id = "getApplicant",
    summary = "Get an application",
    description = "Visible to the opportunity's author, admins, and the applicant's own user.",
    params(("id" = i32, Path, description = "Applicant ID")),
    responses(
        (status = 200, description = "Application", body = ApplicantResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Applicant not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_applicant(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApplicantResponse>, AppError> {
    let model = find_applicant(&state.db, id).await?;
    authorize_applicant(&state.db, &auth_user, &model, Action::View).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}/status",
    tag = "Applicants",
    operation_id = "updateApplicantStatus",
    summary = "Review an application",
    description = "Sets the review status. Author of the opportunity or admin only.",
    params(("id" = i32, Path, description = "Applicant ID")),
    request_body = UpdateApplicantStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApplicantResponse),
        (status = 400, description = "Unknown status (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Applicant not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_applicant_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateApplicantStatusRequest>,
) -> Result<Json<ApplicantResponse>, AppError> {
    let existing = find_applicant(&state.db, id).await?;
    authorize_applicant(&state.db, &auth_user, &existing, Action::Review).await?;

    let mut active: applicant::ActiveModel = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now());
    let model = active.update(&state.db).await?;

    tracing::info!(applicant_id = model.id, status = %model.status, "Application reviewed");
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Applicants",
    operation_id = "deleteApplicant",
    summary = "Delete or withdraw an application",
    description = "Author of the opportunity, admins, or the applicant's own user.",
    params(("id" = i32, Path, description = "Applicant ID")),
    responses(
        (status = 200, description = "Application deleted", body = MessageResponse),
        (status = 401, description = "Unauthenticated (UNAUTHENTICATED)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Applicant not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_applicant(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    let existing = find_applicant(&state.db, id).await?;
    authorize_applicant(&state.db, &auth_user, &existing, Action::Delete).await?;

    applicant::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;
    Ok(Json(MessageResponse::new("Applicant deleted successfully")))
}

async fn authorize_applicant<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    applicant: &applicant::Model,
    action: Action,
) -> Result<(), AppError> {
    let opportunity = find_opportunity(db, applicant.opportunity_id).await?;
    authz::authorize_application(
        auth_user.identity(),
        applicant.user_id,
        opportunity.author_id,
        action,
    )
}

async fn find_applicant<C: ConnectionTrait>(db: &C, id: i32) -> Result<applicant::Model, AppError> {
    found(applicant::Entity::find_by_id(id).one(db).await?, "Applicant")
}
