/// Status Routes
///
/// Anyone can list and read statuses. Creating requires a verified access
/// token; editing and deleting additionally require being the author.

use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::auth::UserIdentity;
use crate::error::{AppError, ErrorContext};
use crate::store::{NewStatus, Status, StatusStore, STATUS_LIST_LIMIT};
use crate::validators::{validate_status, StatusRequest};

fn parse_status_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}

async fn owned_status(
    statuses: &dyn StatusStore,
    id: Uuid,
    identity: &UserIdentity,
) -> Result<Status, AppError> {
    let status = statuses.find(id).await?.ok_or(AppError::NotFound)?;
    if status.user != identity.username {
        return Err(AppError::NotAuthor);
    }
    Ok(status)
}

/// GET /statuses
pub async fn list_statuses(statuses: web::Data<dyn StatusStore>) -> Result<HttpResponse, AppError> {
    let recent = statuses.list_recent(STATUS_LIST_LIMIT).await?;
    Ok(HttpResponse::Ok().json(recent))
}

/// GET /statuses/{id}/data
pub async fn get_status(
    path: web::Path<String>,
    statuses: web::Data<dyn StatusStore>,
) -> Result<HttpResponse, AppError> {
    let id = parse_status_id(&path)?;
    let status = statuses.find(id).await?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(status))
}

/// POST /statuses (authenticated)
pub async fn create_status(
    identity: web::ReqData<UserIdentity>,
    form: web::Json<StatusRequest>,
    statuses: web::Data<dyn StatusStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("status_create").with_user_id(identity.id.to_string());
    let message = validate_status(&form).map_err(|e| context.record(e.into()))?;

    let status = statuses
        .insert(NewStatus {
            user: identity.username.clone(),
            message,
        })
        .await
        .map_err(|e| context.record(e.into()))?;

    tracing::info!(
        request_id = %context.request_id,
        status_id = %status.id,
        user = %status.user,
        "Status created"
    );
    Ok(HttpResponse::Ok().json(status))
}

/// PATCH /statuses/{id} (authenticated, author only)
pub async fn update_status(
    path: web::Path<String>,
    identity: web::ReqData<UserIdentity>,
    form: web::Json<StatusRequest>,
    statuses: web::Data<dyn StatusStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("status_update").with_user_id(identity.id.to_string());
    let id = parse_status_id(&path)?;

    owned_status(statuses.get_ref(), id, &identity)
        .await
        .map_err(|e| context.record(e))?;
    let message = validate_status(&form).map_err(|e| context.record(e.into()))?;
    let updated = statuses
        .update_message(id, &message)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(request_id = %context.request_id, status_id = %id, "Status updated");
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /statuses/{id} (authenticated, author only)
pub async fn delete_status(
    path: web::Path<String>,
    identity: web::ReqData<UserIdentity>,
    statuses: web::Data<dyn StatusStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("status_delete").with_user_id(identity.id.to_string());
    let id = parse_status_id(&path)?;

    owned_status(statuses.get_ref(), id, &identity)
        .await
        .map_err(|e| context.record(e))?;
    let removed = statuses.delete(id).await?.ok_or(AppError::NotFound)?;

    tracing::info!(request_id = %context.request_id, status_id = %id, "Status deleted");
    Ok(HttpResponse::Ok().json(removed))
}
