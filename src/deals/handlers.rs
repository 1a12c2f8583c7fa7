use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateDealInput, DealResponse, UpdateDealRequest},
    service,
};
use crate::{auth::AuthUser, error::ApiError, state::AppState, storage::Upload};

pub fn deal_routes() -> Router<AppState> {
    Router::new()
        .route("/deals", get(list_deals).post(create_deal))
        .route("/deals/my-deals", get(my_deals))
        .route("/deals/:id", put(update_deal).delete(delete_deal))
        // Above the 5 MiB blob cap so oversize uploads surface as the 400
        // taxonomy error rather than a transport-level 413.
        .layer(DefaultBodyLimit::max(8 * 1024 * 1024))
}

fn bad_multipart<E: std::fmt::Display>(e: E) -> ApiError {
    ApiError::Validation(format!("Invalid multipart body: {e}"))
}

/// POST /deals — multipart form: title, description, discount, location,
/// startDate, endDate, optional `image` file.
#[instrument(skip(state, multipart))]
pub async fn create_deal(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DealResponse>), ApiError> {
    let mut input = CreateDealInput::default();
    let mut upload: Option<Upload> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "image" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let body = field.bytes().await.map_err(bad_multipart)?;
            upload = Some(Upload {
                filename,
                content_type,
                body,
            });
            continue;
        }
        let text = field.text().await.map_err(bad_multipart)?;
        match name.as_str() {
            "title" => input.title = Some(text),
            "description" => input.description = Some(text),
            "discount" => input.discount = Some(text),
            "location" => input.location = Some(text),
            "startDate" => input.start_date = Some(text),
            "endDate" => input.end_date = Some(text),
            _ => {}
        }
    }

    let deal = service::create(&state, &identity, input, upload).await?;
    Ok((StatusCode::CREATED, Json(deal.into())))
}

/// GET /deals — public, newest first.
#[instrument(skip(state))]
pub async fn list_deals(State(state): State<AppState>) -> Result<Json<Vec<DealResponse>>, ApiError> {
    let deals = service::list_all(&state).await?;
    Ok(Json(deals.into_iter().map(DealResponse::from).collect()))
}

/// GET /deals/my-deals — the caller's deals; 404 when there are none.
#[instrument(skip(state))]
pub async fn my_deals(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<DealResponse>>, ApiError> {
    let deals = service::list_mine(&state, &identity).await?;
    Ok(Json(deals.into_iter().map(DealResponse::from).collect()))
}

// An id that does not parse cannot match any record, so it reports the same
// NotFound as a missing one.
fn parse_deal_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound("Deal not found".into()))
}

/// PUT /deals/:id — partial update by the owning identity.
#[instrument(skip(state, patch))]
pub async fn update_deal(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<UpdateDealRequest>,
) -> Result<Json<DealResponse>, ApiError> {
    let deal_id = parse_deal_id(&id)?;
    let updated = service::update(&state, &identity, deal_id, patch).await?;
    Ok(Json(updated.into()))
}

/// DELETE /deals/:id — permanent removal by the owning identity.
#[instrument(skip(state))]
pub async fn delete_deal(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deal_id = parse_deal_id(&id)?;
    service::delete(&state, &identity, deal_id).await?;
    Ok(Json(json!({ "message": "Deal deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparseable_id_reads_as_not_found() {
        let err = parse_deal_id("doesnotexist").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let id = Uuid::new_v4();
        assert_eq!(parse_deal_id(&id.to_string()).unwrap(), id);
    }
}
