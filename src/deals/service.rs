use time::Date;
use tracing::info;
use uuid::Uuid;

use super::{
    dto::{CreateDealInput, UpdateDealRequest, DATE_FORMAT},
    policy::{authorize, Action},
    repo::{Deal, NewDeal},
};
use crate::{
    auth::Identity,
    error::ApiError,
    state::AppState,
    storage::{Upload, NO_IMAGE_REF},
};

/// Create payload after validation: every field present and well-formed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidatedDeal {
    pub title: String,
    pub description: String,
    pub discount: f64,
    pub location: String,
    pub start_date: Date,
    pub end_date: Date,
}

fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), DATE_FORMAT).ok()
}

fn discount_in_range(value: f64) -> bool {
    value.is_finite() && value > 0.0 && value <= 100.0
}

/// Validates the create payload. The first failing rule determines the
/// reported error: presence, then discount, then dates.
pub(crate) fn validate(input: &CreateDealInput) -> Result<ValidatedDeal, ApiError> {
    let present = |field: &Option<String>| -> Option<String> {
        field
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let (Some(title), Some(description), Some(discount), Some(location), Some(start), Some(end)) = (
        present(&input.title),
        present(&input.description),
        present(&input.discount),
        present(&input.location),
        present(&input.start_date),
        present(&input.end_date),
    ) else {
        return Err(ApiError::Validation("All fields are required".into()));
    };

    let discount = discount
        .parse::<f64>()
        .ok()
        .filter(|d| discount_in_range(*d))
        .ok_or_else(|| ApiError::Validation("Discount must be between 1% and 100%".into()))?;

    let (Some(start_date), Some(end_date)) = (parse_date(&start), parse_date(&end)) else {
        return Err(ApiError::Validation(
            "Invalid dates or end date must be after start date".into(),
        ));
    };
    if end_date <= start_date {
        return Err(ApiError::Validation(
            "Invalid dates or end date must be after start date".into(),
        ));
    }

    Ok(ValidatedDeal {
        title,
        description,
        discount,
        location,
        start_date,
        end_date,
    })
}

/// Partial-update merge: applies only the fields present and non-empty in the
/// patch, re-validating discount and date ordering on the merged value. The
/// immutable fields (`id`, `owner_id`, `created_at`, `image`) pass through
/// untouched.
pub(crate) fn apply_update(mut deal: Deal, patch: &UpdateDealRequest) -> Result<Deal, ApiError> {
    let overwrite = |target: &mut String, value: &Option<String>| {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            *target = v.to_string();
        }
    };
    overwrite(&mut deal.title, &patch.title);
    overwrite(&mut deal.description, &patch.description);
    overwrite(&mut deal.location, &patch.location);

    if let Some(discount) = patch.discount {
        if !discount_in_range(discount) {
            return Err(ApiError::Validation(
                "Discount must be between 1% and 100%".into(),
            ));
        }
        deal.discount = discount;
    }

    let parse_patch_date = |value: &Option<String>| -> Result<Option<Date>, ApiError> {
        match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => parse_date(raw)
                .map(Some)
                .ok_or_else(|| ApiError::Validation("Invalid date".into())),
            None => Ok(None),
        }
    };
    if let Some(start) = parse_patch_date(&patch.start_date)? {
        deal.start_date = start;
    }
    if let Some(end) = parse_patch_date(&patch.end_date)? {
        deal.end_date = end;
    }
    if deal.end_date <= deal.start_date {
        return Err(ApiError::Validation(
            "Invalid dates or end date must be after start date".into(),
        ));
    }

    Ok(deal)
}

/// Authorize, validate, resolve the image blob, persist. The blob write
/// completes strictly before the insert, so a stored deal never references an
/// unwritten blob; a failed insert after a blob write only orphans the blob.
pub async fn create(
    state: &AppState,
    identity: &Identity,
    input: CreateDealInput,
    upload: Option<Upload>,
) -> Result<Deal, ApiError> {
    authorize(Some(identity), Action::Create)?;
    let v = validate(&input)?;

    let image = match upload {
        Some(u) => state.storage.accept(u).await?,
        None => NO_IMAGE_REF.to_string(),
    };

    let deal = Deal::insert(
        &state.db,
        &NewDeal {
            title: v.title,
            description: v.description,
            discount: v.discount,
            location: v.location,
            start_date: v.start_date,
            end_date: v.end_date,
            image,
            owner_id: identity.id,
        },
    )
    .await?;

    info!(deal_id = %deal.id, owner_id = %identity.id, "deal created");
    Ok(deal)
}

pub async fn list_all(state: &AppState) -> Result<Vec<Deal>, ApiError> {
    authorize(None, Action::List)?;
    Ok(Deal::list_all(&state.db).await?)
}

/// The caller's own deals, newest first. An empty set is a distinct
/// "no results" signal, not a plain empty list.
pub async fn list_mine(state: &AppState, identity: &Identity) -> Result<Vec<Deal>, ApiError> {
    authorize(Some(identity), Action::ListMine)?;
    let deals = Deal::list_by_owner(&state.db, identity.id).await?;
    if deals.is_empty() {
        return Err(ApiError::NotFound("No deals found for this user".into()));
    }
    Ok(deals)
}

/// Existence check strictly before the ownership check: probing a nonexistent
/// id yields NotFound for everyone, probing someone else's deal yields the
/// ownership denial.
pub async fn update(
    state: &AppState,
    identity: &Identity,
    deal_id: Uuid,
    patch: UpdateDealRequest,
) -> Result<Deal, ApiError> {
    let deal = Deal::find_by_id(&state.db, deal_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Deal not found".into()))?;
    authorize(Some(identity), Action::Update(&deal))?;

    let merged = apply_update(deal, &patch)?;
    let updated = Deal::update(&state.db, &merged).await?;

    info!(deal_id = %updated.id, owner_id = %identity.id, "deal updated");
    Ok(updated)
}

pub async fn delete(state: &AppState, identity: &Identity, deal_id: Uuid) -> Result<(), ApiError> {
    let deal = Deal::find_by_id(&state.db, deal_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Deal not found".into()))?;
    authorize(Some(identity), Action::Delete(&deal))?;

    // Irreversible; the referenced blob is left in place.
    Deal::delete(&state.db, deal.id).await?;

    info!(deal_id = %deal.id, owner_id = %identity.id, "deal deleted");
    Ok(())
}
