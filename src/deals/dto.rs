use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};
use uuid::Uuid;

use super::repo::Deal;

/// Wire format for deal dates.
pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub(crate) fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_default()
}

/// Create payload as collected from the multipart form. Everything arrives as
/// text fields; validation in the service decides what is missing or
/// malformed.
#[derive(Debug, Default, Clone)]
pub struct CreateDealInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub discount: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Partial update body. Absent or empty fields leave the stored value
/// unchanged; a field cannot be cleared, only overwritten. `image`, `id`,
/// `ownerId` and `createdAt` are not mutable through this payload.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDealRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub discount: Option<f64>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub discount: f64,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub image: String,
    pub owner_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Deal> for DealResponse {
    fn from(deal: Deal) -> Self {
        Self {
            id: deal.id,
            title: deal.title,
            description: deal.description,
            discount: deal.discount,
            location: deal.location,
            start_date: format_date(deal.start_date),
            end_date: format_date(deal.end_date),
            image: deal.image,
            owner_id: deal.owner_id,
            created_at: deal.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn dates_format_as_iso_calendar_dates() {
        assert_eq!(format_date(date!(2026 - 03 - 07)), "2026-03-07");
    }

    #[test]
    fn response_uses_camel_case_keys() {
        let deal = Deal {
            id: Uuid::new_v4(),
            title: "Two-for-one coffee".into(),
            description: "Mornings only".into(),
            discount: 50.0,
            location: "Porto".into(),
            start_date: date!(2026 - 01 - 01),
            end_date: date!(2026 - 06 - 01),
            image: "/uploads/default.png".into(),
            owner_id: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&DealResponse::from(deal)).unwrap();
        assert!(json.contains("\"startDate\":\"2026-01-01\""));
        assert!(json.contains("\"endDate\":\"2026-06-01\""));
        assert!(json.contains("\"ownerId\""));
        assert!(json.contains("\"createdAt\""));
    }

    #[test]
    fn update_request_parses_partial_camel_case_body() {
        let body = r#"{"title":"New title","endDate":"2026-09-01"}"#;
        let req: UpdateDealRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.title.as_deref(), Some("New title"));
        assert_eq!(req.end_date.as_deref(), Some("2026-09-01"));
        assert!(req.description.is_none());
        assert!(req.discount.is_none());
    }
}
