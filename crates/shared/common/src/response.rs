//! Success envelopes: `{ "data": ..., "meta": { "timestamp", ... } }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::pagination::Page;

/// Response metadata. The timestamp is epoch milliseconds as a string.
#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub timestamp: String,
    #[serde(flatten)]
    pub page: Option<PageMeta>,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis().to_string(),
            page: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> From<&Page<T>> for PageMeta {
    fn from(page: &Page<T>) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages: page.total_pages(),
        }
    }
}

/// 200 response wrapping `data`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
    pub meta: Meta,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: Meta::now(),
        }
    }
}

impl<T: Serialize> Envelope<Vec<T>> {
    /// List envelope carrying the page counters in `meta`.
    pub fn paged(page: Page<T>) -> Self {
        let mut meta = Meta::now();
        meta.page = Some(PageMeta::from(&page));
        Self {
            data: page.items,
            meta,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// 201 response wrapping `data` in the envelope.
#[derive(Debug)]
pub struct Created<T>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(Envelope::new(self.0))).into_response()
    }
}

/// 204 with no body.
#[derive(Debug, Clone, Copy)]
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_envelope_has_timestamp_only() {
        let value = serde_json::to_value(Envelope::new(json!({"id": 1}))).unwrap();

        assert_eq!(value["data"]["id"], 1);
        let meta = value["meta"].as_object().unwrap();
        assert_eq!(meta.len(), 1);
        assert!(meta["timestamp"].as_str().unwrap().parse::<i64>().is_ok());
    }

    #[test]
    fn test_paged_envelope_flattens_counters() {
        let page = Page::new(vec!["a", "b"], 3, 1, 2);
        let value = serde_json::to_value(Envelope::paged(page)).unwrap();

        assert_eq!(value["data"], json!(["a", "b"]));
        assert_eq!(value["meta"]["page"], 1);
        assert_eq!(value["meta"]["limit"], 2);
        assert_eq!(value["meta"]["total"], 3);
        assert_eq!(value["meta"]["totalPages"], 2);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Created(json!({})).into_response().status(), StatusCode::CREATED);
        assert_eq!(NoContent.into_response().status(), StatusCode::NO_CONTENT);
        assert_eq!(Envelope::new(1).into_response().status(), StatusCode::OK);
    }
}
