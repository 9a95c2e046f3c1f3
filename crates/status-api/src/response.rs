//! Success envelope: `{"data": ..., "meta": {...}}`.

use axum::Json;
use common::PageMeta;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
    pub meta: Meta,
}

#[derive(Debug, Default, Serialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageMeta>,
}

/// Wraps a single resource.
pub fn data<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        data,
        meta: Meta::default(),
    })
}

/// Wraps one page of a collection with its pagination metadata.
pub fn page<T: Serialize>(data: Vec<T>, pagination: PageMeta) -> Json<Envelope<Vec<T>>> {
    Json(Envelope {
        data,
        meta: Meta {
            pagination: Some(pagination),
        },
    })
}
