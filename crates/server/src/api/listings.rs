//! Listing ingest API handlers.
//!
//! Scraper processes post the listings they find here in batches.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use mieszkanieo_core::{Listing, UpsertSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

use crate::state::AppState;

/// Largest accepted batch
const MAX_BATCH_SIZE: usize = 100;

/// Request body for a batch insert
#[derive(Debug, Deserialize)]
pub struct BatchBody {
    #[serde(alias = "properties")]
    pub listings: Vec<Listing>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: UpsertSummary,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ListingErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// Insert a batch of listings, skipping ones already stored.
///
/// Any invalid row rejects the whole batch.
pub async fn batch_insert(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BatchBody>,
) -> Result<Json<BatchResponse>, impl IntoResponse> {
    if body.listings.is_empty() || body.listings.len() > MAX_BATCH_SIZE {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ListingErrorResponse {
                error: format!(
                    "Batch must contain between 1 and {} listings, got {}",
                    MAX_BATCH_SIZE,
                    body.listings.len()
                ),
                details: Vec::new(),
            }),
        ));
    }

    let details: Vec<String> = body
        .listings
        .iter()
        .enumerate()
        .filter_map(|(i, listing)| {
            listing
                .validate(state.known_sites())
                .err()
                .map(|e| format!("listings[{}]: {}", i, e))
        })
        .collect();

    if !details.is_empty() {
        debug!(invalid = details.len(), "Rejected listing batch");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ListingErrorResponse {
                error: "Invalid input data".to_string(),
                details,
            }),
        ));
    }

    match state.listing_store().bulk_upsert(&body.listings) {
        Ok(summary) => Ok(Json(BatchResponse {
            message: "Batch insert completed".to_string(),
            summary,
        })),
        Err(e) => {
            error!("Batch insert failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ListingErrorResponse {
                    error: e.to_string(),
                    details: Vec::new(),
                }),
            ))
        }
    }
}
