use crate::error::{AppError, AppResult};
use crate::middleware_impls::RequestContext;
use crate::models::{BatchCreateOutcome, ClickContext, CreateUrlPayload};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::Extension;
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use super::AppState;

/// Create short URLs: a single request object or a batch array.
pub async fn create_url(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUrlPayload>,
) -> AppResult<impl IntoResponse> {
    match payload {
        CreateUrlPayload::Single(request) => {
            // First-line DTO constraints; the service re-runs the full
            // policy checks either way
            request.validate().map_err(map_derive_errors)?;

            let response = state.links.create(&request).await?;
            Ok((StatusCode::CREATED, Json(response)).into_response())
        }
        CreateUrlPayload::Batch(requests) => {
            if requests.is_empty() {
                return Err(AppError::validation("request", "Batch must not be empty"));
            }
            if requests.len() > state.max_batch_size {
                return Err(AppError::validation(
                    "request",
                    format!("Batch size exceeds the limit of {}", state.max_batch_size),
                ));
            }

            let results = state.links.create_batch(&requests).await;
            let outcomes: Vec<BatchCreateOutcome> = results
                .into_iter()
                .map(|result| match result {
                    Ok(response) => BatchCreateOutcome::Created(response),
                    Err(err) => BatchCreateOutcome::Failed {
                        error: err.code().to_string(),
                        message: err.to_string(),
                    },
                })
                .collect();

            Ok((StatusCode::OK, Json(outcomes)).into_response())
        }
    }
}

/// Resolve a short URL and redirect
pub async fn resolve_url(
    State(state): State<Arc<AppState>>,
    Extension(request_context): Extension<RequestContext>,
    Path(code): Path<String>,
) -> AppResult<impl IntoResponse> {
    let context = click_context(&request_context);
    let original_url = state.links.resolve(&code, context).await?;

    // 302: intermediaries must not cache the mapping past its validity window
    Ok((StatusCode::FOUND, [(header::LOCATION, original_url)]))
}

/// Get click statistics for a short URL
pub async fn get_url_stats(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AppResult<impl IntoResponse> {
    let stats = state.links.stats(&code).await?;
    Ok(Json(stats))
}

/// Build the click context a redirect hands to the background worker.
fn click_context(request_context: &RequestContext) -> ClickContext {
    let client_ip = Some(request_context.client_ip.clone()).filter(|ip| ip != "unknown");

    ClickContext {
        requested_at: Utc::now(),
        referrer: request_context.referrer.clone(),
        user_agent: request_context.user_agent.clone(),
        client_ip,
    }
}

/// Map validator-derive failures onto the application error taxonomy.
fn map_derive_errors(errors: validator::ValidationErrors) -> AppError {
    let field_errors = errors.field_errors();
    let (field, reasons) = match field_errors.iter().next() {
        Some((field, reasons)) => (field.to_string(), reasons),
        None => return AppError::validation("request", "Validation failed"),
    };

    let reason = reasons
        .iter()
        .filter_map(|e| e.message.as_ref())
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join("; ");

    AppError::validation(
        field,
        if reason.is_empty() {
            "Validation failed".to_string()
        } else {
            reason
        },
    )
}
