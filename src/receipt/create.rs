use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Serialize;

use super::{printed_at, Receipt, RedemptionCode};
use crate::{
    err_responses::{ErrorResponse, MapErrorResponse},
    printer::PrintError,
    upstream::UpstreamError,
};

#[derive(thiserror::Error, Debug)]
pub enum ReceiptError {
    #[error("Missing userId parameter")]
    MissingUserId,
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("Could not format receipt date: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("Print failed: {0}")]
    Print(#[from] PrintError),
}

/// Query parameters in request order. Repeated keys are kept so the first
/// `userId` wins instead of failing the whole request.
type QueryPairs = Vec<(String, String)>;

fn first_user_id(pairs: QueryPairs) -> String {
    pairs
        .into_iter()
        .find_map(|(key, value)| (key == "userId").then_some(value))
        .unwrap_or_default()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    status: &'static str,
    user_id: String,
    redemption_code: String,
}

pub async fn create_receipt(
    State(state): State<crate::AppState>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<Json<ReceiptResponse>, Response> {
    let Query(pairs) =
        query.map_err_response(ErrorResponse::StatusCode(StatusCode::BAD_REQUEST))?;
    let user_id = first_user_id(pairs);
    if user_id.is_empty() {
        return Err(ReceiptError::MissingUserId)
            .map_err_response(ErrorResponse::StatusCode(StatusCode::BAD_REQUEST));
    }
    tracing::info!(%user_id, "Received receipt request");

    let data = state
        .upstream
        .create_receipt(&user_id)
        .await
        .map_err(ReceiptError::from)
        .map_err_response(ErrorResponse::InternalServerError)?;

    let code = RedemptionCode::generate();
    tracing::info!(%code, "Generated redemption code");

    let receipt = Receipt {
        brand_name: data.brand.name,
        brand_domain: data.brand.domain,
        code: code.clone(),
        printed_at: printed_at((state.clock)())
            .map_err(ReceiptError::from)
            .map_err_response(ErrorResponse::InternalServerError)?,
        support_phone: state.receipt.support_phone.clone(),
    };

    tracing::info!("Starting to print receipt");
    state
        .printer
        .with_printer(move |printer| receipt.render(printer))
        .await
        .map_err(ReceiptError::from)
        .map_err_response(ErrorResponse::InternalServerError)?;
    tracing::info!(%user_id, "Receipt printed successfully");

    Ok(Json(ReceiptResponse {
        status: "Receipt printed",
        user_id,
        redemption_code: code.into(),
    }))
}
