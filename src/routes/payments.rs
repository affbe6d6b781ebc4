use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::payments::{PaymentProofForm, PaymentSummary, PaymentSummaryQuery, ProofUpload},
    error::{AppError, AppResult},
    models::Order,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/payment", get(payment_summary))
        .route("/{id}/payment-proof", post(submit_payment_proof))
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/payment",
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        ("whatsapp" = String, Query, description = "WhatsApp number used for the order"),
    ),
    responses(
        (status = 200, description = "Amount due and bank instructions", body = ApiResponse<PaymentSummary>),
        (status = 404, description = "Unknown order or WhatsApp mismatch"),
    ),
    tag = "Payments"
)]
pub async fn payment_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PaymentSummaryQuery>,
) -> AppResult<Json<ApiResponse<PaymentSummary>>> {
    let resp = payment_service::get_order_payment_summary(&state, id, &query.whatsapp).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/payment-proof",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body(content = PaymentProofForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Proof stored, order marked paid", body = ApiResponse<Order>),
        (status = 400, description = "Bad file or order state"),
        (status = 404, description = "Unknown order or WhatsApp mismatch"),
    ),
    tag = "Payments"
)]
pub async fn submit_payment_proof(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<Order>>> {
    let mut whatsapp = None;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("whatsapp") => {
                whatsapp = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("file") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload = Some(ProofUpload {
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let whatsapp = whatsapp.ok_or_else(|| AppError::BadRequest("whatsapp is required".into()))?;
    let upload = upload.ok_or_else(|| AppError::BadRequest("file is required".into()))?;

    let resp = payment_service::submit_payment_proof(&state, id, &whatsapp, upload).await?;
    Ok(Json(resp))
}
