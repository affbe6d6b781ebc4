use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Order;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentSummaryQuery {
    pub whatsapp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BankInstructions {
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentSummary {
    pub order: Order,
    pub amount_due: i64,
    pub proof_submitted: bool,
    pub can_submit_proof: bool,
    pub bank: BankInstructions,
}

/// Multipart body of the payment-proof upload.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct PaymentProofForm {
    pub whatsapp: String,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Debug)]
pub struct ProofUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}
