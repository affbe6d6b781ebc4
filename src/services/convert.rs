use chrono::Utc;
use sea_orm::prelude::Json;

use crate::{
    entity::{orders::Model as OrderModel, skus::Model as SkuModel},
    error::{AppError, AppResult},
    models::{Order, Sku},
};

pub fn json_strings(value: &Json) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn strings_json(values: &[String]) -> Json {
    Json::Array(values.iter().cloned().map(Json::String).collect())
}

pub fn sku_from_entity(model: SkuModel) -> Sku {
    Sku {
        images: json_strings(&model.images),
        colors: json_strings(&model.colors),
        sizes: json_strings(&model.sizes),
        sku: model.sku,
        name: model.name,
        description: model.description,
        price: model.price,
        video_url: model.video_url,
        deadline: model.deadline.map(|dt| dt.with_timezone(&Utc)),
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    let status = model
        .status
        .parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(Order {
        id: model.id,
        sku: model.sku,
        customer_name: model.customer_name,
        whatsapp: model.whatsapp,
        color: model.color,
        size: model.size,
        quantity: model.quantity,
        price: model.price,
        status,
        payment_proof_url: model.payment_proof_url,
        invoice_url: model.invoice_url,
        cart_session_id: model.cart_session_id,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn orders_from_entities(models: Vec<OrderModel>) -> AppResult<Vec<Order>> {
    models.into_iter().map(order_from_entity).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_string_arrays() {
        let values = vec!["Red".to_string(), "Black".to_string()];
        let json = strings_json(&values);
        assert_eq!(json_strings(&json), values);
        assert!(json_strings(&serde_json::json!({"not": "an array"})).is_empty());
        assert_eq!(json_strings(&serde_json::json!(["S", 1, null, "M"])), vec!["S", "M"]);
    }
}
