use chrono::{Datelike, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::{
    analytics::{Sale, lifetime_trend, monthly_totals},
    dto::admin::{MonthlyQuery, MonthlyReport, TrendQuery, TrendReport},
    entity::orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::OrderStatus,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn sale_from_order(order: &OrderModel) -> Sale {
    Sale {
        sku: order.sku.clone(),
        amount: order.price * i64::from(order.quantity),
        units: i64::from(order.quantity),
        sold_at: order.created_at.with_timezone(&Utc),
    }
}

async fn load_sales(state: &AppState, sku: Option<&str>) -> AppResult<Vec<Sale>> {
    let mut finder = Orders::find().filter(OrderCol::Status.is_in(OrderStatus::sale_statuses()));
    if let Some(sku) = sku {
        finder = finder.filter(OrderCol::Sku.eq(sku));
    }
    Ok(finder
        .all(&state.orm)
        .await?
        .iter()
        .map(sale_from_order)
        .collect())
}

pub async fn monthly(
    state: &AppState,
    user: &AuthUser,
    query: MonthlyQuery,
) -> AppResult<ApiResponse<MonthlyReport>> {
    ensure_admin(user)?;
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let sales = load_sales(state, None).await?;
    let months = monthly_totals(&sales, year);

    let report = MonthlyReport {
        year,
        total_amount: months.iter().map(|m| m.amount).sum(),
        total_units: months.iter().map(|m| m.units).sum(),
        months,
    };
    Ok(ApiResponse::success("Monthly sales", report, Some(Meta::empty())))
}

pub async fn trend(
    state: &AppState,
    user: &AuthUser,
    query: TrendQuery,
) -> AppResult<ApiResponse<TrendReport>> {
    ensure_admin(user)?;
    let sku = query.sku.trim();
    if sku.is_empty() {
        return Err(AppError::BadRequest("sku is required".into()));
    }

    let sales = load_sales(state, Some(sku)).await?;
    let points = lifetime_trend(&sales, sku);
    let meta = Meta::count(points.len());
    Ok(ApiResponse::success(
        "Sales trend",
        TrendReport {
            sku: sku.to_string(),
            points,
        },
        Some(meta),
    ))
}
