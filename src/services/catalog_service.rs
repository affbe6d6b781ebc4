use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    dto::catalog::{FeedEntry, FeedList, SkuDetail, SkuList},
    entity::skus::{Column, Entity as Skus},
    error::{AppError, AppResult},
    models::Sku,
    response::{ApiResponse, Meta},
    routes::params::{CatalogQuery, SkuSortBy, SortOrder},
    services::{
        convert::sku_from_entity,
        reservation_service::{availability, total_remaining},
    },
    state::AppState,
};

fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn offers(values: &[String], wanted: Option<&str>) -> bool {
    match wanted.map(str::trim).filter(|w| !w.is_empty()) {
        Some(wanted) => values.iter().any(|v| v.eq_ignore_ascii_case(wanted)),
        None => true,
    }
}

/// Color and size are matched in memory against the JSON variation lists.
pub fn matches_variation(sku: &Sku, color: Option<&str>, size: Option<&str>) -> bool {
    offers(&sku.colors, color) && offers(&sku.sizes, size)
}

pub async fn list_skus(
    state: &AppState,
    query: CatalogQuery,
    include_inactive: bool,
) -> AppResult<ApiResponse<SkuList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if !include_inactive {
        condition = condition.add(Column::IsActive.eq(true));
    }

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Sku).ilike(pattern.clone()))
                .add(Expr::col(Column::Name).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(SkuSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        SkuSortBy::CreatedAt => Column::CreatedAt,
        SkuSortBy::Price => Column::Price,
        SkuSortBy::Name => Column::Name,
        SkuSortBy::Deadline => Column::Deadline,
    };

    let mut finder = Skus::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };
    finder = finder.order_by_asc(Column::Sku);

    let matching: Vec<Sku> = finder
        .all(&state.orm)
        .await?
        .into_iter()
        .map(sku_from_entity)
        .filter(|sku| matches_variation(sku, query.color.as_deref(), query.size.as_deref()))
        .collect();

    let total = matching.len() as i64;
    let items = matching
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("SKUs", SkuList { items }, Some(meta)))
}

pub async fn get_sku(
    state: &AppState,
    code: &str,
    include_inactive: bool,
) -> AppResult<ApiResponse<SkuDetail>> {
    let sku = Skus::find_by_id(code.to_string())
        .one(&state.orm)
        .await?
        .map(sku_from_entity)
        .filter(|sku| include_inactive || sku.is_active)
        .ok_or(AppError::NotFound)?;

    let now = Utc::now();
    let mut by_sku = availability(&state.orm, std::slice::from_ref(&sku.sku), now).await?;
    let slots = by_sku.remove(&sku.sku).unwrap_or_default();

    let detail = SkuDetail {
        remaining: total_remaining(&slots),
        is_open: sku.is_open(now),
        sku,
        slots,
    };
    Ok(ApiResponse::success("SKU", detail, Some(Meta::empty())))
}

/// Active flash-sale SKUs with a video, soonest deadline first.
pub async fn list_feed(state: &AppState) -> AppResult<ApiResponse<FeedList>> {
    let now = Utc::now();
    let mut skus: Vec<Sku> = Skus::find()
        .filter(Column::IsActive.eq(true))
        .filter(Column::VideoUrl.is_not_null())
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(sku_from_entity)
        .filter(|sku| sku.is_open(now))
        .filter(|sku| sku.video_url.as_deref().is_some_and(|url| !url.trim().is_empty()))
        .collect();

    // Stable sort keeps newest-first among equal deadlines.
    skus.sort_by_key(|sku| (sku.deadline.is_none(), sku.deadline));

    let codes: Vec<String> = skus.iter().map(|sku| sku.sku.clone()).collect();
    let mut by_sku = availability(&state.orm, &codes, now).await?;

    let items: Vec<FeedEntry> = skus
        .into_iter()
        .map(|sku| {
            let slots = by_sku.remove(&sku.sku).unwrap_or_default();
            let remaining = total_remaining(&slots);
            FeedEntry {
                sku,
                slots,
                remaining,
                is_sold_out: remaining == 0,
            }
        })
        .collect();

    let meta = Meta::count(items.len());
    Ok(ApiResponse::success("Feed", FeedList { items }, Some(meta)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sku(colors: &[&str], sizes: &[&str]) -> Sku {
        let now = Utc::now();
        Sku {
            sku: "DRS-01".into(),
            name: "Dress".into(),
            description: None,
            price: 1,
            images: vec![],
            colors: colors.iter().map(|c| c.to_string()).collect(),
            sizes: sizes.iter().map(|s| s.to_string()).collect(),
            video_url: None,
            deadline: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn variation_filter_is_case_insensitive() {
        let dress = sku(&["Red", "Black"], &["S", "M"]);
        assert!(matches_variation(&dress, Some("red"), None));
        assert!(matches_variation(&dress, Some("BLACK"), Some("m")));
        assert!(!matches_variation(&dress, Some("Blue"), None));
        assert!(!matches_variation(&dress, None, Some("XL")));
        assert!(matches_variation(&dress, Some(" "), None));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("drs"), "%drs%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
