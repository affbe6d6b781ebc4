use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::OrderStatus;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkuSortBy {
    CreatedAt,
    Price,
    Name,
    Deadline,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CatalogQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Case-insensitive match on SKU code or name.
    pub q: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub sort_by: Option<SkuSortBy>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<OrderStatus>,
    pub sku: Option<String>,
    pub sort_order: Option<SortOrder>,
}

// Query strings are flat: `#[serde(flatten)]` breaks numeric fields
// under serde_urlencoded.
impl CatalogQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
        let p = Pagination {
            page: Some(3),
            per_page: Some(500),
        };
        assert_eq!(p.normalize(), (3, 100, 200));
        let p = Pagination {
            page: Some(-2),
            per_page: Some(0),
        };
        assert_eq!(p.normalize(), (1, 1, 0));
    }

    #[test]
    fn huge_page_does_not_overflow() {
        let p = Pagination {
            page: Some(i64::MAX),
            per_page: Some(20),
        };
        let (page, per_page, offset) = p.normalize();
        assert_eq!((page, per_page), (i64::MAX, 20));
        assert_eq!(offset, i64::MAX);
        assert!(u64::try_from(offset).is_ok());
    }
}
