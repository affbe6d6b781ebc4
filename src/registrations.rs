//! Order triage board helpers: view filters, SKU search and grouping.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::{Order, OrderStatus};

pub trait Registration {
    fn sku(&self) -> &str;
    fn registered_at(&self) -> DateTime<Utc>;
    fn status(&self) -> OrderStatus;
}

impl Registration for Order {
    fn sku(&self) -> &str {
        &self.sku
    }

    fn registered_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status(&self) -> OrderStatus {
        self.status
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationView {
    #[default]
    All,
    /// Everything still needing attention.
    Pending,
    /// Completed, verified or void.
    Completed,
}

impl RegistrationView {
    pub fn includes(self, status: OrderStatus) -> bool {
        match self {
            RegistrationView::All => true,
            RegistrationView::Pending => !status.is_terminal(),
            RegistrationView::Completed => status.is_terminal(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationGroup<T> {
    pub sku: String,
    pub latest_at: DateTime<Utc>,
    pub items: Vec<T>,
}

pub fn matches_sku_search(sku: &str, search: &str) -> bool {
    let needle = search.trim();
    needle.is_empty() || sku.to_lowercase().contains(&needle.to_lowercase())
}

pub fn filter_registrations<T: Registration>(
    items: Vec<T>,
    view: RegistrationView,
    sku_search: Option<&str>,
) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| view.includes(item.status()))
        .filter(|item| sku_search.is_none_or(|search| matches_sku_search(item.sku(), search)))
        .collect()
}

/// Group items by SKU.
///
/// Groups are ordered by their most recent item, newest first; items
/// inside a group are newest first. Ties between groups fall back to the
/// SKU code so the board is stable.
pub fn group_and_sort_registrations<T: Registration>(items: Vec<T>) -> Vec<RegistrationGroup<T>> {
    let mut by_sku: HashMap<String, Vec<T>> = HashMap::new();
    for item in items {
        by_sku.entry(item.sku().to_string()).or_default().push(item);
    }

    let mut groups: Vec<RegistrationGroup<T>> = by_sku
        .into_iter()
        .filter_map(|(sku, mut items)| {
            items.sort_by(|a, b| b.registered_at().cmp(&a.registered_at()));
            let latest_at = items.first()?.registered_at();
            Some(RegistrationGroup {
                sku,
                latest_at,
                items,
            })
        })
        .collect();

    groups.sort_by(|a, b| b.latest_at.cmp(&a.latest_at).then_with(|| a.sku.cmp(&b.sku)));
    groups
}
