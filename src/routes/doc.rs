use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    analytics::{MonthlyTotal, TrendPoint},
    dto::{
        admin::{
            CreateSkuRequest, MonthlyReport, OrderList, RegistrationBoard, RegistrationGroupDto,
            SkuUpdate, SkuUpdateRequest, SlotQuotaRequest, SweepReport, TrendReport,
            UpdateOrderStatusRequest,
        },
        auth::{LoginRequest, LoginResponse},
        cart::{
            AddToCartRequest, AddToCartResponse, AddToCartStatus, CartItemState, CartItemView,
            CartSessionResponse, CartView, SubmitCartRequest, SubmitCartResponse, SubmitItemResult,
        },
        catalog::{FeedEntry, FeedList, SkuDetail, SkuList},
        payments::{BankInstructions, PaymentProofForm, PaymentSummary},
        reels::{BookingStatus, CreateReelsOrderRequest, ReelsOrderResponse},
    },
    events::{EventKind, StoreEvent},
    models::{Order, OrderStatus, Sku, Slot},
    registrations::RegistrationView,
    response::{Ack, ApiResponse, Meta},
    routes::{
        admin, analytics, auth, cart, catalog, events, feed, health, media, params, payments, reels,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        catalog::list_skus,
        catalog::get_sku,
        feed::list_feed,
        reels::create_reels_order,
        cart::create_session,
        cart::get_cart,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::submit_cart,
        payments::payment_summary,
        payments::submit_payment_proof,
        media::image_proxy,
        media::invoice_preview,
        auth::login,
        admin::list_orders,
        admin::get_order,
        admin::update_order_status,
        admin::attach_invoice,
        admin::list_registrations,
        admin::list_skus,
        admin::create_sku,
        admin::get_sku,
        admin::update_sku,
        admin::sku_update,
        admin::delete_sku,
        admin::set_slot_quota,
        admin::sweep_reservations,
        analytics::monthly,
        analytics::trend,
        events::events
    ),
    components(
        schemas(
            Sku,
            Slot,
            Order,
            OrderStatus,
            SkuList,
            SkuDetail,
            FeedEntry,
            FeedList,
            BookingStatus,
            CreateReelsOrderRequest,
            ReelsOrderResponse,
            CartSessionResponse,
            AddToCartRequest,
            AddToCartResponse,
            AddToCartStatus,
            CartItemState,
            CartItemView,
            CartView,
            SubmitCartRequest,
            SubmitItemResult,
            SubmitCartResponse,
            BankInstructions,
            PaymentSummary,
            PaymentProofForm,
            LoginRequest,
            LoginResponse,
            OrderList,
            RegistrationView,
            RegistrationGroupDto,
            RegistrationBoard,
            UpdateOrderStatusRequest,
            CreateSkuRequest,
            SkuUpdate,
            SkuUpdateRequest,
            SlotQuotaRequest,
            SweepReport,
            MonthlyTotal,
            TrendPoint,
            MonthlyReport,
            TrendReport,
            EventKind,
            StoreEvent,
            params::Pagination,
            params::CatalogQuery,
            params::OrderListQuery,
            Ack,
            Meta,
            ApiResponse<Order>,
            ApiResponse<SkuList>,
            ApiResponse<SkuDetail>,
            ApiResponse<CartView>,
            ApiResponse<PaymentSummary>,
            ApiResponse<RegistrationBoard>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Catalog", description = "SKU catalog and flash-sale feed"),
        (name = "Reels", description = "Flash-sale ordering"),
        (name = "Cart", description = "Cart reservations and checkout"),
        (name = "Payments", description = "Payment summary and proof upload"),
        (name = "Media", description = "Image proxy and invoice rendering"),
        (name = "Auth", description = "Admin login"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Analytics", description = "Sales analytics"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_storefront_and_admin_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/reels/orders",
            "/api/cart/submit",
            "/api/orders/{id}/payment-proof",
            "/api/admin/sku-update",
            "/api/admin/analytics/trend",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
