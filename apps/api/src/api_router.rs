use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware::{from_fn_with_state, map_response};
use axum::routing::{get, post};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    admin, customers, health, setup_intents, subscription_items, subscriptions, tax_rates,
};
use crate::middleware;
use crate::state::AppState;

pub fn build_router(app_state: AppState, request_timeout: Duration) -> Router {
    let tenant_routes = Router::new()
        .route(
            "/v1/customers",
            get(customers::list_customers_handler).post(customers::create_customer_handler),
        )
        .route(
            "/v1/customers/{customer_id}",
            get(customers::get_customer_handler)
                .put(customers::update_customer_handler)
                .delete(customers::delete_customer_handler),
        )
        .route(
            "/v1/subscriptions",
            get(subscriptions::list_subscriptions_handler)
                .post(subscriptions::create_subscription_handler),
        )
        .route(
            "/v1/subscriptions/{subscription_id}",
            get(subscriptions::get_subscription_handler)
                .put(subscriptions::update_subscription_handler)
                .delete(subscriptions::cancel_subscription_handler),
        )
        .route(
            "/v1/subscriptions/{subscription_id}/sync",
            post(subscriptions::sync_subscription_handler),
        )
        .route(
            "/v1/subscription-items",
            get(subscription_items::list_subscription_items_handler)
                .post(subscription_items::create_subscription_item_handler),
        )
        .route(
            "/v1/subscription-items/{item_id}",
            get(subscription_items::get_subscription_item_handler)
                .put(subscription_items::update_subscription_item_handler)
                .delete(subscription_items::delete_subscription_item_handler),
        )
        .route(
            "/v1/setup-intents",
            get(setup_intents::list_setup_intents_handler)
                .post(setup_intents::create_setup_intent_handler),
        )
        .route(
            "/v1/setup-intents/{setup_intent_id}",
            get(setup_intents::get_setup_intent_handler)
                .delete(setup_intents::cancel_setup_intent_handler),
        )
        .route(
            "/v1/setup-intents/{setup_intent_id}/sync",
            post(setup_intents::sync_setup_intent_handler),
        )
        .route(
            "/v1/tax-rates",
            get(tax_rates::list_tax_rates_handler).post(tax_rates::create_tax_rate_handler),
        )
        .route(
            "/v1/tax-rates/{tax_rate_id}",
            get(tax_rates::get_tax_rate_handler)
                .put(tax_rates::update_tax_rate_handler)
                .delete(tax_rates::delete_tax_rate_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_tenant,
        ));

    let admin_routes = Router::new()
        .route(
            "/admin/tenants",
            get(admin::list_tenants_handler).post(admin::create_tenant_handler),
        )
        .route(
            "/admin/tenants/{tenant_id}/suspend",
            post(admin::suspend_tenant_handler),
        )
        .route(
            "/admin/tenants/{tenant_id}/reactivate",
            post(admin::reactivate_tenant_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_admin,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(tenant_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(map_response(middleware::envelope_request_timeout))
        .with_state(app_state)
}

#[cfg(test)]
mod tests;
