pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod ports;
pub mod rail;
pub mod services;
pub mod utils;
pub mod validation;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use services::{MandateService, TransactionService};

#[derive(Clone)]
pub struct AppState {
    pub mandates: Arc<MandateService>,
    pub transactions: Arc<TransactionService>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/debit-order/mandates",
            post(handlers::mandates::create_mandate).get(handlers::mandates::list_mandates),
        )
        .route(
            "/debit-order/mandates/:id",
            get(handlers::mandates::get_mandate),
        )
        .route(
            "/debit-order/mandates/:id/activate",
            post(handlers::mandates::activate_mandate),
        )
        .route(
            "/debit-order/mandates/:id/suspend",
            post(handlers::mandates::suspend_mandate),
        )
        .route(
            "/debit-order/mandates/:id/resume",
            post(handlers::mandates::resume_mandate),
        )
        .route(
            "/debit-order/mandates/:id/cancel",
            post(handlers::mandates::cancel_mandate),
        )
        .route(
            "/debit-order/mandates/:id/form",
            get(handlers::mandates::mandate_form),
        )
        .route(
            "/debit-order/transactions",
            get(handlers::transactions::list_transactions),
        )
        .route(
            "/debit-order/transactions/:id",
            get(handlers::transactions::get_transaction),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
