use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use server_api::ApiContext;
use shared::{
    domain::{Customer, Order, OrderId, OrderStatus, Quote, QuoteId, QuoteStatus},
    error::{ApiError, ErrorCode},
    protocol::{
        CreateCustomerRequest, CreateOrderRequest, CreateQuoteRequest, DashboardSummary,
        StatusUpdated, UpdateStatusRequest,
    },
};
use storage::{prepare_database_url, Storage};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

type HttpResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let app = build_router(Arc::new(AppState {
        api: ApiContext { storage },
    }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/customers", get(http_list_customers).post(http_create_customer))
        .route("/orders", get(http_list_orders).post(http_create_order))
        .route("/orders/:id/status", patch(http_update_order_status))
        .route("/quotes", get(http_list_quotes).post(http_create_quote))
        .route("/quotes/:id/status", patch(http_update_quote_status))
        .route("/dashboard", get(http_dashboard))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    if err.code == ErrorCode::Internal {
        error!(message = %err.message, "request failed");
    }
    (status_for(err.code), Json(err))
}

async fn healthz(State(state): State<Arc<AppState>>) -> HttpResult<&'static str> {
    state
        .api
        .storage
        .health_check()
        .await
        .map_err(|e| reject(ApiError::new(ErrorCode::Internal, e.to_string())))?;
    Ok("ok")
}

async fn http_list_customers(State(state): State<Arc<AppState>>) -> HttpResult<Json<Vec<Customer>>> {
    let customers = server_api::list_customers(&state.api).await.map_err(reject)?;
    Ok(Json(customers))
}

async fn http_create_customer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCustomerRequest>,
) -> HttpResult<(StatusCode, Json<Customer>)> {
    let customer = server_api::create_customer(&state.api, req)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn http_list_orders(State(state): State<Arc<AppState>>) -> HttpResult<Json<Vec<Order>>> {
    let orders = server_api::list_orders(&state.api).await.map_err(reject)?;
    Ok(Json(orders))
}

async fn http_create_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> HttpResult<(StatusCode, Json<Order>)> {
    let order = server_api::create_order(&state.api, req)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn http_update_order_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateStatusRequest<OrderStatus>>,
) -> HttpResult<Json<StatusUpdated<OrderId, OrderStatus>>> {
    let updated = server_api::update_order_status(&state.api, id, req.status)
        .await
        .map_err(reject)?;
    Ok(Json(updated))
}

async fn http_list_quotes(State(state): State<Arc<AppState>>) -> HttpResult<Json<Vec<Quote>>> {
    let quotes = server_api::list_quotes(&state.api).await.map_err(reject)?;
    Ok(Json(quotes))
}

async fn http_create_quote(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateQuoteRequest>,
) -> HttpResult<(StatusCode, Json<Quote>)> {
    let quote = server_api::create_quote(&state.api, req)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(quote)))
}

async fn http_update_quote_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<QuoteId>,
    Json(req): Json<UpdateStatusRequest<QuoteStatus>>,
) -> HttpResult<Json<StatusUpdated<QuoteId, QuoteStatus>>> {
    let updated = server_api::update_quote_status(&state.api, id, req.status)
        .await
        .map_err(reject)?;
    Ok(Json(updated))
}

async fn http_dashboard(State(state): State<Arc<AppState>>) -> HttpResult<Json<DashboardSummary>> {
    let summary = server_api::dashboard(&state.api).await.map_err(reject)?;
    Ok(Json(summary))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
