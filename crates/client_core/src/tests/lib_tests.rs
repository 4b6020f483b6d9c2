use super::*;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use board::{BoardController, MoveOutcome, StatusRemote};
use chrono::Utc;
use shared::{domain::CustomerId, error::ErrorCode};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    orders: Arc<Mutex<Vec<Order>>>,
}

fn order(description: &str, status: OrderStatus) -> Order {
    Order {
        id: OrderId::generate(),
        customer_id: CustomerId::generate(),
        customer_name: "Dona Lurdes".into(),
        status,
        description: description.into(),
        total_cents: 5_000,
        delivery_date: None,
        created_at: Utc::now(),
    }
}

async fn handle_list_orders(State(state): State<ServerState>) -> Json<Vec<Order>> {
    Json(state.orders.lock().await.clone())
}

async fn handle_update_order(
    State(state): State<ServerState>,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateStatusRequest<OrderStatus>>,
) -> Result<Json<StatusUpdated<OrderId, OrderStatus>>, (StatusCode, Json<ApiError>)> {
    if req.status == OrderStatus::Cancelled {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(ErrorCode::Internal, "database is locked")),
        ));
    }
    let mut orders = state.orders.lock().await;
    let order = orders
        .iter_mut()
        .find(|o| o.id == id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, Json(ApiError::not_found("order", id))))?;
    order.status = req.status;
    Ok(Json(StatusUpdated {
        id,
        status: req.status,
    }))
}

async fn handle_update_quote() -> (StatusCode, &'static str) {
    (StatusCode::BAD_GATEWAY, "upstream unavailable")
}

async fn spawn_bakery_server(orders: Vec<Order>) -> (String, ServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = ServerState {
        orders: Arc::new(Mutex::new(orders)),
    };
    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/orders", get(handle_list_orders))
        .route("/orders/:id/status", patch(handle_update_order))
        .route("/quotes/:id/status", patch(handle_update_quote))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

#[test]
fn rejects_malformed_and_non_http_urls() {
    assert!(matches!(
        BakeryClient::new("not a url"),
        Err(ClientError::InvalidUrl { .. })
    ));
    assert!(matches!(
        BakeryClient::new("ftp://bakery.local"),
        Err(ClientError::UnsupportedScheme(scheme)) if scheme == "ftp"
    ));
}

#[test]
fn base_url_keeps_path_prefix() {
    let client = BakeryClient::new("https://bakery.local/api").expect("client");
    assert_eq!(client.base_url().as_str(), "https://bakery.local/api/");
    assert_eq!(
        client.endpoint("orders").expect("endpoint").as_str(),
        "https://bakery.local/api/orders"
    );
}

#[tokio::test]
async fn lists_orders_from_server() {
    let seeded = vec![
        order("pão francês", OrderStatus::Pending),
        order("sonhos", OrderStatus::Ready),
    ];
    let (url, _state) = spawn_bakery_server(seeded.clone()).await;
    let client = BakeryClient::new(&url).expect("client");

    client.health().await.expect("health");
    let orders = client.list_orders().await.expect("orders");
    assert_eq!(orders, seeded);
}

#[tokio::test]
async fn update_for_unknown_order_maps_api_error() {
    let (url, _state) = spawn_bakery_server(Vec::new()).await;
    let client = BakeryClient::new(&url).expect("client");

    let err = client
        .update_order_status(OrderId::generate(), OrderStatus::Ready)
        .await
        .expect_err("should fail");
    match err {
        ClientError::Api {
            status,
            code,
            message,
        } => {
            assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
            assert_eq!(code, Some(ErrorCode::NotFound));
            assert!(message.contains("not found"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn plain_text_error_body_has_no_code() {
    let (url, _state) = spawn_bakery_server(Vec::new()).await;
    let client = BakeryClient::new(&url).expect("client");

    let err = client
        .update_quote_status(QuoteId::generate(), QuoteStatus::Sent)
        .await
        .expect_err("should fail");
    match err {
        ClientError::Api { status, code, message } => {
            assert_eq!(status, reqwest::StatusCode::BAD_GATEWAY);
            assert_eq!(code, None);
            assert_eq!(message, "upstream unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn order_remote_reports_missing_order_as_none() {
    let (url, _state) = spawn_bakery_server(Vec::new()).await;
    let remote = OrderRemote::new(BakeryClient::new(&url).expect("client"));

    let change = remote
        .update_status(&OrderId::generate(), OrderStatus::Ready)
        .await
        .expect("not an error");
    assert!(change.is_none());
}

#[tokio::test]
async fn order_remote_surfaces_server_failures() {
    let target = order("brigadeiros", OrderStatus::Pending);
    let (url, _state) = spawn_bakery_server(vec![target.clone()]).await;
    let remote = OrderRemote::new(BakeryClient::new(&url).expect("client"));

    let err = remote
        .update_status(&target.id, OrderStatus::Cancelled)
        .await
        .expect_err("should fail");
    assert!(err.to_string().contains("failed to move order"));
}

#[tokio::test]
async fn quote_remote_surfaces_gateway_failures() {
    let (url, _state) = spawn_bakery_server(Vec::new()).await;
    let remote = QuoteRemote::new(BakeryClient::new(&url).expect("client"));

    let result = remote
        .update_status(&QuoteId::generate(), QuoteStatus::Approved)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn board_move_commits_through_http_remote() {
    let target = order("bolo de fubá", OrderStatus::Pending);
    let other = order("quindim", OrderStatus::Pending);
    let (url, state) = spawn_bakery_server(vec![target.clone(), other.clone()]).await;
    let remote = Arc::new(OrderRemote::new(BakeryClient::new(&url).expect("client")));
    let controller = BoardController::<Order>::new(remote);

    assert_eq!(controller.load().await.expect("load"), 2);
    let outcome = controller
        .set_status(&target.id, OrderStatus::Ready)
        .await
        .expect("move");
    assert_eq!(outcome, MoveOutcome::Committed);

    let partition = controller.partition().await;
    let ready: Vec<OrderId> = partition
        .items(OrderStatus::Ready)
        .iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(ready, vec![target.id]);
    assert_eq!(partition.items(OrderStatus::Pending).len(), 1);

    let stored = state.orders.lock().await;
    assert_eq!(stored[0].status, OrderStatus::Ready);
}

#[tokio::test]
async fn board_move_rolls_back_when_server_fails() {
    let target = order("empadas", OrderStatus::InProduction);
    let (url, _state) = spawn_bakery_server(vec![target.clone()]).await;
    let remote = Arc::new(OrderRemote::new(BakeryClient::new(&url).expect("client")));
    let controller = BoardController::<Order>::new(remote);
    controller.load().await.expect("load");
    let before = controller.partition().await;

    let outcome = controller
        .set_status(&target.id, OrderStatus::Cancelled)
        .await
        .expect("move");
    assert_eq!(outcome, MoveOutcome::RolledBack);
    assert_eq!(controller.partition().await, before);
}
