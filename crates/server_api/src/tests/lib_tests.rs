use super::*;

async fn setup() -> (ApiContext, Customer) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let ctx = ApiContext { storage };
    let customer = create_customer(
        &ctx,
        CreateCustomerRequest {
            name: "Dona Célia".into(),
            phone: None,
            email: None,
        },
    )
    .await
    .expect("customer");
    (ctx, customer)
}

fn order_for(customer_id: CustomerId, total_cents: i64) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id,
        description: "Torta de limão".into(),
        total_cents,
        delivery_date: None,
        status: None,
    }
}

#[tokio::test]
async fn blank_customer_name_is_rejected() {
    let (ctx, _) = setup().await;
    let err = create_customer(
        &ctx,
        CreateCustomerRequest {
            name: "   ".into(),
            phone: None,
            email: None,
        },
    )
    .await
    .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn order_for_unknown_customer_is_not_found() {
    let (ctx, _) = setup().await;
    let err = create_order(&ctx, order_for(CustomerId::generate(), 100))
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn negative_total_is_rejected() {
    let (ctx, customer) = setup().await;
    let err = create_order(&ctx, order_for(customer.id, -1))
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn status_update_confirms_new_status() {
    let (ctx, customer) = setup().await;
    let order = create_order(&ctx, order_for(customer.id, 4_000))
        .await
        .expect("order");

    let updated = update_order_status(&ctx, order.id, OrderStatus::InProduction)
        .await
        .expect("update");
    assert_eq!(
        updated,
        StatusUpdated {
            id: order.id,
            status: OrderStatus::InProduction
        }
    );
}

#[tokio::test]
async fn status_update_for_unknown_quote_is_not_found() {
    let (ctx, _) = setup().await;
    let err = update_quote_status(&ctx, QuoteId::generate(), QuoteStatus::Sent)
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn dashboard_lists_every_status_in_column_order() {
    let (ctx, customer) = setup().await;
    let delivered = create_order(&ctx, order_for(customer.id, 1_000))
        .await
        .expect("order");
    create_order(&ctx, order_for(customer.id, 2_500))
        .await
        .expect("order");
    update_order_status(&ctx, delivered.id, OrderStatus::Delivered)
        .await
        .expect("deliver");

    let summary = dashboard(&ctx).await.expect("dashboard");
    assert_eq!(summary.customers, 1);
    let order_statuses: Vec<OrderStatus> =
        summary.orders_by_status.iter().map(|c| c.status).collect();
    assert_eq!(order_statuses, OrderStatus::ALL.to_vec());
    let counts: Vec<u64> = summary.orders_by_status.iter().map(|c| c.count).collect();
    assert_eq!(counts, vec![1, 0, 0, 1, 0]);
    assert!(summary.quotes_by_status.iter().all(|c| c.count == 0));
    assert_eq!(summary.open_order_value_cents, 2_500);
}
