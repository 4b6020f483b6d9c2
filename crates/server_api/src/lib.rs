use shared::{
    domain::{Customer, CustomerId, Order, OrderId, OrderStatus, Quote, QuoteId, QuoteStatus},
    error::{ApiError, ErrorCode},
    protocol::{
        CreateCustomerRequest, CreateOrderRequest, CreateQuoteRequest, DashboardSummary,
        StatusCount, StatusUpdated,
    },
};
use storage::Storage;
use tracing::info;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_customers(ctx: &ApiContext) -> Result<Vec<Customer>, ApiError> {
    ctx.storage.list_customers().await.map_err(internal)
}

pub async fn create_customer(
    ctx: &ApiContext,
    req: CreateCustomerRequest,
) -> Result<Customer, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("customer name must not be empty"));
    }
    let customer = ctx.storage.create_customer(&req).await.map_err(internal)?;
    info!(customer_id = %customer.id, "api: customer created");
    Ok(customer)
}

pub async fn list_orders(ctx: &ApiContext) -> Result<Vec<Order>, ApiError> {
    ctx.storage.list_orders().await.map_err(internal)
}

pub async fn create_order(ctx: &ApiContext, req: CreateOrderRequest) -> Result<Order, ApiError> {
    validate_line(&req.description, req.total_cents)?;
    ensure_customer(ctx, req.customer_id).await?;
    let order = ctx.storage.create_order(&req).await.map_err(internal)?;
    info!(order_id = %order.id, status = %order.status, "api: order created");
    Ok(order)
}

pub async fn update_order_status(
    ctx: &ApiContext,
    id: OrderId,
    status: OrderStatus,
) -> Result<StatusUpdated<OrderId, OrderStatus>, ApiError> {
    let (id, status) = ctx
        .storage
        .update_order_status(id, status)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("order", id))?;
    info!(order_id = %id, %status, "api: order status changed");
    Ok(StatusUpdated { id, status })
}

pub async fn list_quotes(ctx: &ApiContext) -> Result<Vec<Quote>, ApiError> {
    ctx.storage.list_quotes().await.map_err(internal)
}

pub async fn create_quote(ctx: &ApiContext, req: CreateQuoteRequest) -> Result<Quote, ApiError> {
    validate_line(&req.description, req.total_cents)?;
    ensure_customer(ctx, req.customer_id).await?;
    let quote = ctx.storage.create_quote(&req).await.map_err(internal)?;
    info!(quote_id = %quote.id, status = %quote.status, "api: quote created");
    Ok(quote)
}

pub async fn update_quote_status(
    ctx: &ApiContext,
    id: QuoteId,
    status: QuoteStatus,
) -> Result<StatusUpdated<QuoteId, QuoteStatus>, ApiError> {
    let (id, status) = ctx
        .storage
        .update_quote_status(id, status)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("quote", id))?;
    info!(quote_id = %id, %status, "api: quote status changed");
    Ok(StatusUpdated { id, status })
}

/// Counts per status in board column order, zero-filled.
pub async fn dashboard(ctx: &ApiContext) -> Result<DashboardSummary, ApiError> {
    let customers = ctx.storage.count_customers().await.map_err(internal)?;
    let order_counts = ctx.storage.order_status_counts().await.map_err(internal)?;
    let quote_counts = ctx.storage.quote_status_counts().await.map_err(internal)?;
    let open_order_value_cents = ctx
        .storage
        .open_order_value_cents()
        .await
        .map_err(internal)?;

    Ok(DashboardSummary {
        customers,
        orders_by_status: zero_filled(OrderStatus::ALL, &order_counts),
        quotes_by_status: zero_filled(QuoteStatus::ALL, &quote_counts),
        open_order_value_cents,
    })
}

fn zero_filled<S: Copy + PartialEq>(all: &[S], counts: &[(S, u64)]) -> Vec<StatusCount<S>> {
    all.iter()
        .map(|status| StatusCount {
            status: *status,
            count: counts
                .iter()
                .find(|(s, _)| s == status)
                .map(|(_, count)| *count)
                .unwrap_or(0),
        })
        .collect()
}

fn validate_line(description: &str, total_cents: i64) -> Result<(), ApiError> {
    if description.trim().is_empty() {
        return Err(ApiError::validation("description must not be empty"));
    }
    if total_cents < 0 {
        return Err(ApiError::validation("total must not be negative"));
    }
    Ok(())
}

async fn ensure_customer(ctx: &ApiContext, customer_id: CustomerId) -> Result<(), ApiError> {
    ctx.storage
        .customer(customer_id)
        .await
        .map_err(internal)?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("customer", customer_id))
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
