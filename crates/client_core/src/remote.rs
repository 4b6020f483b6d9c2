//! Board backends for orders and quotes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use board::{StatusChange, StatusRemote};
use shared::domain::{Order, OrderId, OrderStatus, Quote, QuoteId, QuoteStatus};
use tracing::debug;

use crate::BakeryClient;

pub struct OrderRemote {
    client: BakeryClient,
}

impl OrderRemote {
    pub fn new(client: BakeryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusRemote<Order> for OrderRemote {
    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Option<StatusChange<Order>>> {
        match self.client.update_order_status(*id, status).await {
            Ok(updated) => Ok(Some(StatusChange {
                id: updated.id,
                status: updated.status,
            })),
            Err(err) if err.is_not_found() => {
                debug!(order_id = %id, "server does not know this order");
                Ok(None)
            }
            Err(err) => Err(err).with_context(|| format!("failed to move order {id} to {status}")),
        }
    }

    async fn list(&self) -> Result<Vec<Order>> {
        self.client.list_orders().await.context("failed to list orders")
    }
}

pub struct QuoteRemote {
    client: BakeryClient,
}

impl QuoteRemote {
    pub fn new(client: BakeryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusRemote<Quote> for QuoteRemote {
    async fn update_status(
        &self,
        id: &QuoteId,
        status: QuoteStatus,
    ) -> Result<Option<StatusChange<Quote>>> {
        match self.client.update_quote_status(*id, status).await {
            Ok(updated) => Ok(Some(StatusChange {
                id: updated.id,
                status: updated.status,
            })),
            Err(err) if err.is_not_found() => {
                debug!(quote_id = %id, "server does not know this quote");
                Ok(None)
            }
            Err(err) => Err(err).with_context(|| format!("failed to move quote {id} to {status}")),
        }
    }

    async fn list(&self) -> Result<Vec<Quote>> {
        self.client.list_quotes().await.context("failed to list quotes")
    }
}
