//! HTTP client for the bakery server.

use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Customer, Order, OrderId, OrderStatus, Quote, QuoteId, QuoteStatus},
    error::ApiError,
    protocol::{
        CreateCustomerRequest, CreateOrderRequest, CreateQuoteRequest, DashboardSummary,
        StatusUpdated, UpdateStatusRequest,
    },
};
use tracing::debug;
use url::Url;

pub mod error;
pub mod remote;

pub use error::ClientError;
pub use remote::{OrderRemote, QuoteRemote};

#[derive(Clone)]
pub struct BakeryClient {
    http: Client,
    base: Url,
}

impl BakeryClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_http(server_url, Client::new())
    }

    pub fn with_http(server_url: &str, http: Client) -> Result<Self, ClientError> {
        let mut base = Url::parse(server_url.trim()).map_err(|source| ClientError::InvalidUrl {
            url: server_url.to_string(),
            source,
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::UnsupportedScheme(base.scheme().to_string()));
        }
        // Relative joins replace the last segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub async fn health(&self) -> Result<(), ClientError> {
        let res = self.http.get(self.endpoint("healthz")?).send().await?;
        check(res).await.map(|_| ())
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>, ClientError> {
        self.get_json("customers").await
    }

    pub async fn create_customer(&self, req: &CreateCustomerRequest) -> Result<Customer, ClientError> {
        self.send_json(reqwest::Method::POST, "customers", req).await
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, ClientError> {
        self.get_json("orders").await
    }

    pub async fn create_order(&self, req: &CreateOrderRequest) -> Result<Order, ClientError> {
        self.send_json(reqwest::Method::POST, "orders", req).await
    }

    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<StatusUpdated<OrderId, OrderStatus>, ClientError> {
        self.send_json(
            reqwest::Method::PATCH,
            &format!("orders/{id}/status"),
            &UpdateStatusRequest { status },
        )
        .await
    }

    pub async fn list_quotes(&self) -> Result<Vec<Quote>, ClientError> {
        self.get_json("quotes").await
    }

    pub async fn create_quote(&self, req: &CreateQuoteRequest) -> Result<Quote, ClientError> {
        self.send_json(reqwest::Method::POST, "quotes", req).await
    }

    pub async fn update_quote_status(
        &self,
        id: QuoteId,
        status: QuoteStatus,
    ) -> Result<StatusUpdated<QuoteId, QuoteStatus>, ClientError> {
        self.send_json(
            reqwest::Method::PATCH,
            &format!("quotes/{id}/status"),
            &UpdateStatusRequest { status },
        )
        .await
    }

    pub async fn dashboard(&self) -> Result<DashboardSummary, ClientError> {
        self.get_json("dashboard").await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base.join(path).map_err(|source| ClientError::InvalidUrl {
            url: format!("{}{path}", self.base),
            source,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let res = self.http.get(url).send().await?;
        Ok(check(res).await?.json().await?)
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "sending");
        let res = self.http.request(method, url).json(body).send().await?;
        Ok(check(res).await?.json().await?)
    }
}

/// Passes successful responses through and turns the rest into `ClientError::Api`.
async fn check(res: Response) -> Result<Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ApiError>(&body) {
        Ok(err) => (Some(err.code), err.message),
        Err(_) if body.trim().is_empty() => (None, status.to_string()),
        Err(_) => (None, body),
    };
    Err(ClientError::Api {
        status,
        code,
        message,
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
