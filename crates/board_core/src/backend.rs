use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use url::Url;

use shared::{
    domain::{Order, OrderAttachment, OrderComment, OrderId, ProductionStatus},
    error::{ApiError, ApiException, ErrorCode},
    protocol::{AddAttachmentRequest, AddCommentRequest, ConfirmOrderRequest, UpdateStatusRequest},
};

pub type BackendResult<T> = Result<T, ApiException>;

/// Remote operations the board consumes. The hosted backend owns the data;
/// the board only states its expectations of each call here.
#[async_trait]
pub trait OrdersBackend: Send + Sync {
    async fn fetch_orders(&self) -> BackendResult<Vec<Order>>;

    async fn update_status(
        &self,
        order_id: OrderId,
        status: ProductionStatus,
        notes: Option<&str>,
    ) -> BackendResult<()>;

    async fn confirm_order(
        &self,
        order_id: OrderId,
        delivery_date: NaiveDate,
        notes: Option<&str>,
    ) -> BackendResult<()>;

    async fn add_comment(
        &self,
        order_id: OrderId,
        text: &str,
        author_name: &str,
    ) -> BackendResult<OrderComment>;

    async fn add_attachment(
        &self,
        order_id: OrderId,
        file_name: &str,
        file_url: &str,
    ) -> BackendResult<OrderAttachment>;
}

pub struct MissingOrdersBackend;

impl MissingOrdersBackend {
    fn unavailable() -> ApiException {
        ApiException::new(ErrorCode::Internal, "orders backend is unavailable")
    }
}

#[async_trait]
impl OrdersBackend for MissingOrdersBackend {
    async fn fetch_orders(&self) -> BackendResult<Vec<Order>> {
        Err(Self::unavailable())
    }

    async fn update_status(
        &self,
        _order_id: OrderId,
        _status: ProductionStatus,
        _notes: Option<&str>,
    ) -> BackendResult<()> {
        Err(Self::unavailable())
    }

    async fn confirm_order(
        &self,
        _order_id: OrderId,
        _delivery_date: NaiveDate,
        _notes: Option<&str>,
    ) -> BackendResult<()> {
        Err(Self::unavailable())
    }

    async fn add_comment(
        &self,
        _order_id: OrderId,
        _text: &str,
        _author_name: &str,
    ) -> BackendResult<OrderComment> {
        Err(Self::unavailable())
    }

    async fn add_attachment(
        &self,
        _order_id: OrderId,
        _file_name: &str,
        _file_url: &str,
    ) -> BackendResult<OrderAttachment> {
        Err(Self::unavailable())
    }
}

/// `OrdersBackend` against the hosted REST surface.
pub struct HttpOrdersBackend {
    http: Client,
    server_url: String,
}

impl HttpOrdersBackend {
    pub fn new(server_url: &Url) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    fn transport_error(action: &str, err: &reqwest::Error) -> ApiException {
        ApiException::new(ErrorCode::Internal, format!("{action} failed: {err}"))
    }

    fn payload_error(action: &str, err: &reqwest::Error) -> ApiException {
        ApiException::new(
            ErrorCode::Internal,
            format!("invalid response payload for {action}: {err}"),
        )
    }

    async fn check(action: &str, response: reqwest::Response) -> BackendResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|err| err.message)
            .unwrap_or_else(|_| {
                if body.is_empty() {
                    format!("{action} failed with status {status}")
                } else {
                    body
                }
            });
        Err(ApiException::from_status(status.as_u16(), message))
    }
}

#[async_trait]
impl OrdersBackend for HttpOrdersBackend {
    async fn fetch_orders(&self) -> BackendResult<Vec<Order>> {
        let response = self
            .http
            .get(format!("{}/orders", self.server_url))
            .send()
            .await
            .map_err(|err| Self::transport_error("fetch orders", &err))?;
        Self::check("fetch orders", response)
            .await?
            .json()
            .await
            .map_err(|err| Self::payload_error("fetch orders", &err))
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        status: ProductionStatus,
        notes: Option<&str>,
    ) -> BackendResult<()> {
        let response = self
            .http
            .post(format!("{}/orders/{order_id}/status", self.server_url))
            .json(&UpdateStatusRequest {
                status,
                notes: notes.map(str::to_string),
            })
            .send()
            .await
            .map_err(|err| Self::transport_error("update status", &err))?;
        Self::check("update status", response).await?;
        Ok(())
    }

    async fn confirm_order(
        &self,
        order_id: OrderId,
        delivery_date: NaiveDate,
        notes: Option<&str>,
    ) -> BackendResult<()> {
        let response = self
            .http
            .post(format!("{}/orders/{order_id}/confirm", self.server_url))
            .json(&ConfirmOrderRequest {
                delivery_date,
                notes: notes.map(str::to_string),
            })
            .send()
            .await
            .map_err(|err| Self::transport_error("confirm order", &err))?;
        Self::check("confirm order", response).await?;
        Ok(())
    }

    async fn add_comment(
        &self,
        order_id: OrderId,
        text: &str,
        author_name: &str,
    ) -> BackendResult<OrderComment> {
        let response = self
            .http
            .post(format!("{}/orders/{order_id}/comments", self.server_url))
            .json(&AddCommentRequest {
                text: text.to_string(),
                author_name: author_name.to_string(),
            })
            .send()
            .await
            .map_err(|err| Self::transport_error("add comment", &err))?;
        Self::check("add comment", response)
            .await?
            .json()
            .await
            .map_err(|err| Self::payload_error("add comment", &err))
    }

    async fn add_attachment(
        &self,
        order_id: OrderId,
        file_name: &str,
        file_url: &str,
    ) -> BackendResult<OrderAttachment> {
        let response = self
            .http
            .post(format!("{}/orders/{order_id}/attachments", self.server_url))
            .json(&AddAttachmentRequest {
                file_name: file_name.to_string(),
                file_url: file_url.to_string(),
            })
            .send()
            .await
            .map_err(|err| Self::transport_error("add attachment", &err))?;
        Self::check("add attachment", response)
            .await?
            .json()
            .await
            .map_err(|err| Self::payload_error("add attachment", &err))
    }
}
