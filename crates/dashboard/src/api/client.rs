//! HTTP implementation of [`OrderingApi`] on top of `reqwest`.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, de::DeserializeOwned};
use slooze_core::{BearerToken, OrderId, RestaurantId};
use tracing::{debug, instrument, warn};
use url::Url;

use super::types::{
    CreateOrderRequest, Credentials, LoginRequest, LoginResponse, Order, Restaurant,
    RestaurantMenu,
};
use super::{ApiError, OrderingApi};

/// Error body returned by the backend on non-success responses.
///
/// `message` is a string for most errors and a list of strings for
/// validation failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<ErrorMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

/// Ordering backend client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpApi {
    /// Create a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(mut base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        // Relative joins replace the last path segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &BearerToken,
        path: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.endpoint(path)?)
            .bearer_auth(token.expose())
            .send()
            .await?;

        Ok(expect_success(response).await?.json().await?)
    }

    async fn post_action(&self, token: &BearerToken, path: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint(path)?)
            .bearer_auth(token.expose())
            .send()
            .await?;

        expect_success(response).await?;
        Ok(())
    }
}

/// Pass 2xx responses through, turn anything else into an [`ApiError`].
async fn expect_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    warn!(status = status.as_u16(), message = %message, "Backend rejected request");

    Err(ApiError::from_status(status, message))
}

fn error_message(status: StatusCode, body: &str) -> String {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();

    match parsed {
        Some(ErrorBody {
            message: Some(ErrorMessage::One(message)),
            ..
        }) => message,
        Some(ErrorBody {
            message: Some(ErrorMessage::Many(messages)),
            ..
        }) if !messages.is_empty() => messages.join("; "),
        Some(ErrorBody {
            error: Some(error), ..
        }) => error,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    }
}

impl OrderingApi for HttpApi {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest {
            email: credentials.email.as_str(),
            password: credentials.password.expose_secret(),
        };

        let response = self
            .client
            .post(self.endpoint("auth/login")?)
            .json(&body)
            .send()
            .await?;

        let login: LoginResponse = expect_success(response).await?.json().await?;
        debug!(role = %login.user.role, "Login accepted");
        Ok(login)
    }

    #[instrument(skip(self, token))]
    async fn restaurants(&self, token: &BearerToken) -> Result<Vec<Restaurant>, ApiError> {
        self.get_json(token, "restaurants").await
    }

    #[instrument(skip(self, token), fields(restaurant_id = %id))]
    async fn restaurant(
        &self,
        token: &BearerToken,
        id: RestaurantId,
    ) -> Result<RestaurantMenu, ApiError> {
        self.get_json(token, &format!("restaurants/{id}")).await
    }

    #[instrument(skip(self, token))]
    async fn orders(&self, token: &BearerToken) -> Result<Vec<Order>, ApiError> {
        self.get_json(token, "orders").await
    }

    #[instrument(skip(self, token, request), fields(lines = request.items.len()))]
    async fn create_order(
        &self,
        token: &BearerToken,
        request: &CreateOrderRequest,
    ) -> Result<Order, ApiError> {
        let response = self
            .client
            .post(self.endpoint("orders")?)
            .bearer_auth(token.expose())
            .json(request)
            .send()
            .await?;

        let order: Order = expect_success(response).await?.json().await?;
        debug!(order_id = %order.id, total = %order.total_amount, "Order created");
        Ok(order)
    }

    #[instrument(skip(self, token), fields(order_id = %id))]
    async fn pay_order(&self, token: &BearerToken, id: OrderId) -> Result<(), ApiError> {
        self.post_action(token, &format!("orders/{id}/pay")).await
    }

    #[instrument(skip(self, token), fields(order_id = %id))]
    async fn cancel_order(&self, token: &BearerToken, id: OrderId) -> Result<(), ApiError> {
        self.post_action(token, &format!("orders/{id}/cancel")).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpApi {
        HttpApi::new(Url::parse(base).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = api("http://localhost:4000/api");
        assert_eq!(api.base_url().as_str(), "http://localhost:4000/api/");
        assert_eq!(
            api.endpoint("orders/3/pay").unwrap().as_str(),
            "http://localhost:4000/api/orders/3/pay"
        );
    }

    #[test]
    fn test_endpoint_at_root() {
        let api = api("http://localhost:4000");
        assert_eq!(
            api.endpoint("auth/login").unwrap().as_str(),
            "http://localhost:4000/auth/login"
        );
    }

    #[test]
    fn test_error_message_variants() {
        assert_eq!(
            error_message(
                StatusCode::FORBIDDEN,
                r#"{"statusCode":403,"message":"Forbidden resource","error":"Forbidden"}"#
            ),
            "Forbidden resource"
        );
        assert_eq!(
            error_message(
                StatusCode::BAD_REQUEST,
                r#"{"message":["items must not be empty","quantity must be positive"]}"#
            ),
            "items must not be empty; quantity must be positive"
        );
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, r#"{"error":"Not Found"}"#),
            "Not Found"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down\n"), "upstream down");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
    }
}
