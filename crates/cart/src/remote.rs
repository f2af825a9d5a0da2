//! The server-authoritative cart, as seen from the client.

use std::{num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use mockall::automock;
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::ids::{CartOwner, ProductId};

/// Why a server cart call failed.
#[derive(Debug, Error)]
pub enum RemoteCartError {
    /// No answer within the engine's request timeout.
    #[error("request timed out")]
    Timeout,

    /// Transport failure or an undecodable body.
    #[error("request failed")]
    Http(#[from] reqwest::Error),

    /// The bearer token was missing, unknown or revoked.
    #[error("not authorised")]
    Unauthorized,

    /// The product is not in the catalog, or the line does not exist.
    #[error("cart, line or product not found")]
    NotFound,

    /// The server refused the change, for example for lack of stock. Holds
    /// the server's reason.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Any other non-success status.
    #[error("unexpected response status {0}")]
    UnexpectedStatus(u16),
}

/// One line as the server reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCartLine {
    /// Server line id.
    pub uuid: Uuid,
    /// Catalog product.
    pub product_uuid: Uuid,
    /// Units; never zero in a well-formed cart.
    pub quantity: u32,
    /// Price per unit snapshotted when the line was created, in minor units.
    pub unit_price: u64,
    /// `unit_price * quantity`.
    pub line_total: u64,
}

/// The server's view of a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCart {
    /// Lines in creation order.
    pub lines: Vec<RemoteCartLine>,
    /// Sum of quantities.
    pub item_count: u64,
    /// Sum of line totals, in minor units.
    pub total_amount: u64,
}

/// Operations offered by the server cart. The server creates a cart on first
/// contact for an owner, so callers never need to create one.
#[automock]
#[async_trait]
pub trait ServerCart: Send + Sync {
    /// Fetch the authoritative cart.
    async fn get_cart(&self, owner: CartOwner) -> Result<RemoteCart, RemoteCartError>;

    /// Add units, merging with an existing line for the product.
    async fn add_or_merge(
        &self,
        owner: CartOwner,
        product: ProductId,
        quantity: NonZeroU32,
    ) -> Result<(), RemoteCartError>;

    /// Set an absolute quantity. Zero removes the line.
    async fn set_quantity(
        &self,
        owner: CartOwner,
        product: ProductId,
        quantity: u32,
    ) -> Result<(), RemoteCartError>;

    /// Remove one line.
    async fn remove_line(&self, owner: CartOwner, product: ProductId)
    -> Result<(), RemoteCartError>;

    /// Remove every line.
    async fn clear(&self, owner: CartOwner) -> Result<(), RemoteCartError>;
}

/// The catalog fields the client needs to price a new line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogProduct {
    /// Catalog product id.
    pub uuid: Uuid,
    /// Display name.
    pub name: String,
    /// Current unit price, in minor units.
    pub price: u64,
    /// Units available.
    pub stock: u64,
}

#[derive(Debug, Serialize)]
struct CartLineRequest<'a> {
    product_uuid: Uuid,
    quantity: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    brief: String,
}

/// [`ServerCart`] over the storefront JSON API.
#[derive(Debug, Clone)]
pub struct HttpServerCart {
    base_url: String,
    client: Client,
}

impl HttpServerCart {
    /// A client for the API at `base_url`. Every request asks for JSON so
    /// that rejections carry a readable reason.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteCartError> {
        let mut headers = HeaderMap::new();

        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            client,
        })
    }

    /// Read one product from the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCartError::NotFound`] for unknown products, or any
    /// transport error.
    pub async fn get_product(&self, product: ProductId) -> Result<CatalogProduct, RemoteCartError> {
        let response = self
            .client
            .get(format!("{}/products/{product}", self.base_url))
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    fn cart_url(&self) -> String {
        format!("{}/cart", self.base_url)
    }

    fn authorise(request: RequestBuilder, owner: &CartOwner) -> RequestBuilder {
        match owner {
            CartOwner::Session(_) => request,
            CartOwner::User(token) => request.bearer_auth(token.expose()),
        }
    }

    fn session_query(owner: &CartOwner) -> Vec<(&'static str, String)> {
        match owner {
            CartOwner::Session(session) => vec![("session_id", session.to_string())],
            CartOwner::User(_) => Vec::new(),
        }
    }

    fn session_field(owner: &CartOwner) -> Option<&str> {
        match owner {
            CartOwner::Session(session) => Some(session.as_str()),
            CartOwner::User(_) => None,
        }
    }

    async fn send_line(
        &self,
        request: RequestBuilder,
        owner: &CartOwner,
        product: ProductId,
        quantity: u32,
    ) -> Result<(), RemoteCartError> {
        let body = CartLineRequest {
            product_uuid: product.into_uuid(),
            quantity,
            session_id: Self::session_field(owner),
        };

        let response = Self::authorise(request, owner).json(&body).send().await?;

        check_status(response).await.map(drop)
    }
}

async fn check_status(response: Response) -> Result<Response, RemoteCartError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(RemoteCartError::Unauthorized),
        StatusCode::NOT_FOUND => Err(RemoteCartError::NotFound),
        StatusCode::BAD_REQUEST => {
            let brief = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error.brief)
                .unwrap_or_default();

            Err(RemoteCartError::Rejected(brief))
        }
        other => Err(RemoteCartError::UnexpectedStatus(other.as_u16())),
    }
}

#[async_trait]
impl ServerCart for HttpServerCart {
    async fn get_cart(&self, owner: CartOwner) -> Result<RemoteCart, RemoteCartError> {
        let request = self
            .client
            .get(self.cart_url())
            .query(&Self::session_query(&owner));

        let response = check_status(Self::authorise(request, &owner).send().await?).await?;

        Ok(response.json().await?)
    }

    async fn add_or_merge(
        &self,
        owner: CartOwner,
        product: ProductId,
        quantity: NonZeroU32,
    ) -> Result<(), RemoteCartError> {
        self.send_line(self.client.post(self.cart_url()), &owner, product, quantity.get())
            .await
    }

    async fn set_quantity(
        &self,
        owner: CartOwner,
        product: ProductId,
        quantity: u32,
    ) -> Result<(), RemoteCartError> {
        self.send_line(self.client.put(self.cart_url()), &owner, product, quantity)
            .await
    }

    async fn remove_line(
        &self,
        owner: CartOwner,
        product: ProductId,
    ) -> Result<(), RemoteCartError> {
        let mut query = Self::session_query(&owner);

        query.push(("product_uuid", product.to_string()));

        let request = self.client.delete(self.cart_url()).query(&query);

        check_status(Self::authorise(request, &owner).send().await?)
            .await
            .map(drop)
    }

    async fn clear(&self, owner: CartOwner) -> Result<(), RemoteCartError> {
        let request = self
            .client
            .delete(self.cart_url())
            .query(&Self::session_query(&owner));

        check_status(Self::authorise(request, &owner).send().await?)
            .await
            .map(drop)
    }
}
