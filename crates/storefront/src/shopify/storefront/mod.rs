//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` request bodies with `reqwest` 0.13 for HTTP.
//! Every call goes through the retry policy; shop localization is cached
//! using `moka` (5-minute TTL).

mod cache;
mod conversions;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, QueryBody, Response};
use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::retry::{self, OperationKind, RetryPolicy};
use crate::shopify::types::{Cart, CartLineInput, CartLineUpdateInput, ShopLocalization};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use cache::{CacheValue, LOCALIZATION_KEY};
use conversions::{cart_from_payload, convert_cart, convert_localization};
use queries::{
    AddLinesVariables, AddToCart, BuyerIdentityVars, CartIdVariables, CartInputVars,
    CartLineUpdateVars, CartLineVars, CreateCart, CreateCartVariables, DiscountCodesVariables,
    GetCart, GetShopLocalization, NoVariables, RemoveFromCart, RemoveLinesVariables,
    UpdateCartDiscountCodes, UpdateCartLines, UpdateLinesVariables,
};

/// Longest response body excerpt kept in errors and logs.
const BODY_EXCERPT: usize = 500;

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Cheap to clone; all clones share one HTTP client and cache.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    cache: Cache<String, CacheValue>,
    retry: RetryPolicy,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig, retry: RetryPolicy) -> Self {
        let endpoint = format!(
            "https://{}/api/{}/graphql.json",
            config.store, config.api_version
        );

        Self::with_endpoint(
            endpoint,
            config.storefront_private_token.expose_secret(),
            retry,
        )
    }

    /// Create a client against an explicit GraphQL endpoint.
    #[must_use]
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        access_token: &str,
        retry: RetryPolicy,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: endpoint.into(),
                access_token: access_token.to_string(),
                cache,
                retry,
            }),
        }
    }

    /// Retry policy this client runs under.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.retry
    }

    /// Execute a GraphQL operation under the retry policy for `kind`.
    async fn execute<Q: GraphQLQuery>(
        &self,
        kind: OperationKind,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError>
    where
        Q::Variables: Serialize,
        Q::ResponseData: DeserializeOwned,
    {
        let body = Q::build_query(variables);
        retry::run(&self.inner.retry, kind, body.operation_name, || {
            self.send::<Q>(&body)
        })
        .await
    }

    /// Send one request and interpret the response.
    async fn send<Q: GraphQLQuery>(
        &self,
        body: &QueryBody<Q::Variables>,
    ) -> Result<Q::ResponseData, ShopifyError>
    where
        Q::Variables: Serialize,
        Q::ResponseData: DeserializeOwned,
    {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header(
                "Shopify-Storefront-Private-Token",
                &self.inner.access_token,
            )
            .json(body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body: response_text.chars().take(BODY_EXCERPT).collect(),
            });
        }

        let response: Response<Q::ResponseData> =
            serde_json::from_str(&response_text).inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(BODY_EXCERPT).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
            })?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            ShopifyError::EmptyResponse(format!("{} returned no data", body.operation_name))
        })
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Create a new cart, optionally bound to a signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self, lines, customer_access_token))]
    pub async fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
        customer_access_token: Option<&str>,
    ) -> Result<Cart, ShopifyError> {
        let variables = CreateCartVariables {
            input: CartInputVars {
                lines: lines.into_iter().map(line_vars).collect(),
                buyer_identity: customer_access_token.map(|token| BuyerIdentityVars {
                    customer_access_token: token.to_string(),
                }),
            },
        };

        let data = self
            .execute::<CreateCart>(OperationKind::Write, variables)
            .await?;
        cart_from_payload(data.cart_create, "cartCreate")
    }

    /// Get an existing cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the cart has expired or never existed.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &str) -> Result<Cart, ShopifyError> {
        let variables = CartIdVariables {
            cart_id: cart_id.to_string(),
        };

        let data = self
            .execute::<GetCart>(OperationKind::Read, variables)
            .await?;

        data.cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_to_cart(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = AddLinesVariables {
            cart_id: cart_id.to_string(),
            lines: lines.into_iter().map(line_vars).collect(),
        };

        let data = self
            .execute::<AddToCart>(OperationKind::Write, variables)
            .await?;
        cart_from_payload(data.cart_lines_add, "cartLinesAdd")
    }

    /// Update cart line quantities.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_cart(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = UpdateLinesVariables {
            cart_id: cart_id.to_string(),
            lines: lines
                .into_iter()
                .map(|line| CartLineUpdateVars {
                    id: line.id,
                    quantity: i64::from(line.quantity),
                })
                .collect(),
        };

        let data = self
            .execute::<UpdateCartLines>(OperationKind::Write, variables)
            .await?;
        cart_from_payload(data.cart_lines_update, "cartLinesUpdate")
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_from_cart(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let variables = RemoveLinesVariables {
            cart_id: cart_id.to_string(),
            line_ids,
        };

        let data = self
            .execute::<RemoveFromCart>(OperationKind::Write, variables)
            .await?;
        cart_from_payload(data.cart_lines_remove, "cartLinesRemove")
    }

    /// Replace the discount codes on a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, discount_codes), fields(cart_id = %cart_id))]
    pub async fn update_discount_codes(
        &self,
        cart_id: &str,
        discount_codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let variables = DiscountCodesVariables {
            cart_id: cart_id.to_string(),
            discount_codes,
        };

        let data = self
            .execute::<UpdateCartDiscountCodes>(OperationKind::Write, variables)
            .await?;
        cart_from_payload(data.cart_discount_codes_update, "cartDiscountCodesUpdate")
    }

    // =========================================================================
    // Localization
    // =========================================================================

    /// Currencies the shop sells in.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn shop_localization(&self) -> Result<ShopLocalization, ShopifyError> {
        if let Some(CacheValue::Localization(localization)) =
            self.inner.cache.get(LOCALIZATION_KEY).await
        {
            debug!("Cache hit for shop localization");
            return Ok(*localization);
        }

        let data = self
            .execute::<GetShopLocalization>(OperationKind::Read, NoVariables {})
            .await?;
        let localization = convert_localization(data.localization);

        self.inner
            .cache
            .insert(
                LOCALIZATION_KEY.to_string(),
                CacheValue::Localization(Box::new(localization.clone())),
            )
            .await;

        Ok(localization)
    }
}

fn line_vars(line: CartLineInput) -> CartLineVars {
    CartLineVars {
        merchandise_id: line.merchandise_id,
        quantity: i64::from(line.quantity),
    }
}

fn convert_graphql_error(e: graphql_client::Error) -> GraphQLError {
    let code = e
        .extensions
        .as_ref()
        .and_then(|ext| ext.get("code"))
        .and_then(serde_json::Value::as_str)
        .map(String::from);

    GraphQLError {
        message: e.message,
        code,
        locations: e.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: e.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                    graphql_client::PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
    }
}
