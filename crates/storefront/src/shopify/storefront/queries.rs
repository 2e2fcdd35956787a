//! GraphQL operation definitions for the Shopify Storefront API.
//!
//! Each operation is a unit struct implementing `graphql_client::GraphQLQuery`
//! with hand-written variables and response types, so only the fields the
//! storefront reads are requested and deserialized.

use graphql_client::{GraphQLQuery, QueryBody};
use harbor_core::{CurrencyCode, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fields selected on every cart returned by a query or mutation.
macro_rules! cart_fragment {
    () => {
        r"
fragment CartFields on Cart {
  id
  checkoutUrl
  totalQuantity
  note
  updatedAt
  cost {
    subtotalAmount { amount currencyCode }
    totalAmount { amount currencyCode }
    totalTaxAmount { amount currencyCode }
  }
  discountCodes { code applicable }
  lines(first: 100) {
    edges {
      node {
        id
        quantity
        cost {
          amountPerQuantity { amount currencyCode }
          totalAmount { amount currencyCode }
        }
        merchandise {
          ... on ProductVariant {
            id
            title
            image { url altText }
            product { id handle title }
          }
        }
      }
    }
  }
}
"
    };
}

/// Declare an operation type and its `GraphQLQuery` impl.
macro_rules! operation {
    ($name:ident, $vars:ty, $data:ty, $query:expr) => {
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $vars;
            type ResponseData = $data;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $query,
                    operation_name: stringify!($name),
                }
            }
        }
    };
}

// =============================================================================
// Shared Wire Types
// =============================================================================

/// `MoneyV2` as returned by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency_code: CurrencyCode,
}

impl From<MoneyV2> for Money {
    fn from(m: MoneyV2) -> Self {
        Self::new(m.amount, m.currency_code)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFields {
    pub url: String,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductRef {
    pub id: String,
    pub handle: String,
    pub title: String,
}

/// Merchandise union; fields are absent for non-variant merchandise.
#[derive(Debug, Clone, Deserialize)]
pub struct MerchandiseFields {
    pub id: Option<String>,
    pub title: Option<String>,
    pub image: Option<ImageFields>,
    pub product: Option<ProductRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCostFields {
    pub amount_per_quantity: MoneyV2,
    pub total_amount: MoneyV2,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineFields {
    pub id: String,
    pub quantity: i64,
    pub cost: LineCostFields,
    pub merchandise: MerchandiseFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostFields {
    pub subtotal_amount: MoneyV2,
    pub total_amount: MoneyV2,
    pub total_tax_amount: Option<MoneyV2>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscountCodeFields {
    pub code: String,
    pub applicable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFields {
    pub id: String,
    pub checkout_url: String,
    pub total_quantity: i64,
    pub note: Option<String>,
    pub updated_at: Option<String>,
    pub cost: CartCostFields,
    pub discount_codes: Vec<DiscountCodeFields>,
    pub lines: Connection<LineFields>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserErrorFields {
    pub field: Option<Vec<String>>,
    pub message: String,
    pub code: Option<String>,
}

/// Payload shared by every cart mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    pub cart: Option<CartFields>,
    pub user_errors: Vec<UserErrorFields>,
}

// =============================================================================
// Variables
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineVars {
    pub merchandise_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineUpdateVars {
    pub id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerIdentityVars {
    pub customer_access_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartInputVars {
    pub lines: Vec<CartLineVars>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_identity: Option<BuyerIdentityVars>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCartVariables {
    pub input: CartInputVars,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartIdVariables {
    pub cart_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLinesVariables {
    pub cart_id: String,
    pub lines: Vec<CartLineVars>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinesVariables {
    pub cart_id: String,
    pub lines: Vec<CartLineUpdateVars>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLinesVariables {
    pub cart_id: String,
    pub line_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCodesVariables {
    pub cart_id: String,
    pub discount_codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoVariables {}

// =============================================================================
// Response Data
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCartData {
    pub cart_create: Option<CartPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetCartData {
    pub cart: Option<CartFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartData {
    pub cart_lines_add: Option<CartPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartLinesData {
    pub cart_lines_update: Option<CartPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartData {
    pub cart_lines_remove: Option<CartPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDiscountCodesData {
    pub cart_discount_codes_update: Option<CartPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyFields {
    pub iso_code: CurrencyCode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryFields {
    pub iso_code: String,
    pub currency: CurrencyFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizationFields {
    pub country: CountryFields,
    pub available_countries: Vec<CountryFields>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopLocalizationData {
    pub localization: LocalizationFields,
}

// =============================================================================
// Operations
// =============================================================================

operation!(
    CreateCart,
    CreateCartVariables,
    CreateCartData,
    concat!(
        "mutation CreateCart($input: CartInput!) {\n",
        "  cartCreate(input: $input) {\n",
        "    cart { ...CartFields }\n",
        "    userErrors { field message code }\n",
        "  }\n",
        "}\n",
        cart_fragment!()
    )
);

operation!(
    GetCart,
    CartIdVariables,
    GetCartData,
    concat!(
        "query GetCart($cartId: ID!) {\n",
        "  cart(id: $cartId) { ...CartFields }\n",
        "}\n",
        cart_fragment!()
    )
);

operation!(
    AddToCart,
    AddLinesVariables,
    AddToCartData,
    concat!(
        "mutation AddToCart($cartId: ID!, $lines: [CartLineInput!]!) {\n",
        "  cartLinesAdd(cartId: $cartId, lines: $lines) {\n",
        "    cart { ...CartFields }\n",
        "    userErrors { field message code }\n",
        "  }\n",
        "}\n",
        cart_fragment!()
    )
);

operation!(
    UpdateCartLines,
    UpdateLinesVariables,
    UpdateCartLinesData,
    concat!(
        "mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) {\n",
        "  cartLinesUpdate(cartId: $cartId, lines: $lines) {\n",
        "    cart { ...CartFields }\n",
        "    userErrors { field message code }\n",
        "  }\n",
        "}\n",
        cart_fragment!()
    )
);

operation!(
    RemoveFromCart,
    RemoveLinesVariables,
    RemoveFromCartData,
    concat!(
        "mutation RemoveFromCart($cartId: ID!, $lineIds: [ID!]!) {\n",
        "  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {\n",
        "    cart { ...CartFields }\n",
        "    userErrors { field message code }\n",
        "  }\n",
        "}\n",
        cart_fragment!()
    )
);

operation!(
    UpdateCartDiscountCodes,
    DiscountCodesVariables,
    UpdateDiscountCodesData,
    concat!(
        "mutation UpdateCartDiscountCodes($cartId: ID!, $discountCodes: [String!]) {\n",
        "  cartDiscountCodesUpdate(cartId: $cartId, discountCodes: $discountCodes) {\n",
        "    cart { ...CartFields }\n",
        "    userErrors { field message code }\n",
        "  }\n",
        "}\n",
        cart_fragment!()
    )
);

operation!(
    GetShopLocalization,
    NoVariables,
    ShopLocalizationData,
    concat!(
        "query GetShopLocalization {\n",
        "  localization {\n",
        "    country { isoCode currency { isoCode } }\n",
        "    availableCountries { isoCode currency { isoCode } }\n",
        "  }\n",
        "}\n"
    )
);
