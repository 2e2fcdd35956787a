//! Wire type to domain type conversions.

use harbor_core::CurrencyCode;
use tracing::{debug, warn};

use crate::shopify::ShopifyError;
use crate::shopify::types::{
    Cart, CartCost, CartDiscountCode, CartLine, CartMerchandise, Image, ShopLocalization,
};

use super::queries::{CartFields, CartPayload, LineFields, LocalizationFields};

/// Convert a cart selection into the domain cart.
///
/// Lines whose merchandise is not a product variant are skipped.
pub fn convert_cart(cart: CartFields) -> Cart {
    Cart {
        id: cart.id,
        checkout_url: cart.checkout_url,
        total_quantity: u32::try_from(cart.total_quantity).unwrap_or(0),
        note: cart.note,
        updated_at: cart.updated_at,
        cost: CartCost {
            subtotal: cart.cost.subtotal_amount.into(),
            total: cart.cost.total_amount.into(),
            total_tax: cart.cost.total_tax_amount.map(Into::into),
        },
        discount_codes: cart
            .discount_codes
            .into_iter()
            .map(|d| CartDiscountCode {
                code: d.code,
                applicable: d.applicable,
            })
            .collect(),
        lines: cart
            .lines
            .edges
            .into_iter()
            .filter_map(|edge| convert_cart_line(edge.node))
            .collect(),
    }
}

fn convert_cart_line(line: LineFields) -> Option<CartLine> {
    let merchandise = line.merchandise;
    let (Some(variant_id), Some(variant_title), Some(product)) =
        (merchandise.id, merchandise.title, merchandise.product)
    else {
        warn!(line_id = %line.id, "Skipping cart line without product variant merchandise");
        return None;
    };

    Some(CartLine {
        id: line.id,
        quantity: u32::try_from(line.quantity).unwrap_or(0),
        unit_price: line.cost.amount_per_quantity.into(),
        line_total: line.cost.total_amount.into(),
        merchandise: CartMerchandise {
            variant_id,
            variant_title,
            image: merchandise.image.map(|img| Image {
                url: img.url,
                alt_text: img.alt_text,
            }),
            product_id: product.id,
            product_handle: product.handle,
            product_title: product.title,
        },
    })
}

/// Unwrap a cart mutation payload.
///
/// `userErrors` win over a returned cart: they are business-rule failures
/// and the message is surfaced to the shopper verbatim.
pub fn cart_from_payload(payload: Option<CartPayload>, action: &str) -> Result<Cart, ShopifyError> {
    let payload =
        payload.ok_or_else(|| ShopifyError::EmptyResponse(format!("{action}: no payload")))?;

    if !payload.user_errors.is_empty() {
        for e in &payload.user_errors {
            debug!(field = ?e.field, code = ?e.code, message = %e.message, "Cart user error");
        }
        return Err(ShopifyError::UserError(
            payload
                .user_errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; "),
        ));
    }

    payload
        .cart
        .map(convert_cart)
        .ok_or_else(|| ShopifyError::EmptyResponse(format!("{action}: no cart returned")))
}

/// Convert localization into the set of currencies the shop sells in.
pub fn convert_localization(localization: LocalizationFields) -> ShopLocalization {
    let mut available_currencies: Vec<CurrencyCode> = Vec::new();
    for country in localization.available_countries {
        if !available_currencies.contains(&country.currency.iso_code) {
            available_currencies.push(country.currency.iso_code);
        }
    }

    ShopLocalization {
        country_code: localization.country.iso_code,
        currency: localization.country.currency.iso_code,
        available_currencies,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::shopify::storefront::queries::{GetCartData, ShopLocalizationData};

    fn cart_json() -> serde_json::Value {
        serde_json::json!({
            "cart": {
                "id": "gid://shopify/Cart/abc",
                "checkoutUrl": "https://shop.example/checkout/abc",
                "totalQuantity": 3,
                "note": null,
                "updatedAt": "2026-10-01T12:00:00Z",
                "cost": {
                    "subtotalAmount": { "amount": "30.0", "currencyCode": "EUR" },
                    "totalAmount": { "amount": "36.9", "currencyCode": "EUR" },
                    "totalTaxAmount": null
                },
                "discountCodes": [{ "code": "WELCOME10", "applicable": true }],
                "lines": { "edges": [
                    { "node": {
                        "id": "gid://shopify/CartLine/1",
                        "quantity": 3,
                        "cost": {
                            "amountPerQuantity": { "amount": "10.0", "currencyCode": "EUR" },
                            "totalAmount": { "amount": "30.0", "currencyCode": "EUR" }
                        },
                        "merchandise": {
                            "id": "gid://shopify/ProductVariant/9",
                            "title": "Large",
                            "image": { "url": "https://cdn.example/p.png", "altText": null },
                            "product": { "id": "gid://shopify/Product/5", "handle": "tee", "title": "Tee" }
                        }
                    }},
                    { "node": {
                        "id": "gid://shopify/CartLine/2",
                        "quantity": 1,
                        "cost": {
                            "amountPerQuantity": { "amount": "0", "currencyCode": "EUR" },
                            "totalAmount": { "amount": "0", "currencyCode": "EUR" }
                        },
                        "merchandise": {}
                    }}
                ]}
            }
        })
    }

    #[test]
    fn test_convert_cart() {
        let data: GetCartData = serde_json::from_value(cart_json()).unwrap();
        let cart = convert_cart(data.cart.unwrap());

        assert_eq!(cart.total_quantity, 3);
        assert_eq!(cart.currency().as_str(), "EUR");
        assert_eq!(cart.cost.total.display(), "€36.90");
        assert_eq!(cart.discount_codes[0].code, "WELCOME10");
        // The line without variant merchandise is dropped.
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].merchandise.product_handle, "tee");
        assert_eq!(cart.lines[0].unit_price.display(), "€10.00");
    }

    #[test]
    fn test_cart_from_payload_prefers_user_errors() {
        let payload: CartPayload = serde_json::from_value(serde_json::json!({
            "cart": null,
            "userErrors": [
                { "field": ["lines", "0"], "message": "Insufficient stock", "code": "INVALID" }
            ]
        }))
        .unwrap();

        let err = cart_from_payload(Some(payload), "add").unwrap_err();
        assert!(matches!(err, ShopifyError::UserError(ref m) if m == "Insufficient stock"));
    }

    #[test]
    fn test_cart_from_payload_missing() {
        let err = cart_from_payload(None, "add").unwrap_err();
        assert!(matches!(err, ShopifyError::EmptyResponse(_)));
    }

    #[test]
    fn test_convert_localization_dedups_currencies() {
        let data: ShopLocalizationData = serde_json::from_value(serde_json::json!({
            "localization": {
                "country": { "isoCode": "PL", "currency": { "isoCode": "PLN" } },
                "availableCountries": [
                    { "isoCode": "US", "currency": { "isoCode": "USD" } },
                    { "isoCode": "DE", "currency": { "isoCode": "EUR" } },
                    { "isoCode": "FR", "currency": { "isoCode": "EUR" } },
                    { "isoCode": "PL", "currency": { "isoCode": "PLN" } }
                ]
            }
        }))
        .unwrap();

        let localization = convert_localization(data.localization);
        assert_eq!(localization.currency.as_str(), "PLN");
        let codes: Vec<&str> = localization
            .available_currencies
            .iter()
            .map(CurrencyCode::as_str)
            .collect();
        assert_eq!(codes, vec!["USD", "EUR", "PLN"]);
    }
}
