//! Effective price of a product or variant.

use rust_decimal::Decimal;

use super::product::Product;
use super::variant::Variant;

/// Pick the price a shopper pays.
///
/// A variant's own price wins. Otherwise the sale price applies when it is
/// below the base price. Otherwise the base price.
#[must_use]
pub fn resolve_price(base: Decimal, sale: Option<Decimal>, variant_override: Option<Decimal>) -> Decimal {
    variant_override
        .or_else(|| sale.filter(|s| *s < base))
        .unwrap_or(base)
}

/// Price of `product`, or of one of its variants when one is selected.
#[must_use]
pub fn effective_price(product: &Product, variant: Option<&Variant>) -> Decimal {
    resolve_price(
        product.base_price,
        product.sale_price,
        variant.and_then(|v| v.price_override),
    )
}
