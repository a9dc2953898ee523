//! Sale-price calculation.
//!
//! Two policies coexist and are deliberately kept separate:
//!
//! * [`PricingService::calculate_sale_price`] expresses margin and VAT as
//!   percentages (15 means +15%), always applies VAT, and rounds to 2
//!   decimal places with round-half-to-even.
//! * [`won_rounded_sale_price`] expresses margin and VAT as fractions
//!   (0.15 means +15%), applies VAT only when asked, and rounds to the
//!   nearest 10 KRW. It is the policy used for storefront-facing round
//!   prices.
//!
//! The two disagree on rate semantics and rounding on purpose; merging them
//! would change observable prices on one side or the other.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::config::PricingConfig;
use crate::errors::ServiceError;

/// Process-wide fallback values, the last layer of per-parameter resolution.
#[derive(Debug, Clone, Default)]
pub struct PricingDefaults {
    pub exchange_rate: Option<Decimal>,
    pub margin_rate: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
    pub shipping_fee: Option<Decimal>,
}

impl TryFrom<&PricingConfig> for PricingDefaults {
    type Error = ServiceError;

    fn try_from(cfg: &PricingConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            exchange_rate: Some(decimal_from_config("exchange_rate", cfg.exchange_rate)?),
            margin_rate: Some(decimal_from_config("margin_rate", cfg.margin_rate)?),
            vat_rate: Some(decimal_from_config("vat_rate", cfg.vat_rate)?),
            shipping_fee: Some(decimal_from_config("delivery_fee", cfg.delivery_fee)?),
        })
    }
}

fn decimal_from_config(name: &str, value: f64) -> Result<Decimal, ServiceError> {
    Decimal::try_from(value).map_err(|e| {
        ServiceError::Configuration(format!("pricing default '{}' is not representable: {}", name, e))
    })
}

/// Per-call and per-product overrides, already layered by the caller
/// (call-level values win over product-level ones).
#[derive(Debug, Clone, Default)]
pub struct PriceOverrides {
    pub exchange_rate: Option<Decimal>,
    pub margin_rate: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
    pub shipping_fee: Option<Decimal>,
}

impl PriceOverrides {
    /// Layers `call` over `product`: a value present at the call level wins.
    pub fn layered(call: PriceOverrides, product: PriceOverrides) -> Self {
        Self {
            exchange_rate: call.exchange_rate.or(product.exchange_rate),
            margin_rate: call.margin_rate.or(product.margin_rate),
            vat_rate: call.vat_rate.or(product.vat_rate),
            shipping_fee: call.shipping_fee.or(product.shipping_fee),
        }
    }
}

/// Percent-based pricing policy.
#[derive(Debug, Clone)]
pub struct PricingService {
    defaults: PricingDefaults,
}

impl PricingService {
    pub fn new(defaults: PricingDefaults) -> Self {
        Self { defaults }
    }

    pub fn from_config(cfg: &PricingConfig) -> Result<Self, ServiceError> {
        Ok(Self::new(PricingDefaults::try_from(cfg)?))
    }

    /// Computes the KRW sale price from a CNY cost.
    ///
    /// Fixed step order: convert with the exchange rate, add the delivery
    /// fee, apply margin, apply VAT, round to 2 decimal places
    /// (half-to-even). Margin and VAT are percentages here.
    pub fn calculate_sale_price(
        &self,
        raw_price: Decimal,
        option_price_diff: Decimal,
        overrides: &PriceOverrides,
    ) -> Result<Decimal, ServiceError> {
        let rate = resolve("exchange_rate", overrides.exchange_rate, self.defaults.exchange_rate)?;
        let margin = resolve("margin_rate", overrides.margin_rate, self.defaults.margin_rate)?;
        let vat = resolve("vat_rate", overrides.vat_rate, self.defaults.vat_rate)?;
        let shipping = resolve("shipping_fee", overrides.shipping_fee, self.defaults.shipping_fee)?;

        let base_cost_krw = (raw_price + option_price_diff) * rate;
        let subtotal = base_cost_krw + shipping;
        let with_margin = subtotal * (Decimal::ONE + margin / dec!(100));
        let final_price = with_margin * (Decimal::ONE + vat / dec!(100));

        Ok(final_price.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
    }
}

fn resolve(
    name: &str,
    override_value: Option<Decimal>,
    default_value: Option<Decimal>,
) -> Result<Decimal, ServiceError> {
    override_value.or(default_value).ok_or_else(|| {
        ServiceError::Configuration(format!("pricing parameter '{}' did not resolve to a value", name))
    })
}

/// Inputs for the fraction-based policy.
#[derive(Debug, Clone)]
pub struct PricingInputs {
    pub base_price: Decimal,
    pub exchange_rate: Decimal,
    /// Margin as a fraction of the landed cost (0.25 means +25%).
    pub margin_rate: Decimal,
    pub shipping_fee: Decimal,
    /// VAT as a fraction; only applied when `include_vat` is set.
    pub vat_rate: Decimal,
    pub include_vat: bool,
}

impl PricingInputs {
    pub fn new(base_price: Decimal, exchange_rate: Decimal) -> Self {
        Self {
            base_price,
            exchange_rate,
            margin_rate: Decimal::ZERO,
            shipping_fee: Decimal::ZERO,
            vat_rate: dec!(0.1),
            include_vat: false,
        }
    }
}

/// Fraction-based pricing policy: converts, adds shipping, applies margin,
/// optionally applies VAT, and rounds to the nearest 10 KRW.
pub fn won_rounded_sale_price(inputs: &PricingInputs) -> Decimal {
    let cost_krw = inputs.base_price * inputs.exchange_rate;
    let landed_cost = cost_krw + inputs.shipping_fee;
    let mut price = landed_cost * (Decimal::ONE + inputs.margin_rate);
    if inputs.include_vat {
        price *= Decimal::ONE + inputs.vat_rate;
    }
    (price / dec!(10)).round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven) * dec!(10)
}
