use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Pricing - Subtotal, Delivery Fee, Total
// ============================================================================

/// Subtotal at or above which delivery is free (BDT)
pub const FREE_DELIVERY_THRESHOLD: Decimal = Decimal::ONE_THOUSAND;

/// Flat delivery fee below the threshold (BDT)
pub const DELIVERY_FEE: Decimal = Decimal::from_parts(60, 0, 0, false, 0);

/// Price breakdown of a cart or order.
///
/// Only constructible from a subtotal, so `total == subtotal + delivery_fee`
/// always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    subtotal: Decimal,
    delivery_fee: Decimal,
    total: Decimal,
}

impl Pricing {
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        let delivery_fee = delivery_fee_for(subtotal);
        Self {
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        }
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    pub fn delivery_fee(&self) -> Decimal {
        self.delivery_fee
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn has_free_delivery(&self) -> bool {
        self.delivery_fee.is_zero()
    }
}

pub fn delivery_fee_for(subtotal: Decimal) -> Decimal {
    if subtotal >= FREE_DELIVERY_THRESHOLD {
        Decimal::ZERO
    } else {
        DELIVERY_FEE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_below_threshold() {
        let pricing = Pricing::from_subtotal(Decimal::from(300));
        assert_eq!(pricing.delivery_fee(), Decimal::from(60));
        assert_eq!(pricing.total(), Decimal::from(360));
        assert!(!pricing.has_free_delivery());
    }

    #[test]
    fn test_free_delivery_at_exact_threshold() {
        let pricing = Pricing::from_subtotal(Decimal::from(1000));
        assert_eq!(pricing.delivery_fee(), Decimal::ZERO);
        assert_eq!(pricing.total(), Decimal::from(1000));
    }

    #[test]
    fn test_fractional_subtotal_just_below_threshold_pays_fee() {
        let subtotal = Decimal::new(99999, 2); // 999.99
        let pricing = Pricing::from_subtotal(subtotal);
        assert_eq!(pricing.delivery_fee(), DELIVERY_FEE);
        assert_eq!(pricing.total(), subtotal + DELIVERY_FEE);
    }

    #[test]
    fn test_total_is_always_subtotal_plus_fee() {
        for amount in [0i64, 1, 59, 60, 500, 999, 1000, 1001, 25_000] {
            let pricing = Pricing::from_subtotal(Decimal::from(amount));
            assert_eq!(pricing.total(), pricing.subtotal() + pricing.delivery_fee());
            let expected_fee = if amount >= 1000 { Decimal::ZERO } else { Decimal::from(60) };
            assert_eq!(pricing.delivery_fee(), expected_fee);
        }
    }
}
