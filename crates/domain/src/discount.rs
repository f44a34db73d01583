//! Discount rules and the discount aggregator.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::{MoneyError, OrderError};
use crate::money::{Currency, Money};
use crate::order::Order;

/// An interchangeable discount-calculation rule.
///
/// Rules are stateless: each one derives its discount from the order alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountRule {
    /// Percentage of the total once the order reaches a unit count.
    QuantityThreshold { min_units: u32, percent: Decimal },

    /// Percentage of the total once the total reaches a floor amount.
    ValueThreshold { floor: Decimal, percent: Decimal },
}

impl DiscountRule {
    /// Default quantity rule: 10 units or more grants 5%.
    pub fn default_quantity() -> Self {
        DiscountRule::QuantityThreshold {
            min_units: 10,
            percent: Decimal::from(5),
        }
    }

    /// Default value rule: totals of 500 or more grant 10%.
    pub fn default_value() -> Self {
        DiscountRule::ValueThreshold {
            floor: Decimal::from(500),
            percent: Decimal::from(10),
        }
    }

    /// Returns true if the rule applies to the order.
    pub fn applies(&self, order: &Order) -> bool {
        match self {
            DiscountRule::QuantityThreshold { min_units, .. } => {
                order.total_quantity() >= *min_units
            }
            DiscountRule::ValueThreshold { floor, .. } => order.total().amount() >= *floor,
        }
    }

    /// Computes the rule's discount, zero when it does not apply.
    pub fn discount(&self, order: &Order) -> Result<Money, MoneyError> {
        if !self.applies(order) {
            return Ok(Money::zero(order.currency().unwrap_or(Currency::BASE)));
        }
        let percent = match self {
            DiscountRule::QuantityThreshold { percent, .. } => *percent,
            DiscountRule::ValueThreshold { percent, .. } => *percent,
        };
        order.total().percentage(percent)
    }
}

/// A registered coupon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponRule {
    /// Percentage of the total granted by the coupon.
    pub percent: Decimal,

    /// Minimum order total for the coupon to apply.
    pub min_total: Option<Decimal>,

    /// Inactive coupons yield zero discount.
    pub active: bool,
}

impl CouponRule {
    /// Creates an active coupon.
    pub fn new(percent: Decimal, min_total: Option<Decimal>) -> Self {
        Self {
            percent,
            min_total,
            active: true,
        }
    }
}

/// Composes the discount rules and the coupon registry into a total discount.
///
/// The coupon registry is process-lifetime state owned by this instance;
/// construct one per process and pass it by reference.
#[derive(Debug, Clone)]
pub struct DiscountService {
    rules: Vec<DiscountRule>,
    coupons: HashMap<String, CouponRule>,
}

impl Default for DiscountService {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscountService {
    /// Creates a service with the default rules and seeded coupons.
    pub fn new() -> Self {
        let mut coupons = HashMap::new();
        coupons.insert(
            "DESCONTO10".to_string(),
            CouponRule::new(Decimal::from(10), Some(Decimal::from(50))),
        );
        coupons.insert(
            "DESCONTO20".to_string(),
            CouponRule::new(Decimal::from(20), Some(Decimal::from(100))),
        );
        Self {
            rules: vec![DiscountRule::default_quantity(), DiscountRule::default_value()],
            coupons,
        }
    }

    /// Creates a service with custom rules and an empty coupon registry.
    pub fn with_rules(rules: Vec<DiscountRule>) -> Self {
        Self {
            rules,
            coupons: HashMap::new(),
        }
    }

    /// Registers (or replaces) a coupon at runtime.
    pub fn register_coupon(&mut self, code: impl Into<String>, rule: CouponRule) {
        self.coupons.insert(code.into(), rule);
    }

    /// Deactivates a registered coupon.
    pub fn deactivate_coupon(&mut self, code: &str) -> Result<(), OrderError> {
        let coupon = self
            .coupons
            .get_mut(code)
            .ok_or_else(|| OrderError::CouponNotFound {
                code: code.to_string(),
            })?;
        coupon.active = false;
        Ok(())
    }

    /// Looks up a registered coupon.
    pub fn coupon(&self, code: &str) -> Option<&CouponRule> {
        self.coupons.get(code)
    }

    /// Unknown, inactive, or below-minimum coupons yield zero, never an error.
    fn coupon_discount(&self, order: &Order, code: &str) -> Result<Money, MoneyError> {
        let zero = Money::zero(order.currency().unwrap_or(Currency::BASE));
        let Some(coupon) = self.coupons.get(code) else {
            return Ok(zero);
        };
        if !coupon.active {
            return Ok(zero);
        }
        let total = order.total();
        if let Some(min_total) = coupon.min_total {
            if total.amount() < min_total {
                return Ok(zero);
            }
        }
        total.percentage(coupon.percent)
    }

    /// Computes the combined discount for an order.
    ///
    /// The quantity, value, and coupon discounts are additive; the sum is
    /// clamped to the order total so the final total never goes negative.
    /// Orders with no items get zero without evaluating any rule.
    pub fn total_discount(
        &self,
        order: &Order,
        coupon_code: Option<&str>,
    ) -> Result<Money, OrderError> {
        let currency = order.currency().unwrap_or(Currency::BASE);
        if order.is_empty() {
            return Ok(Money::zero(currency));
        }

        let mut sum = Money::zero(currency);
        for rule in &self.rules {
            sum = sum.add(rule.discount(order)?)?;
        }
        if let Some(code) = coupon_code {
            sum = sum.add(self.coupon_discount(order, code)?)?;
        }

        let total = order.total();
        if sum.is_greater_than(&total)? {
            sum = total;
        }
        Ok(sum)
    }

    /// Returns the order total after the combined discount.
    pub fn final_total(
        &self,
        order: &Order,
        coupon_code: Option<&str>,
    ) -> Result<Money, OrderError> {
        let discount = self.total_discount(order, coupon_code)?;
        Ok(order.total().subtract(discount)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{LineItem, ProductRef};
    use rust_decimal_macros::dec;

    fn order_with(quantity: u32, unit_price: Decimal) -> Order {
        let mut order = Order::create("c1", None).unwrap();
        let item = LineItem::new(
            ProductRef::new("SKU-001", "Widget").unwrap(),
            quantity,
            Money::new(unit_price, Currency::Brl).unwrap(),
        )
        .unwrap();
        order.add_item(item).unwrap();
        order
    }

    #[test]
    fn quantity_rule_applies_at_threshold() {
        let rule = DiscountRule::default_quantity();
        assert!(!rule.applies(&order_with(9, dec!(10))));
        assert!(rule.applies(&order_with(10, dec!(10))));
    }

    #[test]
    fn value_rule_applies_at_floor() {
        let rule = DiscountRule::default_value();
        assert!(!rule.applies(&order_with(1, dec!(499.99))));
        assert!(rule.applies(&order_with(1, dec!(500))));
    }

    #[test]
    fn empty_order_gets_zero_discount() {
        let service = DiscountService::new();
        let order = Order::create("c1", None).unwrap();
        let discount = service.total_discount(&order, Some("DESCONTO10")).unwrap();
        assert!(discount.is_zero());
    }

    #[test]
    fn combined_discounts_are_additive() {
        // 12 × 50 = 600: quantity (12 ≥ 10 ⇒ 5%) = 30, value (600 ≥ 500 ⇒ 10%) = 60.
        let service = DiscountService::new();
        let order = order_with(12, dec!(50));

        let discount = service.total_discount(&order, None).unwrap();
        assert_eq!(discount.amount(), dec!(90.00));

        let final_total = service.final_total(&order, None).unwrap();
        assert_eq!(final_total.amount(), dec!(510.00));
    }

    #[test]
    fn coupon_respects_minimum_total() {
        let service = DiscountService::new();

        let order = order_with(1, dec!(100));
        let discount = service.total_discount(&order, Some("DESCONTO10")).unwrap();
        assert_eq!(discount.amount(), dec!(10.00));

        let order = order_with(1, dec!(30));
        let discount = service.total_discount(&order, Some("DESCONTO10")).unwrap();
        assert!(discount.is_zero());
    }

    #[test]
    fn unknown_coupon_yields_zero() {
        let service = DiscountService::new();
        let order = order_with(1, dec!(100));
        let discount = service.total_discount(&order, Some("NOPE")).unwrap();
        assert!(discount.is_zero());
    }

    #[test]
    fn deactivated_coupon_yields_zero() {
        let mut service = DiscountService::new();
        service.deactivate_coupon("DESCONTO10").unwrap();

        let order = order_with(1, dec!(100));
        let discount = service.total_discount(&order, Some("DESCONTO10")).unwrap();
        assert!(discount.is_zero());
    }

    #[test]
    fn deactivating_unknown_coupon_fails() {
        let mut service = DiscountService::new();
        assert!(matches!(
            service.deactivate_coupon("NOPE"),
            Err(OrderError::CouponNotFound { .. })
        ));
    }

    #[test]
    fn registered_coupon_applies_at_runtime() {
        let mut service = DiscountService::new();
        service.register_coupon("BEMVINDO", CouponRule::new(dec!(15), None));

        let order = order_with(1, dec!(40));
        let discount = service.total_discount(&order, Some("BEMVINDO")).unwrap();
        assert_eq!(discount.amount(), dec!(6.00));
    }

    #[test]
    fn discount_never_exceeds_total() {
        let mut service = DiscountService::with_rules(vec![
            DiscountRule::QuantityThreshold {
                min_units: 1,
                percent: dec!(60),
            },
            DiscountRule::ValueThreshold {
                floor: Decimal::ZERO,
                percent: dec!(60),
            },
        ]);
        service.register_coupon("MEGA", CouponRule::new(dec!(60), None));

        let order = order_with(2, dec!(100));
        let discount = service.total_discount(&order, Some("MEGA")).unwrap();
        assert_eq!(discount, order.total());

        let final_total = service.final_total(&order, Some("MEGA")).unwrap();
        assert!(final_total.is_zero());
    }
}
