//! Delivery pricing.
//!
//! Shipping is a flat rate with exactly two tiers: inside Dhaka and everywhere
//! else. The tier is derived from the free-text city the buyer types, so
//! classification has to be forgiving about case and script.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Money;

/// Flat delivery charge inside Dhaka.
pub const INSIDE_DHAKA_CHARGE: u64 = 60;

/// Flat delivery charge outside Dhaka.
pub const OUTSIDE_DHAKA_CHARGE: u64 = 120;

/// City names (lowercase) that classify as inside the delivery region:
/// the Latin spelling and the Bengali-script spelling.
const INSIDE_CITY_NAMES: [&str; 2] = ["dhaka", "ঢাকা"];

/// Delivery tier of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryArea {
    /// Inside Dhaka.
    #[default]
    Inside,
    /// Outside Dhaka.
    Outside,
}

impl DeliveryArea {
    /// Flat charge for this tier.
    #[must_use]
    pub fn charge(self) -> Money {
        match self {
            Self::Inside => Money::from_whole(INSIDE_DHAKA_CHARGE),
            Self::Outside => Money::from_whole(OUTSIDE_DHAKA_CHARGE),
        }
    }
}

impl fmt::Display for DeliveryArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inside => write!(f, "inside"),
            Self::Outside => write!(f, "outside"),
        }
    }
}

impl FromStr for DeliveryArea {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inside" => Ok(Self::Inside),
            "outside" => Ok(Self::Outside),
            _ => Err(format!("invalid delivery area: {s}")),
        }
    }
}

/// Classify free-text city input into a delivery tier.
///
/// Matching is a case-insensitive substring test, so "Dhaka", "dhaka-1207"
/// and "ঢাকা" are all inside. Empty input is inside, matching the initial
/// state of the checkout form.
///
/// ```
/// use artprint_core::{DeliveryArea, classify_delivery};
///
/// assert_eq!(classify_delivery("Dhaka"), DeliveryArea::Inside);
/// assert_eq!(classify_delivery("Chittagong"), DeliveryArea::Outside);
/// assert_eq!(classify_delivery(""), DeliveryArea::Inside);
/// ```
#[must_use]
pub fn classify_delivery(city: &str) -> DeliveryArea {
    let city = city.trim().to_lowercase();
    if city.is_empty() || INSIDE_CITY_NAMES.iter().any(|name| city.contains(name)) {
        DeliveryArea::Inside
    } else {
        DeliveryArea::Outside
    }
}

/// Amount the buyer pays: `subtotal + delivery_charge`.
#[must_use]
pub fn grand_total(subtotal: Money, delivery_charge: Money) -> Money {
    subtotal + delivery_charge
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_classify_dhaka_spellings() {
        assert_eq!(classify_delivery("Dhaka"), DeliveryArea::Inside);
        assert_eq!(classify_delivery("DHAKA"), DeliveryArea::Inside);
        assert_eq!(classify_delivery("Mirpur, Dhaka"), DeliveryArea::Inside);
        assert_eq!(classify_delivery("ঢাকা"), DeliveryArea::Inside);
    }

    #[test]
    fn test_classify_other_cities() {
        assert_eq!(classify_delivery("Chittagong"), DeliveryArea::Outside);
        assert_eq!(classify_delivery("Sylhet"), DeliveryArea::Outside);
        assert_eq!(classify_delivery("D"), DeliveryArea::Outside);
    }

    #[test]
    fn test_classify_empty_defaults_inside() {
        assert_eq!(classify_delivery(""), DeliveryArea::Inside);
        assert_eq!(classify_delivery("   "), DeliveryArea::Inside);
    }

    #[test]
    fn test_charges_are_fixed_tiers() {
        assert_eq!(DeliveryArea::Inside.charge(), Money::from_whole(60));
        assert_eq!(DeliveryArea::Outside.charge(), Money::from_whole(120));
    }

    #[test]
    fn test_grand_total_adds_charge() {
        let cases = [(0, 60), (1000, 60), (1000, 120), (0, 0), (123_456, 120)];
        for (subtotal, charge) in cases {
            assert_eq!(
                grand_total(Money::from_whole(subtotal), Money::from_whole(charge)),
                Money::from_whole(subtotal + charge)
            );
        }

        let fractional = Money::new(Decimal::new(99_950, 2)).unwrap();
        assert_eq!(
            grand_total(fractional, DeliveryArea::Inside.charge()).amount(),
            Decimal::new(105_950, 2)
        );
    }

    #[test]
    fn test_dhaka_and_sylhet_scenarios() {
        let subtotal = Money::from_whole(500).times(2);
        assert_eq!(subtotal, Money::from_whole(1000));

        let inside = classify_delivery("Dhaka").charge();
        assert_eq!(grand_total(subtotal, inside), Money::from_whole(1060));

        let outside = classify_delivery("Sylhet").charge();
        assert_eq!(grand_total(subtotal, outside), Money::from_whole(1120));
    }

    #[test]
    fn test_area_parses_from_cli_values() {
        assert_eq!("inside".parse::<DeliveryArea>().unwrap(), DeliveryArea::Inside);
        assert_eq!("Outside".parse::<DeliveryArea>().unwrap(), DeliveryArea::Outside);
        assert!("abroad".parse::<DeliveryArea>().is_err());
    }
}
