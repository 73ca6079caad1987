//! Shipping address entered at checkout.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Country every order ships to.
pub const DEFAULT_COUNTRY: &str = "Bangladesh";

/// Where an order is delivered.
///
/// Field names follow the backend's camelCase wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

impl Default for ShippingAddress {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            postal_code: String::new(),
            country: default_country(),
        }
    }
}

impl ShippingAddress {
    /// Current value of an editable field.
    #[must_use]
    pub fn get(&self, field: ShippingField) -> &str {
        match field {
            ShippingField::FullName => &self.full_name,
            ShippingField::Phone => &self.phone,
            ShippingField::Address => &self.address,
            ShippingField::City => &self.city,
            ShippingField::PostalCode => &self.postal_code,
        }
    }

    /// Mutable access to an editable field.
    pub fn get_mut(&mut self, field: ShippingField) -> &mut String {
        match field {
            ShippingField::FullName => &mut self.full_name,
            ShippingField::Phone => &mut self.phone,
            ShippingField::Address => &mut self.address,
            ShippingField::City => &mut self.city,
            ShippingField::PostalCode => &mut self.postal_code,
        }
    }

    /// Required fields that are empty or whitespace-only, in form order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<ShippingField> {
        ShippingField::ALL
            .into_iter()
            .filter(|field| self.get(*field).trim().is_empty())
            .collect()
    }
}

/// The buyer-editable fields of a [`ShippingAddress`].
///
/// Country is fixed and therefore not listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShippingField {
    FullName,
    Phone,
    Address,
    City,
    PostalCode,
}

impl ShippingField {
    /// All editable fields, in form order.
    pub const ALL: [Self; 5] = [
        Self::FullName,
        Self::Phone,
        Self::Address,
        Self::City,
        Self::PostalCode,
    ];
}

impl fmt::Display for ShippingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::FullName => "full name",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::City => "city",
            Self::PostalCode => "postal code",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_country() {
        assert_eq!(ShippingAddress::default().country, "Bangladesh");
    }

    #[test]
    fn test_missing_fields_in_form_order() {
        let address = ShippingAddress {
            full_name: "Rahim".to_string(),
            city: "   ".to_string(),
            ..ShippingAddress::default()
        };
        assert_eq!(
            address.missing_fields(),
            vec![
                ShippingField::Phone,
                ShippingField::Address,
                ShippingField::City,
                ShippingField::PostalCode,
            ]
        );
    }

    #[test]
    fn test_camel_case_wire_format() {
        let address = ShippingAddress {
            full_name: "Rahim Uddin".to_string(),
            postal_code: "1207".to_string(),
            ..ShippingAddress::default()
        };
        let json = serde_json::to_value(&address).unwrap();
        assert_eq!(json["fullName"], "Rahim Uddin");
        assert_eq!(json["postalCode"], "1207");
        assert_eq!(json["country"], "Bangladesh");
    }
}
