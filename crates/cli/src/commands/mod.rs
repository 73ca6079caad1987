//! CLI command implementations.

pub mod cart;
pub mod checkout;
pub mod orders;
pub mod quote;

use clap::Args;
use rust_decimal::Decimal;
use thiserror::Error;

use artprint_core::{DeliveryArea, Money, OrderId, ShippingField, VariantSelection};
use artprint_storefront::api::ApiError;
use artprint_storefront::config::{ConfigError, StorefrontConfig};
use artprint_storefront::{
    CartError, CheckoutError, CheckoutForm, Navigator, StorefrontState, tracking_path,
};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Checkout engine failure.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Command needs a signed-in buyer but no session is configured.
    #[error("Sign-in required: set ARTPRINT_API_TOKEN and ARTPRINT_USER_ID")]
    SignInRequired,
}

impl CommandError {
    /// Text to show the operator.
    pub fn user_message(&self) -> String {
        match self {
            Self::Checkout(CheckoutError::Config(e)) => e.to_string(),
            Self::Checkout(e) => e.user_message(),
            Self::SignInRequired => self.to_string(),
        }
    }

    /// Capture unexpected failures to Sentry.
    pub fn report(&self) {
        if let Self::Checkout(e) = self {
            e.report();
        }
    }
}

impl From<ConfigError> for CommandError {
    fn from(e: ConfigError) -> Self {
        Self::Checkout(e.into())
    }
}

impl From<ApiError> for CommandError {
    fn from(e: ApiError) -> Self {
        Self::Checkout(e.into())
    }
}

impl From<CartError> for CommandError {
    fn from(e: CartError) -> Self {
        Self::Checkout(e.into())
    }
}

/// Build the engine state from loaded configuration.
pub fn state(config: StorefrontConfig) -> Result<StorefrontState, CommandError> {
    Ok(StorefrontState::new(config)?)
}

/// Fail unless a buyer session is configured.
pub fn require_session(state: &StorefrontState) -> Result<(), CommandError> {
    if state.session().is_none() {
        return Err(CommandError::SignInRequired);
    }
    Ok(())
}

/// Parse a non-negative taka amount.
pub fn parse_money(value: &str) -> Result<Money, String> {
    let amount: Decimal = value.trim().parse().map_err(|e| format!("{e}"))?;
    Money::new(amount).map_err(|e| e.to_string())
}

/// Size, color and material flags.
#[derive(Args, Debug, Clone, Default)]
pub struct VariantArgs {
    /// Size option
    #[arg(long)]
    pub size: Option<String>,

    /// Color option
    #[arg(long)]
    pub color: Option<String>,

    /// Material option
    #[arg(long)]
    pub material: Option<String>,
}

impl From<VariantArgs> for VariantSelection {
    fn from(args: VariantArgs) -> Self {
        Self::new(args.size, args.color, args.material)
    }
}

/// Shipping address flags shared by the checkout commands.
#[derive(Args, Debug, Clone)]
pub struct ShippingArgs {
    /// Recipient's full name
    #[arg(long)]
    pub name: String,

    /// Contact phone number
    #[arg(long)]
    pub phone: String,

    /// Street address
    #[arg(long)]
    pub address: String,

    /// City; decides the delivery tier unless `--area` is given
    #[arg(long)]
    pub city: String,

    /// Postal code
    #[arg(long)]
    pub postal_code: String,

    /// Override the delivery tier (`inside` or `outside`)
    #[arg(long)]
    pub area: Option<DeliveryArea>,
}

impl ShippingArgs {
    /// Fill a checkout form the way a buyer would: fields in order, then an
    /// optional manual tier.
    pub fn to_form(&self) -> CheckoutForm {
        let mut form = CheckoutForm::new();
        form.set_field(ShippingField::FullName, self.name.as_str());
        form.set_field(ShippingField::Phone, self.phone.as_str());
        form.set_field(ShippingField::Address, self.address.as_str());
        form.set_city(self.city.as_str());
        form.set_field(ShippingField::PostalCode, self.postal_code.as_str());
        if let Some(area) = self.area {
            form.select_area(area);
        }
        form
    }
}

/// Navigator that logs the tracking path instead of switching views.
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate_to_order(&self, order_id: &OrderId) {
        tracing::info!(
            order_id = %order_id,
            path = %tracking_path(order_id),
            "Track your order"
        );
    }
}
