//! Status and classification enums shared with the commerce API.

use serde::{Deserialize, Serialize};

/// Visibility class a business assigns to a catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CatalogueType {
    /// Anyone with the link can browse.
    #[default]
    Public,
    /// Only verified contacts or the owning business can browse.
    Private,
    /// Shared with resellers who earn a commission; not open to the public.
    Commission,
}

impl CatalogueType {
    /// Whether the type alone makes the catalogue open to everyone.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

impl std::fmt::Display for CatalogueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
            Self::Commission => write!(f, "commission"),
        }
    }
}

/// Who is buying in an order.
///
/// The storefront only ever places consumer orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Business to consumer.
    B2c,
}

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    MobileMoney,
    Card,
    BankTransfer,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CashOnDelivery => write!(f, "cash_on_delivery"),
            Self::MobileMoney => write!(f, "mobile_money"),
            Self::Card => write!(f, "card"),
            Self::BankTransfer => write!(f, "bank_transfer"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash_on_delivery" | "cash" => Ok(Self::CashOnDelivery),
            "mobile_money" | "momo" => Ok(Self::MobileMoney),
            "card" => Ok(Self::Card),
            "bank_transfer" => Ok(Self::BankTransfer),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}
