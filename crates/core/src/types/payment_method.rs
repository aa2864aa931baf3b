//! Accepted payment methods.
//!
//! Payments are confirmed by hand, so a method is only a label plus the
//! grouping used on the checkout page.

use serde::{Deserialize, Serialize};

use super::status::ParseStatusError;

/// How a group of payment methods is presented at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodGroup {
    Bank,
    Crypto,
    Mobile,
    Transfer,
    Other,
}

/// A payment method a customer can pick for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Fps,
    Bitcoin,
    Usdt,
    Alipay,
    Wechat,
    WesternUnion,
    Ria,
    Paypal,
    ApplePay,
    CreditCard,
}

impl PaymentMethod {
    /// Every accepted method, in checkout display order.
    pub const ALL: [Self; 11] = [
        Self::BankTransfer,
        Self::Fps,
        Self::Bitcoin,
        Self::Usdt,
        Self::Alipay,
        Self::Wechat,
        Self::WesternUnion,
        Self::Ria,
        Self::Paypal,
        Self::ApplePay,
        Self::CreditCard,
    ];

    /// Stored identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BankTransfer => "bank_transfer",
            Self::Fps => "fps",
            Self::Bitcoin => "bitcoin",
            Self::Usdt => "usdt",
            Self::Alipay => "alipay",
            Self::Wechat => "wechat",
            Self::WesternUnion => "western_union",
            Self::Ria => "ria",
            Self::Paypal => "paypal",
            Self::ApplePay => "apple_pay",
            Self::CreditCard => "credit_card",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::BankTransfer => "Bank Transfer",
            Self::Fps => "FPS (Faster Payment System)",
            Self::Bitcoin => "Bitcoin",
            Self::Usdt => "USDT (Tether)",
            Self::Alipay => "Alipay",
            Self::Wechat => "WeChat Pay",
            Self::WesternUnion => "Western Union",
            Self::Ria => "Ria Money Transfer",
            Self::Paypal => "PayPal",
            Self::ApplePay => "Apple Pay",
            Self::CreditCard => "Credit Card",
        }
    }

    #[must_use]
    pub const fn group(self) -> PaymentMethodGroup {
        match self {
            Self::BankTransfer | Self::Fps => PaymentMethodGroup::Bank,
            Self::Bitcoin | Self::Usdt => PaymentMethodGroup::Crypto,
            Self::Alipay | Self::Wechat | Self::ApplePay => PaymentMethodGroup::Mobile,
            Self::WesternUnion | Self::Ria => PaymentMethodGroup::Transfer,
            Self::Paypal | Self::CreditCard => PaymentMethodGroup::Other,
        }
    }
}

impl core::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for PaymentMethod {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| ParseStatusError {
                kind: "payment method",
                value: s.to_owned(),
            })
    }
}
