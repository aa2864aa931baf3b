//! Customer account types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use uephone_core::{CustomsClearance, Email, SalesRep, UserId};

/// A registered wholesale customer (domain type).
///
/// The password hash never leaves the repository layer.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub business_name: String,
    pub phone_number: String,
    pub whatsapp_number: Option<String>,
    pub country: String,
    pub sales_rep: SalesRep,
    pub customs_clearance: CustomsClearance,
    pub buying_interest: String,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Name used in notifications and chat.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Profile fields collected at registration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub sales_rep: SalesRep,
    #[serde(default)]
    pub customs_clearance: CustomsClearance,
    #[serde(default)]
    pub buying_interest: String,
}

/// Body of `PUT /api/auth/me`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub business_name: Option<String>,
    pub phone_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub country: Option<String>,
    pub sales_rep: Option<SalesRep>,
    pub customs_clearance: Option<CustomsClearance>,
    pub buying_interest: Option<String>,
}
