//! Store settings shown on the payment page.

use serde::{Deserialize, Serialize};

/// Bank details customers pay into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    pub routing_number: String,
    pub swift_code: String,
}

/// Body of `PUT /api/settings`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettingsUpdate {
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub routing_number: Option<String>,
    pub swift_code: Option<String>,
}
