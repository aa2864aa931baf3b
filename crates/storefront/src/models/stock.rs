//! Stock catalogue types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use uephone_core::{CartLine, CartLineId, StockItemId};

/// A phone listing in the catalogue. Prices are USD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockItem {
    pub id: StockItemId,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    /// Condition grade, for example `A+/A`.
    pub grade: String,
    /// Warehouse location, for example `HongKong`.
    pub location: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockItem {
    /// A cart line for `quantity` units of this phone at `unit_price`.
    ///
    /// The line id is assigned when the line is stored.
    #[must_use]
    pub fn cart_line(&self, unit_price: Decimal, quantity: i32) -> CartLine {
        CartLine {
            id: CartLineId::new(0),
            stock_item_id: self.id,
            name: self.name.clone(),
            grade: self.grade.clone(),
            location: self.location.clone(),
            unit_price,
            quantity,
            offer_id: None,
            offered_quantity: None,
            image_url: None,
        }
    }
}

/// Reasons a stock item write is refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("price must be greater than zero")]
    NonPositivePrice,
    #[error("quantity must not be negative")]
    NegativeQuantity,
}

/// Body of `POST /api/stock` and one element of a stock import.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewStockItem {
    /// Only honoured by imports, which keep catalogue ids stable.
    #[serde(default)]
    pub id: Option<StockItemId>,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub grade: String,
    pub location: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewStockItem {
    /// # Errors
    ///
    /// Returns the first field that breaks the catalogue rules.
    pub fn validate(&self) -> Result<(), StockValidationError> {
        validate_fields(Some(&self.name), Some(self.price), Some(self.quantity))
    }
}

/// Body of `PUT /api/stock/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockItemUpdate {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub grade: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
}

impl StockItemUpdate {
    /// # Errors
    ///
    /// Returns the first present field that breaks the catalogue rules.
    pub fn validate(&self) -> Result<(), StockValidationError> {
        validate_fields(self.name.as_deref(), self.price, self.quantity)
    }
}

fn validate_fields(
    name: Option<&str>,
    price: Option<Decimal>,
    quantity: Option<i32>,
) -> Result<(), StockValidationError> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err(StockValidationError::EmptyName);
    }
    if price.is_some_and(|p| p <= Decimal::ZERO) {
        return Err(StockValidationError::NonPositivePrice);
    }
    if quantity.is_some_and(|q| q < 0) {
        return Err(StockValidationError::NegativeQuantity);
    }
    Ok(())
}

/// Query parameters accepted by `GET /api/stock`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockFilter {
    pub grade: Option<String>,
    pub location: Option<String>,
    /// Case-insensitive substring of the name.
    pub q: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub in_stock: bool,
    /// Display currency code. Adds `display_price` to each item.
    pub currency: Option<String>,
}

/// Item counts for the catalogue filter sidebar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockFacets {
    pub grades: Vec<FacetCount>,
    pub locations: Vec<FacetCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    pub value: String,
    pub count: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_item() -> NewStockItem {
        NewStockItem {
            id: None,
            name: "iPhone 13 Pro 128GB".to_string(),
            price: Decimal::new(42_500, 2),
            quantity: 12,
            grade: "A+/A".to_string(),
            location: "HongKong".to_string(),
            image_url: None,
        }
    }

    #[test]
    fn test_cart_line_copies_listing() {
        let item = StockItem {
            id: StockItemId::new(4),
            name: "Pixel 7".to_string(),
            price: Decimal::new(21_000, 2),
            quantity: 9,
            grade: "B".to_string(),
            location: "Dubai".to_string(),
            image_url: Some("https://img.example/pixel.jpg".to_string()),
            created_at: Utc::now(),
        };

        let line = item.cart_line(Decimal::new(19_000, 2), 3);
        assert_eq!(line.stock_item_id, item.id);
        assert_eq!(line.name, "Pixel 7");
        assert_eq!(line.location, "Dubai");
        assert_eq!(line.unit_price, Decimal::new(19_000, 2));
        assert_eq!(line.quantity, 3);
        assert!(line.offer_id.is_none());
        assert!(line.image_url.is_none());
    }

    #[test]
    fn test_new_item_validation() {
        assert_eq!(new_item().validate(), Ok(()));

        let mut item = new_item();
        item.name = "   ".to_string();
        assert_eq!(item.validate(), Err(StockValidationError::EmptyName));

        let mut item = new_item();
        item.price = Decimal::ZERO;
        assert_eq!(item.validate(), Err(StockValidationError::NonPositivePrice));

        let mut item = new_item();
        item.quantity = -1;
        assert_eq!(item.validate(), Err(StockValidationError::NegativeQuantity));
    }

    #[test]
    fn test_partial_update_only_checks_present_fields() {
        assert_eq!(StockItemUpdate::default().validate(), Ok(()));

        let update = StockItemUpdate {
            quantity: Some(0),
            ..Default::default()
        };
        assert_eq!(update.validate(), Ok(()));

        let update = StockItemUpdate {
            price: Some(Decimal::new(-1, 0)),
            ..Default::default()
        };
        assert_eq!(update.validate(), Err(StockValidationError::NonPositivePrice));
    }

    #[test]
    fn test_import_payload_accepts_numeric_prices() {
        let items: Vec<NewStockItem> = serde_json::from_str(
            r#"[{"id": 7, "name": "Galaxy S22", "price": 310.5, "quantity": 4, "grade": "B", "location": "Dubai"}]"#,
        )
        .unwrap();

        assert_eq!(items[0].id, Some(StockItemId::new(7)));
        assert_eq!(items[0].price, Decimal::new(3105, 1));
        assert!(items[0].image_url.is_none());
    }
}
