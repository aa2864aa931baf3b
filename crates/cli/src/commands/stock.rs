//! Stock catalogue commands.
//!
//! # Usage
//!
//! ```bash
//! # Replace the whole catalogue
//! uephone-cli stock import stock.json
//!
//! # Insert or update by id, keeping other items
//! uephone-cli stock import stock.json --keep-existing
//!
//! uephone-cli stock list
//! ```
//!
//! The import file is a JSON array of items in the `POST /api/import-stock`
//! shape.

use std::path::Path;

use uephone_storefront::db::StockRepository;
use uephone_storefront::models::stock::{NewStockItem, StockFilter};

use super::{CommandError, connect};

/// Import a stock file.
///
/// Every item is validated before the database is touched.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or a write fails.
pub async fn import(path: &Path, keep_existing: bool) -> Result<(), CommandError> {
    let items = read_items(path).await?;
    tracing::info!(count = items.len(), path = %path.display(), "Parsed stock file");

    let pool = connect().await?;
    let repo = StockRepository::new(&pool);

    if keep_existing {
        let count = repo.upsert_all(&items).await?;
        tracing::info!(count, "Stock items merged into catalogue");
    } else {
        let report = repo.replace_all(&items).await?;
        tracing::info!(
            written = report.written,
            retired = report.retired,
            "Stock items imported successfully"
        );
    }
    Ok(())
}

/// Log a one-line summary per catalogue item.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;
    let items = StockRepository::new(&pool)
        .list(&StockFilter::default())
        .await?;

    for item in &items {
        tracing::info!(
            id = %item.id,
            grade = %item.grade,
            location = %item.location,
            price = %item.price,
            quantity = item.quantity,
            "{}",
            item.name
        );
    }

    let units: i64 = items.iter().map(|item| i64::from(item.quantity)).sum();
    tracing::info!(items = items.len(), units, "Catalogue summary");
    Ok(())
}

async fn read_items(path: &Path) -> Result<Vec<NewStockItem>, CommandError> {
    let content =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CommandError::ReadFile {
                path: path.display().to_string(),
                source,
            })?;
    parse_items(&content)
}

fn parse_items(content: &str) -> Result<Vec<NewStockItem>, CommandError> {
    let items: Vec<NewStockItem> = serde_json::from_str(content)?;

    for (index, item) in items.iter().enumerate() {
        item.validate()
            .map_err(|e| CommandError::InvalidStockItem {
                index,
                message: e.to_string(),
            })?;
    }

    Ok(items)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_items_keeps_ids() {
        let items = parse_items(
            r#"[
                {"id": 7, "name": "iPhone 13 128GB", "price": "310.00", "quantity": 40,
                 "grade": "A", "location": "Hong Kong"},
                {"name": "Galaxy S22", "price": "205.50", "quantity": 0,
                 "grade": "B", "location": "Dubai", "image_url": null}
            ]"#,
        )
        .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id.map(|id| id.as_i32()), Some(7));
        assert!(items[1].id.is_none());
    }

    #[test]
    fn test_parse_items_rejects_bad_item() {
        let err = parse_items(
            r#"[{"name": "Pixel 7", "price": "0", "quantity": 3,
                 "grade": "A", "location": "Miami"}]"#,
        )
        .unwrap_err();

        assert!(matches!(err, CommandError::InvalidStockItem { index: 0, .. }));
    }

    #[test]
    fn test_parse_items_rejects_non_array() {
        assert!(matches!(
            parse_items(r#"{"name": "iPhone"}"#),
            Err(CommandError::InvalidStockFile(_))
        ));
    }
}
