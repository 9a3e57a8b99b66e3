//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Book from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    /// Stable public identifier
    pub uid: Uuid,
    pub name: String,
    pub author: String,
    pub categories: Vec<String>,
    pub shelf_id: Option<i32>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub published_year: Option<i32>,
    /// Cover image URL
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Book {
    pub fn in_stock(&self) -> bool {
        self.available_copies > 0
    }

    /// Copies currently lent out
    pub fn copies_out(&self) -> i32 {
        self.total_copies - self.available_copies
    }
}

/// Book search parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Matches name, author or ISBN
    pub search: Option<String>,
    pub category: Option<String>,
    pub shelf_id: Option<i32>,
    /// Only books with at least one available copy
    pub in_stock: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[allow(clippy::ptr_arg)]
fn validate_categories(categories: &Vec<String>) -> Result<(), ValidationError> {
    if categories.iter().any(|c| c.trim().is_empty()) {
        return Err(ValidationError::new("empty_category"));
    }
    Ok(())
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 500, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 300, message = "Author is required"))]
    pub author: String,
    #[serde(default)]
    #[validate(custom(function = "validate_categories"))]
    pub categories: Vec<String>,
    pub shelf_id: Option<i32>,
    /// Defaults to 1
    #[validate(range(min = 0, max = 100000, message = "Copies must be between 0 and 100000"))]
    pub total_copies: Option<i32>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    #[validate(range(min = 0, max = 3000))]
    pub published_year: Option<i32>,
    #[validate(url(message = "Cover image must be a URL"))]
    pub cover_image: Option<String>,
}

/// Update book request; absent fields are left unchanged, an explicit
/// `null` clears an optional field
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 500))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 300))]
    pub author: Option<String>,
    #[validate(custom(function = "validate_categories"))]
    pub categories: Option<Vec<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub shelf_id: Option<Option<i32>>,
    /// Shifts available copies by the same delta
    #[validate(range(min = 0, max = 100000))]
    pub total_copies: Option<i32>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub isbn: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub publisher: Option<Option<String>>,
    #[validate(range(min = 0, max = 3000))]
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub published_year: Option<Option<i32>>,
    #[validate(url)]
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub cover_image: Option<Option<String>>,
}

/// New value of a nullable column: unchanged when the field was absent,
/// otherwise whatever was sent, `null` included.
pub fn patched<T: Clone>(update: &Option<Option<T>>, current: &Option<T>) -> Option<T> {
    match update {
        Some(value) => value.clone(),
        None => current.clone(),
    }
}

/// Compute the available copies after changing the total from `old_total` to
/// `new_total`. Returns `None` when more copies are out than the new total allows.
pub fn rebalance_available(old_total: i32, old_available: i32, new_total: i32) -> Option<i32> {
    let available = old_available + (new_total - old_total);
    if available < 0 {
        None
    } else {
        Some(available.min(new_total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growing_stock_adds_available_copies() {
        assert_eq!(rebalance_available(3, 1, 5), Some(3));
    }

    #[test]
    fn shrinking_stock_keeps_lent_copies() {
        // two copies out, one on the shelf
        assert_eq!(rebalance_available(3, 1, 2), Some(0));
        assert_eq!(rebalance_available(3, 1, 1), None);
    }

    #[test]
    fn empty_category_is_rejected() {
        let book = CreateBook {
            name: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            categories: vec!["sf".to_string(), " ".to_string()],
            shelf_id: None,
            total_copies: Some(2),
            isbn: None,
            publisher: None,
            published_year: Some(1965),
            cover_image: None,
        };
        assert!(book.validate().is_err());
    }

    #[test]
    fn null_clears_and_absent_keeps() {
        let update: UpdateBook =
            serde_json::from_str(r#"{"shelf_id": null, "isbn": "978-0441013593"}"#).unwrap();
        assert_eq!(update.shelf_id, Some(None));
        assert_eq!(update.isbn, Some(Some("978-0441013593".to_string())));
        assert_eq!(update.publisher, None);

        assert_eq!(patched(&update.shelf_id, &Some(4)), None);
        assert_eq!(patched(&update.publisher, &Some("Ace".to_string())), Some("Ace".to_string()));
        assert_eq!(
            patched(&update.isbn, &None),
            Some("978-0441013593".to_string())
        );
    }

    #[test]
    fn invalid_cover_url_is_rejected() {
        let update = UpdateBook {
            cover_image: Some(Some("not a url".to_string())),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let cleared = UpdateBook {
            cover_image: Some(None),
            ..Default::default()
        };
        assert!(cleared.validate().is_ok());
    }

    #[test]
    fn negative_copies_are_rejected() {
        let update = UpdateBook {
            total_copies: Some(-1),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
