//! Book shelf model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Shelf record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookShelf {
    pub id: i32,
    pub name: String,
    pub location: String,
    /// Number of copies the shelf holds
    pub capacity: i32,
}

/// Shelf with current occupation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ShelfUsage {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub shelf: BookShelf,
    /// Distinct titles assigned to the shelf
    pub book_count: i64,
    /// Sum of total copies assigned to the shelf
    pub copies: i64,
    #[sqlx(skip)]
    pub usage_percent: f64,
}

impl ShelfUsage {
    pub fn with_usage(mut self) -> Self {
        self.usage_percent = usage_percent(self.copies, self.shelf.capacity);
        self
    }
}

/// Share of `capacity` taken by `copies`, rounded to one decimal. Zero-capacity
/// shelves report 0.
pub fn usage_percent(copies: i64, capacity: i32) -> f64 {
    if capacity <= 0 {
        return 0.0;
    }
    let pct = copies as f64 * 100.0 / capacity as f64;
    (pct * 10.0).round() / 10.0
}

/// Create shelf request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateShelf {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[validate(range(min = 0, message = "Capacity cannot be negative"))]
    pub capacity: i32,
}

/// Update shelf request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateShelf {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub location: Option<String>,
    #[validate(range(min = 0))]
    pub capacity: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_is_relative_to_capacity() {
        assert_eq!(usage_percent(25, 100), 25.0);
        assert_eq!(usage_percent(1, 3), 33.3);
        assert_eq!(usage_percent(12, 10), 120.0);
    }

    #[test]
    fn zero_capacity_reports_zero() {
        assert_eq!(usage_percent(5, 0), 0.0);
    }
}
