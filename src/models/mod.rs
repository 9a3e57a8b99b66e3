//! Data models for Lectern

pub mod assistant;
pub mod book;
pub mod borrow;
pub mod enums;
pub mod fine;
pub mod report;
pub mod shelf;
pub mod user;

// Re-export commonly used types
pub use book::Book;
pub use borrow::{BorrowRecord, BorrowRecordDetails};
pub use enums::{BorrowStatus, Role};
pub use fine::Fine;
pub use shelf::BookShelf;
pub use user::{User, UserShort};
