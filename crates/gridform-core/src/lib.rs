//! # gridform-core
//!
//! Core data structures for the gridform formula engine.
//!
//! This crate provides the fundamental types used throughout gridform:
//! - [`Value`] - Scalar values (numbers, strings, booleans, dates, empty)
//! - [`Record`] and [`FieldValue`] - A row of named field values, where a field may hold a
//!   [`SuperposedCell`] with several competing observations
//! - [`ValueResolver`] - Strategy that picks the dominant value of a superposed cell
//! - [`DisplayFormat`] - Display rendering of computed values
//!
//! ## Example
//!
//! ```rust
//! use gridform_core::{format_value, DisplayFormat, Record, Value};
//!
//! let mut record = Record::new();
//! record.set("Price", 100.0);
//! record.set("Name", "Widget");
//!
//! assert_eq!(record.scalar("Price"), Some(&Value::Number(100.0)));
//! assert_eq!(format_value(&Value::Number(0.256), DisplayFormat::Percentage, 1), "25.6%");
//! ```

pub mod error;
pub mod format;
pub mod record;
pub mod resolve;
pub mod value;

pub use error::{Error, Result};
pub use format::{format_value, DisplayFormat, MAX_DECIMALS};
pub use record::{FieldValue, Observation, Record, SuperposedCell};
pub use resolve::{MostRecentObservation, ValueResolver, ViewContext};
pub use value::{parse_date, Value};
