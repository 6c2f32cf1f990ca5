//! Domain layer - Pure business abstractions
//!
//! Repository traits, error types and the admin rules that do not depend on
//! a web framework: the price-range filter, changelist query parsing,
//! composite widgets, field validation and the site registry.

pub mod changelist;
pub mod errors;
pub mod price_range;
pub mod repositories;
pub mod site;
pub mod validation;
pub mod widgets;

pub use errors::{DomainError, FieldErrors, NON_FIELD_ERRORS};
pub use repositories::*;
