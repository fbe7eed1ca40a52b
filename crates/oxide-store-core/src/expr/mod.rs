//! Expressions and predicates for WHERE clauses.
//!
//! Predicates apply to the `value` column and its JSON content:
//!
//! ```rust
//! use oxide_store_core::expr::{and, eq, json_at_eq, starts_with};
//! use oxide_store_core::Dialect;
//!
//! let p = and([eq("X"), starts_with("Y")]);
//! assert_eq!(p.sql(Dialect::Sqlite), "(value = 'X') and (value like 'Y%')");
//!
//! let p = json_at_eq("a/b", "x");
//! assert_eq!(
//!     p.sql(Dialect::MySql),
//!     "json_unquote(json_extract(value,'$.a.b')) = 'x'"
//! );
//! ```
//!
//! The same tree renders with bound parameters through
//! [`BoolExpr::to_fragment`].

mod expression;
mod fragment;
mod path;
mod predicate;

pub use expression::Expression;
pub use fragment::{Binding, Fragment, Wildcards};
pub use path::normalize_json_path;
pub use predicate::{
    and, contains, ends_with, eq, gt, gte, json_at_contains, json_at_ends_with, json_at_eq,
    json_at_ge, json_at_gt, json_at_le, json_at_lt, json_at_starts_with, json_contains_path, lt,
    lte, ne, not, or, starts_with, BoolExpr, CompareOp, VALUE_COLUMN,
};
