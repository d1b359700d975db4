//! Query filter and formula evaluation core for the recordkit SDK.
//!
//! This crate holds the two pieces of the SDK that do more than forward
//! requests:
//!
//! - [`filter`]: an editable predicate tree that serializes to the `Filter`
//!   payload of `list`/`count` requests.
//! - [`expression`]: an interpreter for computed-field formulas.
//!
//! # Quick Start
//!
//! ```
//! use recordkit_query::prelude::*;
//! use serde_json::json;
//!
//! let mut tree = FilterTree::new();
//! tree.add_condition(NewCondition::new(ConditionOperator::Equal, "status").value(json!("open")), None);
//!
//! let request = tree.to_list_request();
//! assert!(request.filter.is_some());
//! ```

pub mod expression;
pub mod filter;
pub mod prelude;
pub mod request;
