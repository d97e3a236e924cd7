//! # Attribute System
//!
//! Documents carry a typed, ordered bag of attributes. This module provides:
//!
//! - **Values**: [`AttrValue`], the runtime representation of an attribute
//! - **Declarations**: [`AttributeSpec`] / [`AttributeKind`], what a document
//!   type accepts
//! - **Storage**: [`AttributeStore`], the ordered mapping with absent/set
//!   semantics
//!
//! ## Attribute Kinds
//!
//! | Kind | Text form | JSON form |
//! |------|-----------|-----------|
//! | `Text` | as-is | string |
//! | `Integer` | `42` | number |
//! | `Float` | `0.25` | number |
//! | `Bool` | `true` / `false` | bool |
//! | `List` | `a, b, c` | array of strings |
//!
//! ## Absent vs. Set
//!
//! An attribute that was never assigned is not in the store at all, so it is
//! never written to disk. Exporting a document therefore yields exactly the
//! attributes somebody set, in the order they were first set.

mod spec;
mod store;
mod value;

pub use spec::{find_spec, AttributeKind, AttributeSpec};
pub use store::AttributeStore;
pub use value::AttrValue;
