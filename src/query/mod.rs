//! Query building and execution.
//!
//! # Architecture
//!
//! - **Builder**: `QueryBuilder` accumulates aliases, joins, the select list
//!   and predicates
//! - **Spec**: `build()` resolves everything into an immutable `QuerySpec`
//! - **Params / Predicate**: named `:param` binding and the predicate tree
//! - **Execution**: `get_many`, `get_one`, `get_raw_many`, `get_count`, ...
//!
//! # Examples
//!
//! ```no_run
//! use driftwood::{params, DataSource, Order, Result};
//!
//! # fn demo(ds: &DataSource) -> Result<()> {
//! let posts = ds
//!     .query_builder("Post", "p")?
//!     .left_join_table("category", "c", "p.category_id = c.id")
//!     .add_select_as("c.name", "p_category_name")
//!     .filter("p.title LIKE :title", params! { "title" => "%rust%" })
//!     .order_by("p.id", Order::Desc)
//!     .get_many()?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod execution;
pub(crate) mod params;
mod predicate;
mod spec;

pub use builder::QueryBuilder;
pub use params::Params;
pub use predicate::Predicate;
pub use sea_query::Order;
pub use spec::{BindingOwner, JoinKind, JoinSpec, JoinTarget, QuerySpec, SelectBinding, SelectSource};
