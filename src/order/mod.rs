//! Order construction and formatting.

pub mod builder;
pub mod format;
pub mod model;

pub use builder::{BuiltOrder, OrderBuilder};
pub use model::{CategoryGroup, Order, OrderStatus, TEXT_INPUT_REF, group_by_category};
