//! Export functionality for stockist purchase orders.

mod orders;

pub use orders::*;
