//! Reduced ordered binary decision diagrams with complemented edges

mod builder;
mod robdd;
mod stats;

pub use self::builder::*;
pub use self::robdd::*;
pub use self::stats::*;
