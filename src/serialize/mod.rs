//! contains representations of core datastructures that can be serialized

mod ser_program;

pub use self::ser_program::*;
