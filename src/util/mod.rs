//! Useful utilities and generic data structures used throughout the library

pub mod semirings;
