//! Backing stores are unique tables which support a `get_or_insert` operation.
mod bdd_table;

pub use self::bdd_table::*;

use std::hash::Hash;

pub trait UniqueTable<T: Eq + PartialEq + Hash> {
    /// Returns the index of `item`, inserting it if it is new
    fn get_or_insert(&mut self, item: T) -> usize;
    fn get(&self, idx: usize) -> &T;
    fn num_nodes(&self) -> usize;
}
