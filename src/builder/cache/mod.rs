mod all_app;
mod ite;

pub use self::all_app::*;
pub use self::ite::*;

use crate::repr::BddPtr;

pub trait IteTable {
    fn insert(&mut self, ite: Ite, res: BddPtr);
    fn get(&self, ite: Ite) -> Option<BddPtr>;
    fn num_entries(&self) -> usize;
}
