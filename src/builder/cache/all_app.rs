//! Apply cache for BDD operations that stores all ITEs

use crate::{
    builder::cache::{Ite, IteTable},
    repr::BddPtr,
};
use rustc_hash::FxHashMap;

/// An Ite structure, assumed to be in standard form.
/// The top-level data structure that caches applications
#[derive(Debug)]
pub struct AllIteTable {
    table: FxHashMap<(BddPtr, BddPtr, BddPtr), BddPtr>,
}

impl IteTable for AllIteTable {
    /// Insert an ite (f, g, h) into the apply table; `res` is the result of
    /// the ite before standardization
    fn insert(&mut self, ite: Ite, res: BddPtr) {
        match ite {
            Ite::IteChoice { f, g, h } | Ite::IteComplChoice { f, g, h } => {
                // convert the ITE into a canonical form
                let compl = ite.is_compl_choice();
                self.table
                    .insert((f, g, h), if compl { res.neg() } else { res });
            }
            Ite::IteConst(_) => (), // do not cache base-cases
        }
    }

    fn get(&self, ite: Ite) -> Option<BddPtr> {
        match ite {
            Ite::IteChoice { f, g, h } | Ite::IteComplChoice { f, g, h } => {
                let r = self.table.get(&(f, g, h));
                if ite.is_compl_choice() {
                    r.map(|v| v.neg())
                } else {
                    r.cloned()
                }
            }
            Ite::IteConst(f) => Some(f),
        }
    }

    fn num_entries(&self) -> usize {
        self.table.len()
    }
}

impl AllIteTable {
    fn new() -> AllIteTable {
        AllIteTable {
            table: FxHashMap::default(),
        }
    }
}

impl Default for AllIteTable {
    fn default() -> AllIteTable {
        Self::new()
    }
}
