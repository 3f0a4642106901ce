//! A unique table for BDD nodes: nodes are stored densely in a vector and
//! deduplicated through a hash map from node to index.

use super::UniqueTable;
use crate::repr::BddNode;
use rustc_hash::FxHashMap;

const DEFAULT_TABLE_SZ: usize = 1 << 10;

#[derive(Debug)]
pub struct BddTable {
    nodes: Vec<BddNode>,
    index: FxHashMap<BddNode, usize>,
}

impl BddTable {
    pub fn new() -> BddTable {
        BddTable {
            nodes: Vec::with_capacity(DEFAULT_TABLE_SZ),
            index: FxHashMap::default(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BddNode> + '_ {
        self.nodes.iter()
    }
}

impl Default for BddTable {
    fn default() -> Self {
        Self::new()
    }
}

impl UniqueTable<BddNode> for BddTable {
    fn get_or_insert(&mut self, item: BddNode) -> usize {
        if let Some(idx) = self.index.get(&item) {
            return *idx;
        }
        self.nodes.push(item);
        let idx = self.nodes.len() - 1;
        self.index.insert(item, idx);
        idx
    }

    fn get(&self, idx: usize) -> &BddNode {
        &self.nodes[idx]
    }

    fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::{BddPtr, VarLabel};

    #[test]
    fn nodes_are_shared() {
        let mut tbl = BddTable::new();
        let n = BddNode::new(VarLabel::new(0), BddPtr::false_ptr(), BddPtr::true_ptr());
        let m = BddNode::new(VarLabel::new(1), BddPtr::false_ptr(), BddPtr::true_ptr());
        let a = tbl.get_or_insert(n);
        let b = tbl.get_or_insert(m);
        assert_ne!(a, b);
        assert_eq!(tbl.get_or_insert(n), a);
        assert_eq!(tbl.num_nodes(), 2);
        assert_eq!(*tbl.get(b), m);
    }
}
