//! Negation normal form circuits as produced by top-down knowledge compilers.
//! A circuit is a flat vector of nodes where every child occurs before its
//! parents; the last node (or an explicit root) is the output.
//!
//! Circuits are assumed to be deterministic and decomposable (d-DNNF), but not
//! necessarily smooth: [`NnfCircuit::wmc`] smooths on the fly.

use crate::{
    repr::{Literal, VarLabel, WmcParams},
    util::semirings::Semiring,
};
use bit_set::BitSet;
use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NnfNode {
    True,
    False,
    Lit(Literal),
    And(Vec<usize>),
    Or(Vec<usize>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NnfParseError {
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("node {0} is referenced but never defined")]
    UndefinedNode(usize),
    #[error("the circuit has no nodes")]
    Empty,
}

#[derive(Debug, Clone)]
pub struct NnfCircuit {
    nodes: Vec<NnfNode>,
    root: usize,
    num_vars: usize,
}

impl NnfCircuit {
    /// Construct a circuit over the variables `0..num_vars`. Children must
    /// precede their parents in `nodes`.
    pub fn new(nodes: Vec<NnfNode>, root: usize, num_vars: usize) -> NnfCircuit {
        debug_assert!(root < nodes.len());
        NnfCircuit {
            nodes,
            root,
            num_vars,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn nodes(&self) -> &[NnfNode] {
        &self.nodes
    }

    /// Smoothed weighted model count of the circuit. Variables that do not
    /// occur below an Or-child are multiplied back in with their total weight,
    /// as are variables of `0..num_vars` that the root never mentions.
    /// ```
    /// # use whatif::repr::{Literal, NnfCircuit, NnfNode, VarLabel, WmcParams};
    /// # use whatif::util::semirings::RealSemiring;
    /// let x = Literal::new(VarLabel::new(0), true);
    /// let circuit = NnfCircuit::new(vec![NnfNode::Lit(x)], 0, 2);
    /// let mut params = WmcParams::default();
    /// params.set_weight(VarLabel::new(0), RealSemiring(0.7), RealSemiring(0.3));
    /// params.set_weight(VarLabel::new(1), RealSemiring(0.5), RealSemiring(0.5));
    /// assert!((circuit.wmc(&params).0 - 0.3).abs() < 1e-12);
    /// ```
    pub fn wmc<T: Semiring>(&self, params: &WmcParams<T>) -> T {
        let mut values: Vec<T> = Vec::with_capacity(self.nodes.len());
        let mut scopes: Vec<BitSet> = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.iter() {
            let (v, scope) = match node {
                NnfNode::True => (params.one, BitSet::new()),
                NnfNode::False => (params.zero, BitSet::new()),
                NnfNode::Lit(l) => {
                    let (low, high) = params.var_weight(l.label());
                    let mut scope = BitSet::new();
                    scope.insert(l.label().value_usize());
                    (if l.polarity() { high } else { low }, scope)
                }
                NnfNode::And(children) => {
                    let mut v = params.one;
                    let mut scope = BitSet::new();
                    for &c in children {
                        v = v * values[c];
                        scope.union_with(&scopes[c]);
                    }
                    (v, scope)
                }
                NnfNode::Or(children) => {
                    let mut scope = BitSet::new();
                    for &c in children {
                        scope.union_with(&scopes[c]);
                    }
                    let mut v = params.zero;
                    for &c in children {
                        let missing = smooth(params, scope.difference(&scopes[c]));
                        v = v + values[c] * missing;
                    }
                    (v, scope)
                }
            };
            values.push(v);
            scopes.push(scope);
        }
        let root_scope = &scopes[self.root];
        let unmentioned = (0..self.num_vars).filter(|v| !root_scope.contains(*v));
        values[self.root] * smooth(params, unmentioned)
    }

    /// Parses the c2d `.nnf` format:
    /// ```text
    /// nnf <nodes> <edges> <vars>
    /// L <dimacs literal>
    /// A <count> <children...>
    /// O <decision var> <count> <children...>
    /// ```
    /// Nodes are numbered by line from 0 and the last node is the root.
    /// `A 0` is true and `O 0 0` is false.
    pub fn parse_c2d(input: &str, num_vars: usize) -> Result<NnfCircuit, NnfParseError> {
        let mut nodes = Vec::new();
        let mut declared_vars = 0;
        for (line_no, line) in input.lines().enumerate() {
            let line_no = line_no + 1;
            let mut toks = line.split_whitespace();
            let kind = match toks.next() {
                None | Some("c") => continue,
                Some(k) => k,
            };
            let nums = toks
                .map(|t| {
                    t.parse::<i64>().map_err(|_| NnfParseError::Malformed {
                        line: line_no,
                        reason: format!("expected an integer, found `{}`", t),
                    })
                })
                .collect::<Result<Vec<i64>, _>>()?;
            let malformed = |reason: &str| NnfParseError::Malformed {
                line: line_no,
                reason: reason.to_string(),
            };
            let node = match kind {
                "nnf" => {
                    declared_vars = *nums.get(2).ok_or_else(|| malformed("short header"))? as usize;
                    continue;
                }
                "L" => {
                    let lit = nums.first().copied().unwrap_or(0);
                    NnfNode::Lit(Literal::from_dimacs(lit).ok_or_else(|| malformed("literal 0"))?)
                }
                "A" | "O" => {
                    let skip = if kind == "A" { 0 } else { 1 };
                    let count = *nums.get(skip).ok_or_else(|| malformed("missing child count"))?;
                    let children = &nums[usize::min(skip + 1, nums.len())..];
                    if children.len() != count as usize {
                        return Err(malformed("child count does not match"));
                    }
                    let mut ids = Vec::with_capacity(children.len());
                    for &c in children {
                        let c = c as usize;
                        if c >= nodes.len() {
                            return Err(NnfParseError::UndefinedNode(c));
                        }
                        ids.push(c);
                    }
                    match (kind, ids.is_empty()) {
                        ("A", true) => NnfNode::True,
                        ("O", true) => NnfNode::False,
                        ("A", false) => NnfNode::And(ids),
                        _ => NnfNode::Or(ids),
                    }
                }
                other => return Err(malformed(&format!("unknown node kind `{}`", other))),
            };
            nodes.push(node);
        }
        if nodes.is_empty() {
            return Err(NnfParseError::Empty);
        }
        let root = nodes.len() - 1;
        Ok(NnfCircuit::new(
            nodes,
            root,
            usize::max(num_vars, declared_vars),
        ))
    }

    /// Parses the d4 node/edge format:
    /// ```text
    /// o 1 0
    /// t 2 0
    /// 1 2 -1 3 0
    /// ```
    /// Node lines are `o`, `a`, `t` or `f` followed by an id; edge lines are
    /// `<parent> <child> <literals...> 0`, the child conjoined with the
    /// literals. Node 1 is the root.
    pub fn parse_d4(input: &str, num_vars: usize) -> Result<NnfCircuit, NnfParseError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Kind {
            Or,
            And,
            True,
            False,
        }
        let mut kinds: FxHashMap<usize, Kind> = FxHashMap::default();
        let mut edges: FxHashMap<usize, Vec<(usize, Vec<Literal>)>> = FxHashMap::default();
        for (line_no, line) in input.lines().enumerate() {
            let line_no = line_no + 1;
            let toks: Vec<&str> = line.split_whitespace().collect();
            if toks.is_empty() || toks[0] == "c" {
                continue;
            }
            let malformed = |reason: String| NnfParseError::Malformed {
                line: line_no,
                reason,
            };
            let parse = |t: &str| {
                t.parse::<i64>()
                    .map_err(|_| malformed(format!("expected an integer, found `{}`", t)))
            };
            let kind = match toks[0] {
                "o" => Some(Kind::Or),
                "a" => Some(Kind::And),
                "t" => Some(Kind::True),
                "f" => Some(Kind::False),
                _ => None,
            };
            match kind {
                Some(k) => {
                    let id = toks
                        .get(1)
                        .ok_or_else(|| malformed("missing node id".to_string()))
                        .and_then(|t| parse(*t))?;
                    kinds.insert(id as usize, k);
                }
                None => {
                    let nums = toks.iter().map(|t| parse(*t)).collect::<Result<Vec<_>, _>>()?;
                    if nums.len() < 3 || nums[nums.len() - 1] != 0 {
                        return Err(malformed("edge must be `src dst lits... 0`".to_string()));
                    }
                    let lits = nums[2..nums.len() - 1]
                        .iter()
                        .filter_map(|&l| Literal::from_dimacs(l))
                        .collect();
                    edges
                        .entry(nums[0] as usize)
                        .or_default()
                        .push((nums[1] as usize, lits));
                }
            }
        }
        if kinds.is_empty() {
            return Err(NnfParseError::Empty);
        }

        // post-order from the root so that children precede parents
        let mut nodes: Vec<NnfNode> = Vec::new();
        let mut placed: FxHashMap<usize, usize> = FxHashMap::default();
        let mut lit_nodes: FxHashMap<Literal, usize> = FxHashMap::default();
        let mut stack: Vec<(usize, bool)> = vec![(1, false)];
        while let Some((id, expanded)) = stack.pop() {
            if placed.contains_key(&id) {
                continue;
            }
            let kind = *kinds.get(&id).ok_or(NnfParseError::UndefinedNode(id))?;
            let out = edges.get(&id).map(Vec::as_slice).unwrap_or(&[]);
            if !expanded {
                stack.push((id, true));
                for (child, _) in out.iter().rev() {
                    if !placed.contains_key(child) {
                        stack.push((*child, false));
                    }
                }
                continue;
            }
            let node = match kind {
                Kind::True => NnfNode::True,
                Kind::False => NnfNode::False,
                Kind::Or | Kind::And => {
                    let mut children = Vec::with_capacity(out.len());
                    for (child, lits) in out.iter() {
                        let child_idx = *placed
                            .get(child)
                            .ok_or(NnfParseError::UndefinedNode(*child))?;
                        if lits.is_empty() {
                            children.push(child_idx);
                            continue;
                        }
                        let mut conj = Vec::with_capacity(lits.len() + 1);
                        for l in lits {
                            let idx = *lit_nodes.entry(*l).or_insert_with(|| {
                                nodes.push(NnfNode::Lit(*l));
                                nodes.len() - 1
                            });
                            conj.push(idx);
                        }
                        conj.push(child_idx);
                        nodes.push(NnfNode::And(conj));
                        children.push(nodes.len() - 1);
                    }
                    match kind {
                        Kind::And if children.is_empty() => NnfNode::True,
                        Kind::And => NnfNode::And(children),
                        _ if children.is_empty() => NnfNode::False,
                        _ => NnfNode::Or(children),
                    }
                }
            };
            nodes.push(node);
            placed.insert(id, nodes.len() - 1);
        }
        let root = nodes.len() - 1;
        Ok(NnfCircuit::new(nodes, root, num_vars))
    }
}

fn smooth<T: Semiring>(params: &WmcParams<T>, vars: impl Iterator<Item = usize>) -> T {
    vars.fold(params.one, |acc, v| {
        acc * params.smoothing_weight(VarLabel::new_usize(v))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::semirings::RealSemiring;

    fn uniform(num_vars: usize) -> WmcParams<RealSemiring> {
        let mut params = WmcParams::default();
        for v in 0..num_vars {
            params.set_weight(VarLabel::new_usize(v), RealSemiring(0.5), RealSemiring(0.5));
        }
        params
    }

    #[test]
    fn c2d_or_of_two_literals() {
        // (x1 & x2) | (!x1), decision on x1
        let src = "nnf 6 4 2\nL 1\nL 2\nA 2 0 1\nL -1\nO 1 2 2 3\n";
        let circuit = NnfCircuit::parse_c2d(src, 2).unwrap();
        assert_eq!(circuit.num_nodes(), 5);
        let wmc = circuit.wmc(&uniform(2)).0;
        // !x1 branch is smoothed over x2
        assert!((wmc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn c2d_constants() {
        let t = NnfCircuit::parse_c2d("nnf 1 0 3\nA 0\n", 0).unwrap();
        assert!((t.wmc(&uniform(3)).0 - 1.0).abs() < 1e-12);
        let f = NnfCircuit::parse_c2d("nnf 1 0 3\nO 0 0\n", 0).unwrap();
        assert_eq!(f.wmc(&uniform(3)).0, 0.0);
    }

    #[test]
    fn c2d_rejects_forward_references() {
        let r = NnfCircuit::parse_c2d("nnf 2 1 1\nA 1 1\nL 1\n", 1);
        assert_eq!(r.unwrap_err(), NnfParseError::UndefinedNode(1));
    }

    #[test]
    fn d4_decision_on_first_var() {
        // root or-node with two edges: (x1 & T) and (!x1 & x2 & T)
        let src = "o 1 0\nt 2 0\n1 2 1 0\n1 2 -1 2 0\n";
        let circuit = NnfCircuit::parse_d4(src, 2).unwrap();
        let mut params = uniform(2);
        params.set_weight(VarLabel::new(0), RealSemiring(0.6), RealSemiring(0.4));
        params.set_weight(VarLabel::new(1), RealSemiring(0.1), RealSemiring(0.9));
        // 0.4 + 0.6 * 0.9
        assert!((circuit.wmc(&params).0 - 0.94).abs() < 1e-12);
    }

    #[test]
    fn d4_false_root() {
        let circuit = NnfCircuit::parse_d4("f 1 0\n", 4).unwrap();
        assert_eq!(circuit.wmc(&uniform(4)).0, 0.0);
    }

    #[test]
    fn d4_missing_root() {
        let r = NnfCircuit::parse_d4("t 2 0\n", 1);
        assert_eq!(r.unwrap_err(), NnfParseError::UndefinedNode(1));
    }
}
