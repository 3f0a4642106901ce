//! Ground probabilistic logic programs: an indexed table of atoms (each either
//! derived by rules or guessed with a probability) and a list of rules over
//! them.

use rustc_hash::FxHashMap;
use std::fmt;

/// Identifier of an atom; an index into its [`AtomSpace`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(usize);

impl AtomId {
    pub fn new(idx: usize) -> AtomId {
        AtomId(idx)
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AtomKind {
    /// true iff some rule with this head fires
    Derived,
    /// an independent choice that is true with the given probability
    Guessed(f64),
}

impl AtomKind {
    pub fn is_guessed(&self) -> bool {
        matches!(self, AtomKind::Guessed(_))
    }

    pub fn probability(&self) -> Option<f64> {
        match self {
            AtomKind::Guessed(p) => Some(*p),
            AtomKind::Derived => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    name: String,
    kind: AtomKind,
}

impl Atom {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AtomKind {
        self.kind
    }
}

/// An atom together with the truth value it asserts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomLiteral {
    atom: AtomId,
    polarity: bool,
}

impl AtomLiteral {
    pub fn new(atom: AtomId, polarity: bool) -> AtomLiteral {
        AtomLiteral { atom, polarity }
    }

    pub fn pos(atom: AtomId) -> AtomLiteral {
        AtomLiteral::new(atom, true)
    }

    pub fn neg(atom: AtomId) -> AtomLiteral {
        AtomLiteral::new(atom, false)
    }

    pub fn atom(&self) -> AtomId {
        self.atom
    }

    pub fn polarity(&self) -> bool {
        self.polarity
    }

    pub fn negated(&self) -> AtomLiteral {
        AtomLiteral::new(self.atom, !self.polarity)
    }
}

/// A normal rule `head :- body` or, without a head, a constraint `:- body`
/// that forbids every world in which the whole body holds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    pub head: Option<AtomId>,
    pub body: Vec<AtomLiteral>,
}

impl Rule {
    pub fn new(head: Option<AtomId>, body: Vec<AtomLiteral>) -> Rule {
        Rule { head, body }
    }

    pub fn fact(head: AtomId) -> Rule {
        Rule::new(Some(head), Vec::new())
    }

    pub fn constraint(body: Vec<AtomLiteral>) -> Rule {
        Rule::new(None, body)
    }

    pub fn is_constraint(&self) -> bool {
        self.head.is_none()
    }

    /// Renders the rule with atom names, e.g. `b :- a, not c.`
    pub fn display<'a>(&'a self, atoms: &'a AtomSpace) -> RuleDisplay<'a> {
        RuleDisplay {
            head: self.head.as_slice(),
            body: &self.body,
            atoms,
        }
    }
}

/// A rule as supplied by a grounder. Heads are a list so that disjunctive
/// rules can be represented and rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroundRule {
    pub head: Vec<AtomId>,
    pub body: Vec<AtomLiteral>,
}

impl GroundRule {
    pub fn display<'a>(&'a self, atoms: &'a AtomSpace) -> RuleDisplay<'a> {
        RuleDisplay {
            head: &self.head,
            body: &self.body,
            atoms,
        }
    }
}

pub struct RuleDisplay<'a> {
    head: &'a [AtomId],
    body: &'a [AtomLiteral],
    atoms: &'a AtomSpace,
}

impl<'a> fmt::Display for RuleDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: Vec<&str> = self.head.iter().map(|a| self.atoms.name(*a)).collect();
        write!(f, "{}", head.join("; "))?;
        if !self.body.is_empty() {
            if !head.is_empty() {
                write!(f, " ")?;
            }
            write!(f, ":- ")?;
            for (i, l) in self.body.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                if !l.polarity() {
                    write!(f, "not ")?;
                }
                write!(f, "{}", self.atoms.name(l.atom()))?;
            }
        } else if head.is_empty() {
            write!(f, ":-")?;
        }
        write!(f, ".")
    }
}

/// The atom table: kinds, probabilities and a bijective name map
#[derive(Debug, Clone, Default)]
pub struct AtomSpace {
    atoms: Vec<Atom>,
    by_name: FxHashMap<String, AtomId>,
}

impl AtomSpace {
    pub fn new() -> AtomSpace {
        AtomSpace::default()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn id(&self, name: &str) -> Option<AtomId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, atom: AtomId) -> &str {
        &self.atoms[atom.0].name
    }

    pub fn kind(&self, atom: AtomId) -> AtomKind {
        self.atoms[atom.0].kind
    }

    pub fn is_guessed(&self, atom: AtomId) -> bool {
        self.kind(atom).is_guessed()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> + '_ {
        self.atoms.iter().enumerate().map(|(i, a)| (AtomId(i), a))
    }

    /// Returns the atom called `name`, inserting it with `kind` if absent
    pub fn get_or_insert(&mut self, name: &str, kind: AtomKind) -> AtomId {
        if let Some(id) = self.id(name) {
            return id;
        }
        self.push(name.to_string(), kind)
    }

    /// Allocates a new atom whose name starts with `name`; primes are appended
    /// until the name is unused.
    /// ```
    /// # use whatif::repr::{AtomKind, AtomSpace};
    /// let mut atoms = AtomSpace::new();
    /// let a = atoms.fresh("a", AtomKind::Derived);
    /// let b = atoms.fresh("a", AtomKind::Derived);
    /// assert_ne!(a, b);
    /// assert_eq!(atoms.name(b), "a'");
    /// ```
    pub fn fresh(&mut self, name: &str, kind: AtomKind) -> AtomId {
        let mut candidate = name.to_string();
        while self.by_name.contains_key(&candidate) {
            candidate.push('\'');
        }
        self.push(candidate, kind)
    }

    /// Gives `atom` a new unused name derived from `name` (see
    /// [`AtomSpace::fresh`]), releasing its old one
    pub fn rename(&mut self, atom: AtomId, name: &str) {
        let old = std::mem::take(&mut self.atoms[atom.0].name);
        self.by_name.remove(&old);
        let mut candidate = name.to_string();
        while self.by_name.contains_key(&candidate) {
            candidate.push('\'');
        }
        self.by_name.insert(candidate.clone(), atom);
        self.atoms[atom.0].name = candidate;
    }

    fn push(&mut self, name: String, kind: AtomKind) -> AtomId {
        let id = AtomId(self.atoms.len());
        self.by_name.insert(name.clone(), id);
        self.atoms.push(Atom { name, kind });
        id
    }
}

/// A ground program as handed over by a grounder
#[derive(Debug, Clone, Default)]
pub struct Program {
    atoms: AtomSpace,
    rules: Vec<GroundRule>,
}

impl Program {
    pub fn new() -> Program {
        Program::default()
    }

    pub fn atoms(&self) -> &AtomSpace {
        &self.atoms
    }

    pub fn rules(&self) -> &[GroundRule] {
        &self.rules
    }

    /// Gets or declares the derived atom `name`
    pub fn derived(&mut self, name: &str) -> AtomId {
        self.atoms.get_or_insert(name, AtomKind::Derived)
    }

    /// Gets or declares the guessed atom `name`, true with probability `p`
    pub fn guessed(&mut self, name: &str, p: f64) -> AtomId {
        self.atoms.get_or_insert(name, AtomKind::Guessed(p))
    }

    pub fn add_rule(&mut self, head: &[AtomId], body: &[AtomLiteral]) {
        self.rules.push(GroundRule {
            head: head.to_vec(),
            body: body.to_vec(),
        });
    }

    pub fn add_fact(&mut self, head: AtomId) {
        self.add_rule(&[head], &[]);
    }

    pub fn into_parts(self) -> (AtomSpace, Vec<GroundRule>) {
        (self.atoms, self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_bijective() {
        let mut atoms = AtomSpace::new();
        let a = atoms.get_or_insert("a", AtomKind::Derived);
        assert_eq!(atoms.get_or_insert("a", AtomKind::Derived), a);
        atoms.rename(a, "a_i");
        assert_eq!(atoms.id("a"), None);
        assert_eq!(atoms.id("a_i"), Some(a));
        let b = atoms.fresh("a", AtomKind::Derived);
        assert_eq!(atoms.name(b), "a");
        assert_eq!(atoms.len(), 2);
    }

    #[test]
    fn rename_avoids_collisions() {
        let mut atoms = AtomSpace::new();
        let a = atoms.get_or_insert("a", AtomKind::Derived);
        let b = atoms.get_or_insert("b", AtomKind::Derived);
        atoms.rename(a, "b");
        assert_eq!(atoms.name(a), "b'");
        assert_eq!(atoms.id("b"), Some(b));
    }

    #[test]
    fn display_rules() {
        let mut p = Program::new();
        let a = p.derived("a");
        let b = p.derived("b");
        let u = p.guessed("u", 0.5);
        let r = Rule::new(Some(a), vec![AtomLiteral::pos(u), AtomLiteral::neg(b)]);
        assert_eq!(r.display(p.atoms()).to_string(), "a :- u, not b.");
        assert_eq!(Rule::fact(a).display(p.atoms()).to_string(), "a.");
        let c = Rule::constraint(vec![AtomLiteral::pos(b)]);
        assert_eq!(c.display(p.atoms()).to_string(), ":- b.");
        p.add_rule(&[a, b], &[]);
        assert_eq!(p.rules()[0].display(p.atoms()).to_string(), "a; b.");
    }
}
