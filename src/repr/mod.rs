//! Contains the core datastructures for representing programs, formulae and
//! compiled circuits (i.e., ground rules, conjunctive normal forms, BDD
//! pointers, NNF circuits, etc.)

mod bdd;
mod cnf;
mod nnf;
mod program;
mod var_label;
mod var_order;
mod wmc;

pub use self::bdd::*;
pub use self::cnf::*;
pub use self::nnf::*;
pub use self::program::*;
pub use self::var_label::*;
pub use self::var_order::*;
pub use self::wmc::*;
