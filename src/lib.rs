//! Counterfactual inference over ground probabilistic logic programs, by
//! knowledge compilation into d-DNNF circuits or binary decision diagrams
#![allow(clippy::all)]
extern crate bit_set;
extern crate dimacs;
extern crate rustc_hash;
#[macro_use]
extern crate serde;
extern crate serde_json;
extern crate tempfile;
extern crate thiserror;
extern crate tracing;

pub mod util;
mod backing_store;
pub mod builder;
pub mod counterfactual;
pub mod repr;
pub mod serialize;
