//! DNA: the deterministic descriptor of an installed application
//!
//! A DNA names the application, its zomes (code + entry schemas), and the
//! lineage it belongs to: a UUID shared by every interoperating peer, and the
//! progenitor who originated that lineage.

mod descriptor;
mod lineage;
pub mod sample;

pub use descriptor::{DhtConfig, Dna, EntryDef, FunctionDef, Progenitor, Zome};
pub use lineage::LineagePolicy;
