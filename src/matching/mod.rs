//! Name matching: which registered patterns an emitted name is routed to.
//!
//! - [`Pattern`] tagged pattern (bidirectional, exact, glob, regex)
//! - `Candidate` an emitted name prepared once for matching against many keys
//! - `Selector` a listing / bulk-close query prepared once for many keys

mod pattern;

pub(crate) use pattern::{Candidate, Selector};
pub use pattern::{AnchoredRegex, Bidirectional, GlobPattern, Pattern};
