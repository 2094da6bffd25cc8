//! bl-state: Persisted module state and patch documents
//!
//! Module state is a small JSON object per module (camelCase keys). Loading is
//! lenient: each key is read on its own and a missing or malformed key keeps
//! its default. Patch documents bundle param values and module state for a
//! whole rack and live on disk as pretty-printed JSON.

mod module_state;
mod patch;

pub use module_state::*;
pub use patch::*;
