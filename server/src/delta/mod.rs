mod budget;
mod selection;

pub(crate) use budget::select_updates;
pub(crate) use selection::{Candidate, Selection};
