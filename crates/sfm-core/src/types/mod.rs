//! Identifiers and pairwise observations shared by the view graph and the
//! global estimators.

mod twoview_info;
mod view_id;

pub use twoview_info::*;
pub use view_id::*;
