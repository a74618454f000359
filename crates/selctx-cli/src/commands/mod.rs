//! Command handlers grouped by concern.

pub(crate) mod converge;
pub(crate) mod show;
