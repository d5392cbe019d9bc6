//! CLI command implementations

pub(crate) mod ls;
pub(crate) mod migrate;
pub(crate) mod status;
