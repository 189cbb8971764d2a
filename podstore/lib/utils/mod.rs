//! Utility functions and types.

mod path;
mod scratch;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use path::*;
pub use scratch::*;
