//! Configuration of the on-disk store layout.

mod defaults;
mod layout;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use defaults::*;
pub use layout::*;
