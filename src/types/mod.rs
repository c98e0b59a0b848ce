mod money;
mod tier;

pub use money::*;
pub use tier::*;
