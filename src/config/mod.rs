/// Join configuration
pub mod options;

pub use options::*;
