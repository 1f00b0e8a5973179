mod result;

pub use result::*;
