pub use self::{evolution::*, individual::*, population::*};

pub mod evolution;
pub mod individual;
pub mod population;
