pub mod availability;
pub mod scheduling;

pub use availability::*;
pub use scheduling::*;
