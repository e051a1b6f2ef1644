pub mod test_utils;
pub mod time;

pub use time::{start_of_hour, Clock, SystemClock};
