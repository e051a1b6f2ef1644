pub mod memory;
pub mod queue;
pub mod redis;
pub mod worker;

pub use self::memory::*;
pub use self::queue::*;
pub use self::redis::*;
pub use self::worker::*;
