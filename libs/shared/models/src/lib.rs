pub mod error;
pub mod user;

pub use error::StoreError;
pub use user::{PublicProfile, User, UserStore};
