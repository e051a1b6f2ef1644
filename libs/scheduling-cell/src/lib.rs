pub mod models;
pub mod services;
pub mod stores;

pub use models::*;
pub use services::*;
pub use stores::*;
