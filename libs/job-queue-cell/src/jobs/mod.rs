pub mod cancellation_mail;

pub use cancellation_mail::*;
