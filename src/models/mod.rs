pub mod chat;
pub mod otp;
pub mod user;
