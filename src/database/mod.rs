pub mod chat_store;
pub mod connection;
pub mod otp_store;
pub mod user_store;

#[cfg(test)]
pub mod memory;
