pub(crate) mod auth;
pub(crate) mod auth_otp;
pub(crate) mod chat_handlers;
pub(crate) mod contact;
