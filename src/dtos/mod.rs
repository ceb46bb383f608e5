pub mod auth_dtos;
pub mod chat_dtos;
