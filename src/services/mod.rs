pub mod chatbot_service;
pub mod email_service;
pub mod gemini_service;
pub mod otp_service;
pub mod token_service;
pub mod weather_service;
