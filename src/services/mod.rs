pub mod chat_service;
pub mod directory_service;
pub mod message_service;
pub mod room_service;
