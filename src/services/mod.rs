pub mod identity_service;
pub mod inbox;
pub mod message_service;
