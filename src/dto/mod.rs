pub mod admin_dto;
pub mod contact_dto;
