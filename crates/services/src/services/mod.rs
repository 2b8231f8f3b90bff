pub mod admin_auth;
pub mod chat_admin;
pub mod chat_assistant;
pub mod claude_api;
pub mod directives;
pub mod image_ingestion;
pub mod image_processing;
pub mod object_storage;
pub mod response_generator;
