pub mod admin_credential;
pub mod chat_conversation;
pub mod chat_message;
pub mod chat_settings;
pub mod gallery_image;
pub mod knowledge_base;
pub mod site_content;
