use std::{fs, path::Path};

use ts_rs::TS;

fn generate_types_content() -> String {
    let decls = [
        db::models::chat_conversation::ChatConversation::decl(),
        db::models::chat_conversation::CreateChatConversation::decl(),
        db::models::chat_message::ChatMessage::decl(),
        db::models::chat_settings::ChatTone::decl(),
        db::models::chat_settings::ChatSettings::decl(),
        db::models::chat_settings::PublicChatSettings::decl(),
        db::models::chat_settings::UpdateChatSettings::decl(),
        db::models::gallery_image::GalleryCategory::decl(),
        db::models::gallery_image::GalleryImage::decl(),
        db::models::knowledge_base::KnowledgeBaseEntry::decl(),
        db::models::knowledge_base::CreateKnowledgeBaseEntry::decl(),
        db::models::knowledge_base::UpdateKnowledgeBaseEntry::decl(),
        db::models::site_content::SiteContentSection::decl(),
        services::services::admin_auth::AdminIdentity::decl(),
        services::services::admin_auth::LoginRequest::decl(),
        services::services::admin_auth::LoginResponse::decl(),
        services::services::chat_assistant::PostChatMessage::decl(),
        services::services::chat_assistant::AssistantMessage::decl(),
        services::services::chat_assistant::ChatExchange::decl(),
        services::services::directives::ActionButton::decl(),
        services::services::directives::ActionButtonKind::decl(),
        services::services::directives::SuggestedAction::decl(),
        services::services::image_ingestion::UploadMetadata::decl(),
        services::services::image_ingestion::UploadResult::decl(),
        services::services::image_ingestion::UploadOutcome::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|d| format!("export {}", d.trim_start_matches("export ")))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "// This file was generated by `cargo run --bin generate_types`. Do not edit.\n\n{body}\n"
    )
}

fn main() {
    let check_mode = std::env::args().any(|arg| arg == "--check");
    let out_path = Path::new("shared/types.ts");
    let generated = generate_types_content();

    if check_mode {
        let current = fs::read_to_string(out_path).unwrap_or_default();
        if current == generated {
            println!("shared/types.ts is up to date.");
            std::process::exit(0);
        }
        eprintln!("shared/types.ts is out of date. Run `cargo run --bin generate_types`.");
        std::process::exit(1);
    }

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent).expect("cannot create shared/");
    }
    fs::write(out_path, generated).expect("unable to write shared/types.ts");
    println!("Wrote {}", out_path.display());
}
