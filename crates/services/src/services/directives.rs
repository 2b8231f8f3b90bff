//! Tagged directives the generation backend embeds in its free-text replies.
//!
//! A directive may appear anywhere in the reply, including mid-line. The first
//! occurrence is honoured, every occurrence is stripped from the visible text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

static WHATSAPP_BUTTON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"WHATSAPP_BUTTON:([^:\r\n]+):(\S+)").expect("valid regex"));

static SUGGESTED_ACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"SUGGESTED_ACTION:([A-Za-z_]+)").expect("valid regex"));

static EXTRA_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n([ \t]*\n)+").expect("valid regex"));

/// UI affordance attached to an assistant message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct ActionButton {
    #[serde(rename = "type")]
    pub kind: ActionButtonKind,
    pub label: String,
    pub action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum ActionButtonKind {
    Whatsapp,
}

/// Next step the backend suggests the UI surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SuggestedAction {
    Contact,
    Consultation,
    Newsletter,
}

/// A reply with its directives pulled out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub text: String,
    pub action_button: Option<ActionButton>,
    pub suggested_action: Option<SuggestedAction>,
}

pub fn parse_reply(raw: &str) -> ParsedReply {
    let action_button = WHATSAPP_BUTTON.captures(raw).map(|caps| ActionButton {
        kind: ActionButtonKind::Whatsapp,
        label: caps[1].trim().to_string(),
        action: caps[2].to_string(),
    });

    let suggested_action = SUGGESTED_ACTION
        .captures(raw)
        .and_then(|caps| caps[1].parse::<SuggestedAction>().ok());

    let has_directive = WHATSAPP_BUTTON.is_match(raw) || SUGGESTED_ACTION.is_match(raw);
    let text = if has_directive {
        let stripped = WHATSAPP_BUTTON.replace_all(raw, "");
        let stripped = SUGGESTED_ACTION.replace_all(&stripped, "");
        // Removed lines leave blank runs behind.
        EXTRA_BLANK_LINES
            .replace_all(stripped.trim(), "\n\n")
            .to_string()
    } else {
        raw.trim().to_string()
    };

    ParsedReply {
        text,
        action_button,
        suggested_action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_whatsapp_button_and_strips_it() {
        let reply = parse_reply(
            "We'd love to help with your kitchen!\nWHATSAPP_BUTTON:Chat with us:https://wa.me/123",
        );
        assert_eq!(reply.text, "We'd love to help with your kitchen!");
        assert_eq!(
            reply.action_button,
            Some(ActionButton {
                kind: ActionButtonKind::Whatsapp,
                label: "Chat with us".to_string(),
                action: "https://wa.me/123".to_string(),
            })
        );
        assert_eq!(reply.suggested_action, None);
    }

    #[test]
    fn reply_without_directive_has_no_button() {
        let reply = parse_reply("  Our studio is open Monday to Friday.  ");
        assert_eq!(reply.text, "Our studio is open Monday to Friday.");
        assert!(reply.action_button.is_none());
    }

    #[test]
    fn only_first_button_is_used_but_all_are_stripped() {
        let reply = parse_reply(
            "Hi\nWHATSAPP_BUTTON:First:https://wa.me/1\nWHATSAPP_BUTTON:Second:https://wa.me/2",
        );
        assert_eq!(reply.text, "Hi");
        assert_eq!(reply.action_button.unwrap().label, "First");
    }

    #[test]
    fn directive_mid_text_collapses_blank_lines() {
        let reply = parse_reply(
            "Line one.\n\nWHATSAPP_BUTTON:Talk:https://wa.me/9\n\nLine two.",
        );
        assert_eq!(reply.text, "Line one.\n\nLine two.");
    }

    #[test]
    fn plain_reply_keeps_its_own_spacing() {
        let reply = parse_reply("Step one.\n\n\n\nStep two.");
        assert_eq!(reply.text, "Step one.\n\n\n\nStep two.");
    }

    #[test]
    fn inline_directive_is_stripped_mid_line() {
        let reply = parse_reply("Happy to help SUGGESTED_ACTION:contact with that.");
        assert_eq!(reply.suggested_action, Some(SuggestedAction::Contact));
        assert_eq!(reply.text, "Happy to help  with that.");
    }

    #[test]
    fn suggested_action_is_parsed_case_insensitively() {
        let reply = parse_reply("Book a visit!\nSUGGESTED_ACTION:Consultation");
        assert_eq!(reply.suggested_action, Some(SuggestedAction::Consultation));
        assert_eq!(reply.text, "Book a visit!");
    }

    #[test]
    fn unknown_suggested_action_is_ignored_and_stripped() {
        let reply = parse_reply("Sure.\nSUGGESTED_ACTION:teleport");
        assert_eq!(reply.suggested_action, None);
        assert_eq!(reply.text, "Sure.");
    }

    #[test]
    fn action_button_serializes_with_type_tag() {
        let button = ActionButton {
            kind: ActionButtonKind::Whatsapp,
            label: "Chat".to_string(),
            action: "https://wa.me/1".to_string(),
        };
        let json = serde_json::to_value(&button).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "whatsapp", "label": "Chat", "action": "https://wa.me/1"})
        );
    }
}
