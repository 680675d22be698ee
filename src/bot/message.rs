//! Inbound message types and command parsing.

use serde::Deserialize;

/// Chat JID suffix marking a group chat.
const GROUP_SUFFIX: &str = "@g.us";

/// Raw event as delivered by the bridge webhook.
///
/// `kind` mirrors the transport's content types; only text-bearing kinds
/// produce an [`InboundMessage`], everything else is dropped here.
#[derive(Debug, Deserialize)]
pub struct BridgeEvent {
    pub message_id: String,
    pub chat_id: String,
    #[serde(default)]
    pub push_name: Option<String>,
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    /// True for the bot's own outbound messages echoed back.
    #[serde(default)]
    pub from_me: bool,
}

impl BridgeEvent {
    /// Extract the text for the supported content types: plain text,
    /// extended/quoted text, image caption, video caption.
    pub fn into_inbound(self) -> Option<InboundMessage> {
        if self.from_me {
            return None;
        }

        let text = match self.kind.as_str() {
            "text" | "extended_text" => self.text,
            "image" | "video" => self.caption,
            _ => None,
        }?;

        if text.is_empty() {
            return None;
        }

        Some(InboundMessage {
            message_id: self.message_id,
            sender: self.chat_id.clone(),
            chat_id: self.chat_id,
            push_name: self.push_name.unwrap_or_else(|| "User".to_string()),
            text,
        })
    }
}

/// One inbound chat message, post-extraction.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub message_id: String,
    pub chat_id: String,
    pub sender: String,
    pub push_name: String,
    pub text: String,
}

impl InboundMessage {
    pub fn is_group(&self) -> bool {
        self.chat_id.ends_with(GROUP_SUFFIX)
    }

    /// Phone number part of the sender JID.
    pub fn sender_number(&self) -> &str {
        self.sender.split('@').next().unwrap_or(&self.sender)
    }
}

/// A parsed command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: String,
}

/// Parse a command from message text. A message is a command iff it starts
/// with the prefix; the keyword is the first whitespace-delimited token
/// after it, case-folded, and the remaining tokens form the argument text.
pub fn parse_command(text: &str, prefix: &str) -> Option<Command> {
    let rest = text.strip_prefix(prefix)?.trim();
    let mut tokens = rest.split_whitespace();
    let name = tokens.next().unwrap_or("").to_lowercase();
    let args = tokens.collect::<Vec<_>>().join(" ");
    Some(Command { name, args })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_msg(chat_id: &str, text: &str) -> InboundMessage {
        InboundMessage {
            message_id: "MID1".to_string(),
            chat_id: chat_id.to_string(),
            sender: chat_id.to_string(),
            push_name: "Test".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_parse_bare_command() {
        let cmd = parse_command(".ping", ".").unwrap();
        assert_eq!(cmd.name, "ping");
        assert_eq!(cmd.args, "");
    }

    #[test]
    fn test_parse_command_with_args() {
        let cmd = parse_command(".ai hello there", ".").unwrap();
        assert_eq!(cmd.name, "ai");
        assert_eq!(cmd.args, "hello there");
    }

    #[test]
    fn test_parse_case_folds_keyword() {
        let cmd = parse_command(".PiNg", ".").unwrap();
        assert_eq!(cmd.name, "ping");
    }

    #[test]
    fn test_parse_collapses_arg_whitespace() {
        let cmd = parse_command(".ai   hello    world ", ".").unwrap();
        assert_eq!(cmd.args, "hello world");
    }

    #[test]
    fn test_non_prefixed_text_is_not_a_command() {
        assert_eq!(parse_command("hello there", "."), None);
        assert_eq!(parse_command("!ping", "."), None);
    }

    #[test]
    fn test_custom_prefix() {
        let cmd = parse_command("!menu", "!").unwrap();
        assert_eq!(cmd.name, "menu");
    }

    #[test]
    fn test_group_detection() {
        assert!(make_msg("123456-789@g.us", "hi").is_group());
        assert!(!make_msg("94711111111@s.whatsapp.net", "hi").is_group());
    }

    #[test]
    fn test_sender_number_strips_jid_server() {
        let msg = make_msg("94711111111@s.whatsapp.net", "hi");
        assert_eq!(msg.sender_number(), "94711111111");
    }

    #[test]
    fn test_bridge_event_text_kinds() {
        let event: BridgeEvent = serde_json::from_str(
            r#"{"message_id": "A", "chat_id": "1@s.whatsapp.net", "kind": "text", "text": "hi"}"#,
        )
        .unwrap();
        let msg = event.into_inbound().unwrap();
        assert_eq!(msg.text, "hi");
        assert_eq!(msg.push_name, "User");
    }

    #[test]
    fn test_bridge_event_caption_kinds() {
        let event: BridgeEvent = serde_json::from_str(
            r#"{"message_id": "A", "chat_id": "1@s.whatsapp.net", "kind": "image", "caption": "look"}"#,
        )
        .unwrap();
        assert_eq!(event.into_inbound().unwrap().text, "look");
    }

    #[test]
    fn test_bridge_event_unsupported_kind_dropped() {
        let event: BridgeEvent = serde_json::from_str(
            r#"{"message_id": "A", "chat_id": "1@s.whatsapp.net", "kind": "sticker"}"#,
        )
        .unwrap();
        assert!(event.into_inbound().is_none());
    }

    #[test]
    fn test_bridge_event_own_message_dropped() {
        let event: BridgeEvent = serde_json::from_str(
            r#"{"message_id": "A", "chat_id": "1@s.whatsapp.net", "kind": "text", "text": "hi", "from_me": true}"#,
        )
        .unwrap();
        assert!(event.into_inbound().is_none());
    }

    #[test]
    fn test_bridge_event_empty_text_dropped() {
        let event: BridgeEvent = serde_json::from_str(
            r#"{"message_id": "A", "chat_id": "1@s.whatsapp.net", "kind": "text", "text": ""}"#,
        )
        .unwrap();
        assert!(event.into_inbound().is_none());
    }
}
