//! WhatsApp Cloud API webhook payloads
//!
//! Only the fields the agent uses are modelled. Everything is defaulted so
//! status callbacks and unknown message types parse to nothing instead of
//! failing the request.

use lead_agent_core::InboundMessage;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<WaMessage>,
    /// Delivery/read receipts, ignored
    #[serde(default)]
    pub statuses: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct WaMessage {
    pub from: String,
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextBody>,
    #[serde(default)]
    pub button: Option<ButtonBody>,
    #[serde(default)]
    pub interactive: Option<Interactive>,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ButtonBody {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct Interactive {
    #[serde(default)]
    pub button_reply: Option<ReplyTitle>,
    #[serde(default)]
    pub list_reply: Option<ReplyTitle>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyTitle {
    pub title: String,
}

impl WaMessage {
    /// User-visible text: typed text, quick-reply button or list choice
    pub fn body(&self) -> Option<&str> {
        match self.kind.as_str() {
            "text" => self.text.as_ref().map(|t| t.body.as_str()),
            "button" => self.button.as_ref().map(|b| b.text.as_str()),
            "interactive" => self.interactive.as_ref().and_then(|i| {
                i.button_reply
                    .as_ref()
                    .or(i.list_reply.as_ref())
                    .map(|r| r.title.as_str())
            }),
            _ => None,
        }
    }
}

impl WebhookPayload {
    /// Text-bearing messages across all entries and changes
    pub fn inbound_messages(&self) -> Vec<InboundMessage> {
        self.entry
            .iter()
            .flat_map(|e| e.changes.iter())
            .flat_map(|c| c.value.messages.iter())
            .filter_map(|m| {
                let body = m.body()?;
                Some(InboundMessage::new(m.from.as_str(), body, m.id.as_str()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> WebhookPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_text_message() {
        let payload = parse(serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "1",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "metadata": { "phone_number_id": "123" },
                        "contacts": [{ "wa_id": "919800000001" }],
                        "messages": [{
                            "from": "919800000001",
                            "id": "wamid.A",
                            "timestamp": "1700000000",
                            "type": "text",
                            "text": { "body": "hi" }
                        }]
                    }
                }]
            }]
        }));
        assert_eq!(
            payload.inbound_messages(),
            vec![InboundMessage::new("919800000001", "hi", "wamid.A")]
        );
    }

    #[test]
    fn test_interactive_and_button_replies() {
        let payload = parse(serde_json::json!({
            "entry": [{ "changes": [{ "value": { "messages": [
                { "from": "1", "id": "a", "type": "interactive",
                  "interactive": { "type": "button_reply", "button_reply": { "id": "en", "title": "English" } } },
                { "from": "1", "id": "b", "type": "button", "button": { "text": "Hindi", "payload": "hi" } },
                { "from": "1", "id": "c", "type": "image", "image": { "id": "media" } }
            ]}}]}]
        }));
        let texts: Vec<String> = payload.inbound_messages().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["English".to_string(), "Hindi".to_string()]);
    }

    #[test]
    fn test_status_callback_has_no_messages() {
        let payload = parse(serde_json::json!({
            "entry": [{ "changes": [{ "value": {
                "statuses": [{ "id": "wamid.A", "status": "delivered" }]
            }}]}]
        }));
        assert!(payload.inbound_messages().is_empty());
    }
}
