//! Server-owned data transfer models.

use serde::{Deserialize, Serialize};

/// Channel metadata describing the subscription target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// Human-readable channel title.
    pub channel_title: String,
    /// Link to the channel image, when the service provides one.
    #[serde(default)]
    pub image_link: Option<String>,
    /// Invite link opened by the subscribe action.
    #[serde(default)]
    pub invite_link: Option<String>,
    /// Geographic tag of the channel.
    #[serde(default)]
    pub geo: Option<String>,
    /// Base64 avatar payload.
    #[serde(default)]
    pub channel_picture: Option<String>,
}

/// Balance payload returned by the balance service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BalancePayload {
    /// Current balance in game units.
    pub balance: i64,
}

/// Win counter payload returned by the wins service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WinsPayload {
    /// Total recorded wins for the user.
    pub wins: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_parses_with_missing_optionals() {
        let raw = r#"{"channel_title": "Signals", "invite_link": "https://t.me/+abc"}"#;
        let channel: Channel = serde_json::from_str(raw).expect("channel should parse");
        assert_eq!(channel.channel_title, "Signals");
        assert_eq!(channel.invite_link.as_deref(), Some("https://t.me/+abc"));
        assert!(channel.geo.is_none());
        assert!(channel.channel_picture.is_none());
    }

    #[test]
    fn payloads_parse() {
        let balance: BalancePayload =
            serde_json::from_str(r#"{"balance": -40}"#).expect("balance should parse");
        assert_eq!(balance.balance, -40);
        let wins: WinsPayload = serde_json::from_str(r#"{"wins": 4}"#).expect("wins should parse");
        assert_eq!(wins.wins, 4);
    }
}
