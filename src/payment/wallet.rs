// Recipient wallet resolution for payment QR codes

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::fee::non_blank;
use crate::agent::AgentRecord;

pub const NO_WALLET: &str = "No wallet configured";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletSource {
    #[serde(rename = "agentWalletAddress")]
    AgentWalletAddress,
    #[serde(rename = "ownerWallet")]
    OwnerWallet,
    #[serde(rename = "deployerWalletAddress")]
    DeployerWalletAddress,
    #[serde(rename = "userId")]
    UserId,
    #[serde(rename = "none")]
    None,
}

impl std::fmt::Display for WalletSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletSource::AgentWalletAddress => write!(f, "agentWalletAddress"),
            WalletSource::OwnerWallet => write!(f, "ownerWallet"),
            WalletSource::DeployerWalletAddress => write!(f, "deployerWalletAddress"),
            WalletSource::UserId => write!(f, "userId"),
            WalletSource::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletResolution {
    pub address: String,
    pub source: WalletSource,
}

impl WalletResolution {
    pub fn unconfigured() -> Self {
        Self {
            address: NO_WALLET.to_string(),
            source: WalletSource::None,
        }
    }

    /// False when the payment UI should warn that no wallet is connected
    pub fn is_configured(&self) -> bool {
        self.source != WalletSource::None
    }

    pub fn display(&self) -> String {
        format_address(&self.address)
    }
}

/// Pick the address that should receive payments for an agent.
///
/// Order: `agentWalletAddress`, `ownerWallet`, `deployerWalletAddress`, then
/// `userId` but only when its raw value looks like a hex address (no
/// trimming, so `" 0xabc"` is rejected).
pub fn resolve_wallet(agent: &AgentRecord) -> WalletResolution {
    let candidates = [
        (agent.agent_wallet_address.as_deref(), WalletSource::AgentWalletAddress),
        (agent.owner_wallet.as_deref(), WalletSource::OwnerWallet),
        (agent.deployer_wallet_address.as_deref(), WalletSource::DeployerWalletAddress),
    ];

    let picked = candidates
        .into_iter()
        .find_map(|(value, source)| non_blank(value).map(|address| (address, source)))
        .or_else(|| {
            agent
                .user_id
                .as_deref()
                .filter(|id| looks_like_wallet(id))
                .map(|address| (address, WalletSource::UserId))
        });

    match picked {
        Some((address, source)) => {
            debug!(
                agent_id = agent.id.as_deref().unwrap_or("<unknown>"),
                source = %source,
                "Resolved recipient wallet"
            );
            WalletResolution {
                address: address.to_string(),
                source,
            }
        }
        None => {
            warn!(
                agent_id = agent.id.as_deref().unwrap_or("<unknown>"),
                "Agent has no wallet configured"
            );
            WalletResolution::unconfigured()
        }
    }
}

/// `0x` followed by at least one hex digit
pub fn looks_like_wallet(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .and_then(|rest| rest.chars().next())
        .map_or(false, |c| c.is_ascii_hexdigit())
}

/// Compact `first6...last4` form. The sentinel and short strings pass through.
pub fn format_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if address == NO_WALLET || chars.len() <= 10 {
        return address.to_string();
    }

    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn agent(value: serde_json::Value) -> AgentRecord {
        AgentRecord::from_value(&value)
    }

    #[test]
    fn test_agent_wallet_first() {
        let resolved = resolve_wallet(&agent(json!({
            "agentWalletAddress": "0xABC123",
            "ownerWallet": "0xDEF456"
        })));

        assert_eq!(resolved.address, "0xABC123");
        assert_eq!(resolved.source, WalletSource::AgentWalletAddress);
        assert!(resolved.is_configured());
    }

    #[test]
    fn test_precedence_skips_blank_fields() {
        let resolved = resolve_wallet(&agent(json!({
            "agentWalletAddress": "",
            "ownerWallet": "   ",
            "deployerWalletAddress": "0xdeployer1"
        })));

        assert_eq!(resolved.address, "0xdeployer1");
        assert_eq!(resolved.source, WalletSource::DeployerWalletAddress);
    }

    #[test]
    fn test_owner_wallet_before_deployer() {
        let resolved = resolve_wallet(&agent(json!({
            "owner_wallet": "0xowner",
            "deployer_wallet_address": "0xdeployer"
        })));
        assert_eq!(resolved.source, WalletSource::OwnerWallet);
    }

    #[test]
    fn test_user_id_must_look_like_wallet() {
        let resolved = resolve_wallet(&agent(json!({ "userId": "user-123" })));
        assert_eq!(resolved.address, NO_WALLET);
        assert_eq!(resolved.source, WalletSource::None);
        assert!(!resolved.is_configured());

        let hex = "0x1234567890123456789012345678901234567890";
        let resolved = resolve_wallet(&agent(json!({ "userId": hex })));
        assert_eq!(resolved.address, hex);
        assert_eq!(resolved.source, WalletSource::UserId);
    }

    #[test]
    fn test_user_id_is_checked_untrimmed() {
        let resolved = resolve_wallet(&agent(json!({ "userId": " 0xabc" })));
        assert_eq!(resolved.source, WalletSource::None);
        assert_eq!(resolved.address, NO_WALLET);
    }

    #[test]
    fn test_looks_like_wallet() {
        assert!(looks_like_wallet("0xabcDEF"));
        assert!(looks_like_wallet("0x1"));
        assert!(!looks_like_wallet("0x"));
        assert!(!looks_like_wallet("0xzz"));
        assert!(!looks_like_wallet("1x00"));
        assert!(!looks_like_wallet(""));
    }

    #[test]
    fn test_format_address() {
        assert_eq!(
            format_address("0x1234567890123456789012345678901234567890"),
            "0x1234...7890"
        );
        assert_eq!(format_address(NO_WALLET), NO_WALLET);
        assert_eq!(format_address("0xabc"), "0xabc");
    }

    #[test]
    fn test_source_serialization() {
        let json = serde_json::to_value(WalletResolution::unconfigured()).unwrap();
        assert_eq!(json, json!({ "address": "No wallet configured", "source": "none" }));
    }
}
