// Interaction fee resolution
//
// Every surface that shows an agent's price goes through `resolve_fee`, so the
// detail modal, cards and payment sessions always agree on one figure.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::AgentRecord;

pub const DEFAULT_TOKEN: &str = "USDC";
pub const FALLBACK_AMOUNT: f64 = 1.0;

/// Which record field supplied the fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeSource {
    #[serde(rename = "paymentConfig")]
    PaymentConfig,
    #[serde(rename = "interactionFeeAmount")]
    InteractionFeeAmount,
    #[serde(rename = "interactionFeeUsdfc")]
    InteractionFeeUsdfc,
    #[serde(rename = "interactionFee")]
    InteractionFee,
    #[serde(rename = "fallback")]
    Fallback,
}

impl std::fmt::Display for FeeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeSource::PaymentConfig => write!(f, "paymentConfig"),
            FeeSource::InteractionFeeAmount => write!(f, "interactionFeeAmount"),
            FeeSource::InteractionFeeUsdfc => write!(f, "interactionFeeUsdfc"),
            FeeSource::InteractionFee => write!(f, "interactionFee"),
            FeeSource::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeResolution {
    pub amount: f64,
    pub token: String,
    pub source: FeeSource,
}

impl FeeResolution {
    fn new(amount: f64, token: impl Into<String>, source: FeeSource) -> Self {
        Self {
            amount,
            token: token.into(),
            source,
        }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_AMOUNT, DEFAULT_TOKEN, FeeSource::Fallback)
    }

    /// `"18 USDC"`, `"2.5 USDC"`
    pub fn display(&self) -> String {
        format!("{} {}", format_amount(self.amount), self.token)
    }
}

/// Pick the authoritative fee for an agent.
///
/// Candidates are tried in order and the first present, finite and strictly
/// positive amount wins:
///
/// 1. `paymentConfig.interactionFeeAmount` (token from `interactionFeeToken`,
///    then `paymentToken`)
/// 2. `interactionFeeAmount` (token from `interactionFeeToken`)
/// 3. `interactionFeeUsdfc` (always USDC)
/// 4. `interactionFee` (always USDC)
///
/// With no usable candidate the fee is 1 USDC.
pub fn resolve_fee(agent: &AgentRecord) -> FeeResolution {
    let resolution = pick_fee(agent);
    debug!(
        agent_id = agent.id.as_deref().unwrap_or("<unknown>"),
        source = %resolution.source,
        amount = resolution.amount,
        token = %resolution.token,
        "Resolved interaction fee"
    );
    resolution
}

fn pick_fee(agent: &AgentRecord) -> FeeResolution {
    if let Some(config) = &agent.payment_config {
        if let Some(amount) = positive(config.interaction_fee_amount) {
            let token = non_blank(config.interaction_fee_token.as_deref())
                .or_else(|| non_blank(config.payment_token.as_deref()))
                .unwrap_or(DEFAULT_TOKEN);
            return FeeResolution::new(amount, token, FeeSource::PaymentConfig);
        }
    }

    if let Some(amount) = positive(agent.interaction_fee_amount) {
        let token = non_blank(agent.interaction_fee_token.as_deref()).unwrap_or(DEFAULT_TOKEN);
        return FeeResolution::new(amount, token, FeeSource::InteractionFeeAmount);
    }

    if let Some(amount) = positive(agent.interaction_fee_usdfc) {
        return FeeResolution::new(amount, DEFAULT_TOKEN, FeeSource::InteractionFeeUsdfc);
    }

    if let Some(amount) = positive(agent.interaction_fee) {
        return FeeResolution::new(amount, DEFAULT_TOKEN, FeeSource::InteractionFee);
    }

    FeeResolution::fallback()
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.6}", amount);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    // Sub-micro fees must not round down to a displayed zero
    if trimmed == "0" && amount > 0.0 {
        return amount.to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::PaymentFieldConfig;
    use serde_json::json;

    fn agent(value: serde_json::Value) -> AgentRecord {
        AgentRecord::from_value(&value)
    }

    #[test]
    fn test_payment_config_wins_over_everything() {
        let resolved = resolve_fee(&agent(json!({
            "paymentConfig": { "interactionFeeAmount": 3, "interactionFeeToken": "ETH" },
            "interactionFeeAmount": 18,
            "interactionFeeToken": "USDC",
            "interactionFeeUsdfc": 18.0,
            "interactionFee": 5
        })));

        assert_eq!(resolved, FeeResolution::new(3.0, "ETH", FeeSource::PaymentConfig));
    }

    #[test]
    fn test_payment_config_token_falls_back_to_payment_token() {
        let record = AgentRecord {
            payment_config: Some(PaymentFieldConfig {
                interaction_fee_amount: Some(2.0),
                interaction_fee_token: Some("  ".to_string()),
                payment_token: Some("USDFC".to_string()),
            }),
            ..Default::default()
        };

        let resolved = resolve_fee(&record);
        assert_eq!(resolved.token, "USDFC");
        assert_eq!(resolved.source, FeeSource::PaymentConfig);
    }

    #[test]
    fn test_payment_config_without_amount_is_skipped() {
        let resolved = resolve_fee(&agent(json!({
            "paymentConfig": { "interactionFeeToken": "ETH" },
            "interactionFeeAmount": 7,
            "interactionFeeToken": "USDT"
        })));

        assert_eq!(resolved, FeeResolution::new(7.0, "USDT", FeeSource::InteractionFeeAmount));
    }

    #[test]
    fn test_top_level_amount_defaults_token() {
        let resolved = resolve_fee(&agent(json!({ "interactionFeeAmount": 2 })));
        assert_eq!(resolved, FeeResolution::new(2.0, "USDC", FeeSource::InteractionFeeAmount));
    }

    #[test]
    fn test_zero_amount_falls_through_to_usdfc() {
        let resolved = resolve_fee(&agent(json!({
            "interactionFeeAmount": 0,
            "interactionFeeUsdfc": 4
        })));

        assert_eq!(resolved, FeeResolution::new(4.0, "USDC", FeeSource::InteractionFeeUsdfc));
    }

    #[test]
    fn test_negative_and_garbage_values_never_win() {
        let resolved = resolve_fee(&agent(json!({
            "paymentConfig": { "interactionFeeAmount": -3 },
            "interactionFeeAmount": "abc",
            "interactionFeeUsdfc": -1,
            "interactionFee": "2.25"
        })));

        assert_eq!(resolved, FeeResolution::new(2.25, "USDC", FeeSource::InteractionFee));
    }

    #[test]
    fn test_usdfc_token_is_forced() {
        let resolved = resolve_fee(&agent(json!({
            "interactionFeeToken": "ETH",
            "interactionFeeUsdfc": 9
        })));
        assert_eq!(resolved.token, "USDC");
    }

    #[test]
    fn test_total_fallback() {
        let resolved = resolve_fee(&AgentRecord::default());
        assert_eq!(resolved, FeeResolution::new(1.0, "USDC", FeeSource::Fallback));

        let all_zero = resolve_fee(&agent(json!({
            "interactionFeeAmount": 0,
            "interactionFeeUsdfc": 0,
            "interactionFee": 0
        })));
        assert_eq!(all_zero.source, FeeSource::Fallback);
    }

    #[test]
    fn test_cube_sepolia_fixture() {
        let resolved = resolve_fee(&agent(json!({
            "name": "Cube Sepolia Updated 1",
            "interactionFeeAmount": 18,
            "interactionFeeToken": "USDC",
            "interactionFeeUsdfc": 18.0
        })));

        assert_eq!(resolved, FeeResolution::new(18.0, "USDC", FeeSource::InteractionFeeAmount));
    }

    #[test]
    fn test_display() {
        assert_eq!(FeeResolution::new(18.0, "USDC", FeeSource::Fallback).display(), "18 USDC");
        assert_eq!(FeeResolution::new(2.5, "ETH", FeeSource::Fallback).display(), "2.5 ETH");
        assert_eq!(FeeResolution::new(0.001, "ETH", FeeSource::Fallback).display(), "0.001 ETH");
    }

    #[test]
    fn test_tiny_positive_fee_never_displays_zero() {
        let resolved = resolve_fee(&agent(json!({ "interactionFeeAmount": 0.0000001 })));
        assert_eq!(resolved.source, FeeSource::InteractionFeeAmount);
        assert_eq!(resolved.display(), "0.0000001 USDC");
    }

    #[test]
    fn test_source_serialization() {
        let json = serde_json::to_value(FeeResolution::fallback()).unwrap();
        assert_eq!(json, json!({ "amount": 1.0, "token": "USDC", "source": "fallback" }));
        assert_eq!(
            serde_json::to_value(FeeSource::InteractionFeeUsdfc).unwrap(),
            json!("interactionFeeUsdfc")
        );
    }
}
