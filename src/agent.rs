//! Agent records as delivered by the datastore.
//!
//! Rows arrive with inconsistent schemas: camelCase from the web client,
//! snake_case straight from Postgres, numbers sometimes stored as strings and
//! `payment_config` sometimes stored as an encoded JSON string. Ingestion never
//! fails on a bad field; it coerces what it can and leaves the rest absent so
//! the resolvers can apply their fallbacks.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One AR-deployed agent. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_fee_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_fee_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_fee_usdfc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_config: Option<PaymentFieldConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_wallet_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_wallet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployer_wallet_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Precomputed distance from the viewer, if the client already knows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
}

/// Nested payment settings carried by newer agent rows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFieldConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_fee_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_fee_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_token: Option<String>,
}

impl AgentRecord {
    /// Build a record from an arbitrary JSON value. Non-object input yields an
    /// empty record.
    pub fn from_value(value: &Value) -> Self {
        match value.as_object() {
            Some(obj) => Self::from_map(obj),
            None => Self::default(),
        }
    }

    fn from_map(obj: &Map<String, Value>) -> Self {
        Self {
            id: lookup(obj, &["id"]).and_then(coerce_string),
            name: lookup(obj, &["name"]).and_then(coerce_string),
            latitude: lookup(obj, &["latitude", "lat"]).and_then(coerce_f64),
            longitude: lookup(obj, &["longitude", "lng", "lon"]).and_then(coerce_f64),
            altitude: lookup(obj, &["altitude"]).and_then(coerce_f64),
            agent_type: lookup(obj, &["agentType", "agent_type"]).and_then(coerce_string),
            object_type: lookup(obj, &["objectType", "object_type"]).and_then(coerce_string),
            interaction_fee_amount: lookup(obj, &["interactionFeeAmount", "interaction_fee_amount"])
                .and_then(coerce_f64),
            interaction_fee_token: lookup(obj, &["interactionFeeToken", "interaction_fee_token"])
                .and_then(coerce_string),
            interaction_fee_usdfc: lookup(obj, &["interactionFeeUsdfc", "interaction_fee_usdfc"])
                .and_then(coerce_f64),
            interaction_fee: lookup(obj, &["interactionFee", "interaction_fee"]).and_then(coerce_f64),
            payment_config: lookup(obj, &["paymentConfig", "payment_config"])
                .and_then(PaymentFieldConfig::from_value),
            agent_wallet_address: lookup(obj, &["agentWalletAddress", "agent_wallet_address"])
                .and_then(coerce_string),
            owner_wallet: lookup(obj, &["ownerWallet", "owner_wallet"]).and_then(coerce_string),
            deployer_wallet_address: lookup(
                obj,
                &["deployerWalletAddress", "deployer_wallet_address"],
            )
            .and_then(coerce_string),
            user_id: lookup(obj, &["userId", "user_id"]).and_then(coerce_string),
            distance_meters: lookup(obj, &["distanceMeters", "distance_meters", "distance"])
                .and_then(coerce_f64),
        }
    }

    /// Both coordinates, if the agent has a GPS fix
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

impl PaymentFieldConfig {
    /// Accepts an object or a JSON-encoded string holding an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(obj) => Some(Self::from_map(obj)),
            Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(obj)) => Some(Self::from_map(&obj)),
                _ => None,
            },
            _ => None,
        }
    }

    fn from_map(obj: &Map<String, Value>) -> Self {
        Self {
            interaction_fee_amount: lookup(obj, &["interactionFeeAmount", "interaction_fee_amount"])
                .and_then(coerce_f64),
            interaction_fee_token: lookup(obj, &["interactionFeeToken", "interaction_fee_token"])
                .and_then(coerce_string),
            payment_token: lookup(obj, &["paymentToken", "payment_token"]).and_then(coerce_string),
        }
    }
}

impl<'de> Deserialize<'de> for AgentRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom("agent record must be a JSON object"));
        }
        Ok(Self::from_value(&value))
    }
}

impl<'de> Deserialize<'de> for PaymentFieldConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value).unwrap_or_default())
    }
}

/// First non-null value among the candidate keys
fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

/// Numbers and numeric strings become `f64`; everything else, including
/// non-finite results, is absent.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
