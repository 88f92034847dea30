//! Payment sessions
//!
//! A session snapshots what the user is about to pay (amount, token and
//! recipient) at the moment the payment modal opens. The store is an explicit
//! handle owned by `AppState`; clones share the same sessions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::fee::{resolve_fee, FeeResolution};
use super::wallet::{resolve_wallet, WalletResolution};
use crate::agent::AgentRecord;
use crate::types::{AppError, AppResult};

pub const DEFAULT_SESSION_TTL_SECS: i64 = 15 * 60;
pub const MAX_SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;
/// How long a finished or expired session is kept before it is dropped
pub const SESSION_RETENTION_SECS: i64 = 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CryptoQr,
    VirtualCard,
    Onramp,
    BankTransfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Pending | PaymentStatus::Processing)
    }

    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Completed)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Failed)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Expired => "expired",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub id: Uuid,
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
    pub payment_method: PaymentMethod,
    pub fee: FeeResolution,
    pub recipient: WalletResolution,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PaymentSession {
    fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && now >= self.expires_at
    }

    /// When the session stopped being usable, if it has
    fn retired_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.status.is_terminal() {
            Some(self.updated_at)
        } else if self.is_past_expiry(now) {
            Some(self.expires_at)
        } else {
            None
        }
    }
}

/// Accepted TTL range is `1..=MAX_SESSION_TTL_SECS`
pub fn check_session_ttl(ttl_secs: i64) -> AppResult<i64> {
    if (1..=MAX_SESSION_TTL_SECS).contains(&ttl_secs) {
        Ok(ttl_secs)
    } else {
        Err(AppError::InvalidRequest(format!(
            "payment session TTL must be between 1 and {} seconds, got {}",
            MAX_SESSION_TTL_SECS, ttl_secs
        )))
    }
}

#[derive(Clone)]
pub struct PaymentSessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, PaymentSession>>>,
    ttl: Duration,
    retention: Duration,
}

impl Default for PaymentSessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL_SECS)
    }
}

impl PaymentSessionStore {
    /// `ttl_secs` outside `1..=MAX_SESSION_TTL_SECS` is clamped into range;
    /// configuration rejects such values before they get here.
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(ttl_secs.clamp(1, MAX_SESSION_TTL_SECS)),
            retention: Duration::seconds(SESSION_RETENTION_SECS),
        }
    }

    pub fn with_retention(mut self, retention_secs: i64) -> Self {
        self.retention = Duration::seconds(retention_secs.clamp(0, MAX_SESSION_TTL_SECS));
        self
    }

    /// Open a pending session priced and addressed by the resolvers
    pub async fn create(&self, agent: &AgentRecord, payment_method: PaymentMethod) -> PaymentSession {
        self.create_at(agent, payment_method, Utc::now()).await
    }

    async fn create_at(
        &self,
        agent: &AgentRecord,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> PaymentSession {
        let session = PaymentSession {
            id: Uuid::new_v4(),
            agent_id: agent.id.clone(),
            agent_name: agent.name.clone(),
            payment_method,
            fee: resolve_fee(agent),
            recipient: resolve_wallet(agent),
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
            expires_at: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        if !session.recipient.is_configured() {
            warn!("Payment session {} opened without a recipient wallet", session.id);
        }
        info!(
            "Created payment session {} for {} ({:?})",
            session.id,
            session.fee.display(),
            payment_method
        );

        let mut sessions = self.sessions.write().await;
        prune_retired(&mut sessions, now, self.retention);
        sessions.insert(session.id, session.clone());
        session
    }

    /// Drop sessions retired for longer than the retention window
    pub async fn prune(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        prune_retired(&mut sessions, Utc::now(), self.retention)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<PaymentSession> {
        self.get_at(id, Utc::now()).await
    }

    async fn get_at(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<PaymentSession> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("payment session {}", id)))?;

        expire_if_due(session, now);
        Ok(session.clone())
    }

    pub async fn update_status(&self, id: Uuid, status: PaymentStatus) -> AppResult<PaymentSession> {
        self.update_status_at(id, status, Utc::now()).await
    }

    async fn update_status_at(
        &self,
        id: Uuid,
        status: PaymentStatus,
        now: DateTime<Utc>,
    ) -> AppResult<PaymentSession> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("payment session {}", id)))?;

        expire_if_due(session, now);
        if !session.status.can_transition_to(status) {
            return Err(AppError::InvalidRequest(format!(
                "cannot move payment session from {} to {}",
                session.status, status
            )));
        }

        info!("Payment session {}: {} -> {}", id, session.status, status);
        session.status = status;
        session.updated_at = now;
        Ok(session.clone())
    }

    /// Sessions opened for one agent, newest first
    pub async fn list_for_agent(&self, agent_id: &str) -> Vec<PaymentSession> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let mut matching: Vec<PaymentSession> = sessions
            .values_mut()
            .filter(|s| s.agent_id.as_deref() == Some(agent_id))
            .map(|s| {
                expire_if_due(s, now);
                s.clone()
            })
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn prune_retired(
    sessions: &mut HashMap<Uuid, PaymentSession>,
    now: DateTime<Utc>,
    retention: Duration,
) -> usize {
    let before = sessions.len();
    sessions.retain(|_, session| match session.retired_at(now) {
        Some(retired) => retired
            .checked_add_signed(retention)
            .map_or(true, |cutoff| cutoff > now),
        None => true,
    });

    let removed = before - sessions.len();
    if removed > 0 {
        debug!("Pruned {} retired payment sessions", removed);
    }
    removed
}

fn expire_if_due(session: &mut PaymentSession, now: DateTime<Utc>) {
    if session.is_past_expiry(now) {
        info!("Payment session {} expired", session.id);
        session.status = PaymentStatus::Expired;
        session.updated_at = now;
    }
}
