use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::agent::AgentRecord;
use crate::types::{AppError, AppResult};

/// Read access to the agent table.
///
/// Rows are fetched as JSONB so that whatever columns the table currently
/// carries flow into `AgentRecord`'s lenient ingestion.
pub struct AgentRepository;

impl AgentRepository {
    pub async fn list_agents(pool: &PgPool, table: &str, limit: i64) -> AppResult<Vec<AgentRecord>> {
        let sql = format!(
            "SELECT to_jsonb(t) FROM {} AS t LIMIT $1",
            checked_table_name(table)?
        );

        let rows: Vec<Value> = sqlx::query_scalar::<_, Value>(&sql)
            .bind(limit.max(0))
            .fetch_all(pool)
            .await?;

        debug!("Fetched {} rows from {}", rows.len(), table);
        Ok(rows.iter().filter_map(row_to_agent).collect())
    }

    pub async fn get_agent(pool: &PgPool, table: &str, id: &str) -> AppResult<Option<AgentRecord>> {
        let sql = format!(
            "SELECT to_jsonb(t) FROM {} AS t WHERE t.id::text = $1 LIMIT 1",
            checked_table_name(table)?
        );

        let row: Option<Value> = sqlx::query_scalar::<_, Value>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.as_ref().and_then(row_to_agent))
    }
}

fn row_to_agent(row: &Value) -> Option<AgentRecord> {
    if !row.is_object() {
        warn!("Skipping agent row that is not an object: {}", row);
        return None;
    }
    Some(AgentRecord::from_value(row))
}

/// Table names are spliced into SQL, so only plain identifiers are allowed
pub fn checked_table_name(table: &str) -> AppResult<&str> {
    let mut chars = table.chars();
    let valid = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(table)
    } else {
        Err(AppError::InvalidRequest(format!(
            "invalid agents table name: {:?}",
            table
        )))
    }
}
