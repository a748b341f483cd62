//! PostgreSQL deployment registry implementation.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use crate::error::{EdiError, EdiResult};
use crate::types::{
    DeploymentRecord, EnclaveName, ModelId, ModelVersion, VersionSelector,
};

use super::DeploymentRegistry;

/// PostgreSQL-backed deployment registry.
///
/// Uniqueness of (enclave, model id, model version) rides on the table's
/// primary key, so check-then-insert stays atomic without a transaction.
#[derive(Clone)]
pub struct PostgresRegistry {
    pool: PgPool,
}

impl PostgresRegistry {
    /// Connect to PostgreSQL and create a new registry.
    ///
    /// The required table is created if it doesn't exist.
    pub async fn new(url: &str, max_connections: u32) -> EdiResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        let registry = Self { pool };
        registry.ensure_schema().await?;

        Ok(registry)
    }

    /// Create a registry from an existing connection pool.
    pub async fn from_pool(pool: PgPool) -> EdiResult<Self> {
        let registry = Self { pool };
        registry.ensure_schema().await?;
        Ok(registry)
    }

    /// Ensure the required table exists.
    async fn ensure_schema(&self) -> EdiResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS model_deployments (
                enclave TEXT NOT NULL,
                model_id TEXT NOT NULL,
                model_version TEXT NOT NULL,
                image TEXT NOT NULL,
                desired_replicas INTEGER NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (enclave, model_id, model_version)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_model_deployments_enclave
            ON model_deployments (enclave)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Parse a row into a DeploymentRecord.
    fn row_to_record(row: &sqlx::postgres::PgRow) -> EdiResult<DeploymentRecord> {
        let enclave: String = row.get("enclave");
        let model_id: String = row.get("model_id");
        let model_version: String = row.get("model_version");
        let image: String = row.get("image");
        let desired_replicas: i32 = row.get("desired_replicas");
        let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
        let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

        let desired_replicas = u32::try_from(desired_replicas).map_err(|_| {
            EdiError::Serialisation(format!(
                "negative replica count in row: {desired_replicas}"
            ))
        })?;

        Ok(DeploymentRecord {
            enclave: EnclaveName::new(enclave),
            model_id: ModelId::new(model_id),
            model_version: ModelVersion::new(model_version),
            image,
            desired_replicas,
            created_at,
            updated_at,
        })
    }

    fn replicas_param(replicas: u32) -> EdiResult<i32> {
        i32::try_from(replicas)
            .map_err(|_| EdiError::internal(format!("replica count out of range: {replicas}")))
    }

    fn version_param(selector: &VersionSelector) -> Option<&str> {
        match selector {
            VersionSelector::AllVersions => None,
            VersionSelector::Specific(v) => Some(v.as_str()),
        }
    }
}

#[async_trait]
impl DeploymentRegistry for PostgresRegistry {
    async fn put(&self, record: DeploymentRecord) -> EdiResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO model_deployments (
                enclave, model_id, model_version, image, desired_replicas,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (enclave, model_id, model_version) DO NOTHING
            "#,
        )
        .bind(record.enclave.as_str())
        .bind(record.model_id.as_str())
        .bind(record.model_version.as_str())
        .bind(&record.image)
        .bind(Self::replicas_param(record.desired_replicas)?)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(EdiError::duplicate(record.model_id, record.model_version));
        }

        Ok(())
    }

    async fn remove(
        &self,
        enclave: &EnclaveName,
        model_id: &ModelId,
        selector: &VersionSelector,
    ) -> EdiResult<Vec<DeploymentRecord>> {
        let rows = sqlx::query(
            r#"
            DELETE FROM model_deployments
            WHERE enclave = $1
              AND model_id = $2
              AND ($3::text IS NULL OR model_version = $3)
            RETURNING enclave, model_id, model_version, image, desired_replicas,
                      created_at, updated_at
            "#,
        )
        .bind(enclave.as_str())
        .bind(model_id.as_str())
        .bind(Self::version_param(selector))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn set_scale(
        &self,
        enclave: &EnclaveName,
        model_id: &ModelId,
        selector: &VersionSelector,
        replicas: u32,
    ) -> EdiResult<Vec<DeploymentRecord>> {
        let rows = sqlx::query(
            r#"
            UPDATE model_deployments
            SET desired_replicas = $4, updated_at = NOW()
            WHERE enclave = $1
              AND model_id = $2
              AND ($3::text IS NULL OR model_version = $3)
            RETURNING enclave, model_id, model_version, image, desired_replicas,
                      created_at, updated_at
            "#,
        )
        .bind(enclave.as_str())
        .bind(model_id.as_str())
        .bind(Self::version_param(selector))
        .bind(Self::replicas_param(replicas)?)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(EdiError::model_not_found(model_id.clone(), selector.clone()));
        }

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn list(&self, enclave: &EnclaveName) -> EdiResult<Vec<DeploymentRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT enclave, model_id, model_version, image, desired_replicas,
                   created_at, updated_at
            FROM model_deployments
            WHERE enclave = $1
            ORDER BY model_id, model_version
            "#,
        )
        .bind(enclave.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_record).collect()
    }
}

impl std::fmt::Debug for PostgresRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresRegistry").finish_non_exhaustive()
    }
}
