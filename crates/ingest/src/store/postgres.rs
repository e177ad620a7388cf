//! `ipfs_metadata` table access.
//!
//! The table is keyed by `cid` (primary key); documents live in a `JSONB`
//! column named `token`. Inserts use `ON CONFLICT (cid) DO NOTHING` and treat
//! zero affected rows as a rejected duplicate.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use cidvault_core::{MetadataDocument, MetadataRecord, StoreError};

use super::traits::MetadataStore;

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE class 22, `data_exception` (e.g. `22P05` for `\u0000` in JSONB).
const DATA_EXCEPTION_CLASS: &str = "22";

/// Metadata store over a shared PostgreSQL pool. Cheap to clone.
#[derive(Clone)]
pub struct PgMetadataStore {
    pool: PgPool,
}

impl PgMetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    async fn insert(&self, cid: &str, document: &MetadataDocument) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO ipfs_metadata (cid, token)
             VALUES ($1, $2)
             ON CONFLICT (cid) DO NOTHING",
        )
        .bind(cid)
        .bind(Json(document))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ConstraintViolation(format!(
                "metadata for cid '{}' already exists",
                cid
            )));
        }

        Ok(())
    }

    async fn lookup(&self, cid: &str) -> Result<Option<MetadataDocument>, StoreError> {
        let row = sqlx::query_scalar::<_, Json<MetadataDocument>>(
            "SELECT token FROM ipfs_metadata WHERE cid = $1",
        )
        .bind(cid)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|Json(doc)| doc))
    }

    async fn scan_all(&self) -> Result<Vec<MetadataRecord>, StoreError> {
        let rows = sqlx::query_as::<_, (String, Json<MetadataDocument>)>(
            "SELECT cid, token FROM ipfs_metadata",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|(cid, Json(token))| MetadataRecord { cid, token })
            .collect())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Fold sqlx errors into the store taxonomy. Logging is left to the caller.
fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::ConstraintViolation(db_err.message().to_string())
        }
        sqlx::Error::Database(ref db_err) if db_err.constraint().is_some() => {
            StoreError::ConstraintViolation(db_err.message().to_string())
        }
        sqlx::Error::Database(ref db_err)
            if db_err
                .code()
                .is_some_and(|code| code.starts_with(DATA_EXCEPTION_CLASS)) =>
        {
            StoreError::EncodeError(db_err.message().to_string())
        }
        sqlx::Error::Encode(_)
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. } => StoreError::EncodeError(e.to_string()),
        other => StoreError::ConnectivityError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pool_errors_are_connectivity_errors() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            StoreError::ConnectivityError(_)
        ));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolClosed),
            StoreError::ConnectivityError(_)
        ));
    }

    #[test]
    fn decode_errors_are_encode_errors() {
        let err = sqlx::Error::Decode("bad jsonb".into());
        assert!(matches!(map_sqlx_error(err), StoreError::EncodeError(_)));
    }

    /// Minimal server-side error carrying a SQLSTATE.
    #[derive(Debug)]
    struct FakeDbError {
        code: &'static str,
        constraint: Option<&'static str>,
    }

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "server error {}", self.code)
        }
    }

    impl std::error::Error for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "server error"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(self.code.into())
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            match self.code {
                UNIQUE_VIOLATION => sqlx::error::ErrorKind::UniqueViolation,
                _ => sqlx::error::ErrorKind::Other,
            }
        }
    }

    fn db_error(code: &'static str, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError { code, constraint }))
    }

    #[test]
    fn unique_violation_is_constraint_violation() {
        assert!(matches!(
            map_sqlx_error(db_error(UNIQUE_VIOLATION, Some("ipfs_metadata_pkey"))),
            StoreError::ConstraintViolation(_)
        ));
    }

    #[test]
    fn data_exceptions_are_encode_errors() {
        // untranslatable_character: a `\u0000` inside a JSONB string.
        assert!(matches!(
            map_sqlx_error(db_error("22P05", None)),
            StoreError::EncodeError(_)
        ));
        assert!(matches!(
            map_sqlx_error(db_error("22021", None)),
            StoreError::EncodeError(_)
        ));
    }

    #[test]
    fn other_server_errors_are_connectivity_errors() {
        // admin_shutdown
        assert!(matches!(
            map_sqlx_error(db_error("57P01", None)),
            StoreError::ConnectivityError(_)
        ));
    }

    async fn connect() -> PgMetadataStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPool::connect(&url).await.unwrap();
        sqlx::migrate!("../../migrations").run(&pool).await.unwrap();
        PgMetadataStore::new(pool)
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL instance at DATABASE_URL"]
    async fn pg_insert_lookup_and_duplicate() {
        let store = connect().await;
        let cid = format!("test-{}", uuid::Uuid::new_v4());
        let first = MetadataDocument::from_value(json!({"v": "first"})).unwrap();
        let second = MetadataDocument::from_value(json!({"v": "second"})).unwrap();

        store.insert(&cid, &first).await.unwrap();
        let err = store.insert(&cid, &second).await.unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));

        assert_eq!(store.lookup(&cid).await.unwrap(), Some(first));
        assert_eq!(store.lookup("never-ingested").await.unwrap(), None);

        let all = store.scan_all().await.unwrap();
        assert_eq!(all.iter().filter(|r| r.cid == cid).count(), 1);

        sqlx::query("DELETE FROM ipfs_metadata WHERE cid = $1")
            .bind(&cid)
            .execute(store.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL instance at DATABASE_URL"]
    async fn pg_nul_in_document_is_encode_error() {
        let store = connect().await;
        let cid = format!("test-{}", uuid::Uuid::new_v4());
        let doc = MetadataDocument::from_slice(br#"{"name":"a\u0000b"}"#).unwrap();

        let err = store.insert(&cid, &doc).await.unwrap_err();
        assert!(matches!(err, StoreError::EncodeError(_)));
        assert_eq!(store.lookup(&cid).await.unwrap(), None);
    }
}
