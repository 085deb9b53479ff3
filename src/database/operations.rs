use crate::database::models::{Document, Fields};
use crate::database::paths;
use crate::database::traits::{DocumentStore, FieldValue, Filter, SetOptions};
use crate::error::{Result, TeamLedgerError};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 基于 SQLite 的文档存储，每个文档以 JSON 文本保存在以路径为主键的表中
#[derive(Clone)]
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let conn = Connection::open(database_url)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                path TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                data TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)",
            [],
        )?;

        info!("Document store schema initialized successfully");
        Ok(())
    }

    fn read_sync(conn: &Connection, path: &str) -> Result<Option<Fields>> {
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM documents WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(text) => Ok(Some(Self::parse_fields(path, &text)?)),
            None => Ok(None),
        }
    }

    fn write_sync(conn: &Connection, path: &str, fields: &Fields) -> Result<()> {
        let (collection, doc_id) = paths::split_document(path)?;
        let data = serde_json::to_string(fields)?;

        conn.execute(
            "INSERT INTO documents (path, collection, doc_id, data, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(path) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![path, collection, doc_id, data, Utc::now()],
        )?;
        Ok(())
    }

    fn parse_fields(path: &str, text: &str) -> Result<Fields> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(map),
            _ => Err(TeamLedgerError::invalid_document(path, "stored data is not an object")),
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, path: &str) -> Result<Option<Document>> {
        if !paths::is_document_path(path) {
            return Err(TeamLedgerError::invalid_path(path));
        }
        let conn = self.conn.lock().await;
        Ok(Self::read_sync(&conn, path)?.map(|fields| Document::new(path, fields)))
    }

    async fn set(&self, path: &str, fields: Fields, options: SetOptions) -> Result<()> {
        let conn = self.conn.lock().await;

        let merged = if options.merge {
            let mut existing = Self::read_sync(&conn, path)?.unwrap_or_default();
            existing.extend(fields);
            existing
        } else {
            fields
        };

        Self::write_sync(&conn, path, &merged)?;
        debug!("Set document: {} (merge={})", path, options.merge);
        Ok(())
    }

    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        if !paths::is_collection_path(collection) {
            return Err(TeamLedgerError::invalid_path(collection));
        }
        let conn = self.conn.lock().await;

        let mut stmt =
            conn.prepare("SELECT path, data FROM documents WHERE collection = ?1 ORDER BY path")?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (path, data) = row?;
            let fields = Self::parse_fields(&path, &data)?;
            if filter.matches(&fields) {
                documents.push(Document::new(path, fields));
            }
        }

        debug!("Query {} matched {} documents", collection, documents.len());
        Ok(documents)
    }

    async fn update(&self, path: &str, fields: Vec<(String, FieldValue)>) -> Result<()> {
        let conn = self.conn.lock().await;

        let mut existing = Self::read_sync(&conn, path)?
            .ok_or_else(|| TeamLedgerError::invalid_document(path, "document does not exist"))?;

        for (field, value) in fields {
            match value {
                FieldValue::Set(v) => {
                    existing.insert(field, v);
                }
                FieldValue::Delete => {
                    existing.remove(&field);
                }
            }
        }

        Self::write_sync(&conn, path, &existing)?;
        debug!("Updated document: {}", path);
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let path = format!("{collection}/{id}");
        if !paths::is_document_path(&path) {
            return Err(TeamLedgerError::invalid_path(collection));
        }

        let conn = self.conn.lock().await;
        Self::write_sync(&conn, &path, &fields)?;
        debug!("Added document: {}", path);
        Ok(id)
    }
}
