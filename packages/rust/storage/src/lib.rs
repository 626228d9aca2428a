//! libSQL storage layer for research records, the task queue, and research
//! instructions.
//!
//! The batch processor is the sole writer: workers run the network pipeline
//! and hand results back to a single drain loop that owns all queue updates.

mod migrations;
mod queue;

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use serpforge_shared::types::ResearchRecord;
use serpforge_shared::{Result, SerpforgeError};

/// Instruction id of the standard research methodology. Research refuses to
/// run until this record exists.
pub const STANDARD_INSTRUCTION_ID: &str = "web_research_standard_2025";

/// One row of `serpforge list` output.
#[derive(Debug, Clone)]
pub struct ResearchSummary {
    pub id: String,
    pub keyword: String,
    pub research_name: String,
    pub created_at: DateTime<Utc>,
    pub execution_time_seconds: f64,
    pub status: String,
}

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SerpforgeError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;
        Self::from_db(db).await
    }

    /// Open an in-memory database (tests and dry runs).
    pub async fn open_memory() -> Result<Self> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;
        Self::from_db(db).await
    }

    async fn from_db(db: Database) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    SerpforgeError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Research records
    // -----------------------------------------------------------------------

    /// Persist a completed research record. Heavy payloads are stored as
    /// JSON columns.
    pub async fn save_research(&self, record: &ResearchRecord) -> Result<()> {
        let serp = to_json(&record.serp)?;
        let pages = to_json(&record.pages)?;
        let corpus = to_json(&record.corpus)?;
        let blueprint = to_json(&record.blueprint)?;
        let evidence = to_json(&record.evidence)?;
        let eeat = to_json(&record.eeat_checks)?;

        self.conn
            .execute(
                "INSERT INTO research (id, schema_version, keyword, research_name,
                     serp_json, pages_json, corpus_json, blueprint_json,
                     evidence_json, eeat_json, serp_source, created_at,
                     execution_time_seconds, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    record.id.as_str(),
                    i64::from(record.schema_version),
                    record.keyword.as_str(),
                    record.research_name.as_str(),
                    serp,
                    pages,
                    corpus,
                    blueprint,
                    evidence,
                    eeat,
                    record.serp_source.as_str(),
                    record.created_at.to_rfc3339(),
                    record.execution_time_seconds,
                    record.status.as_str(),
                ],
            )
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Load a research record by id.
    pub async fn get_research(&self, id: &str) -> Result<Option<ResearchRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, schema_version, keyword, research_name,
                        serp_json, pages_json, corpus_json, blueprint_json,
                        evidence_json, eeat_json, serp_source, created_at,
                        execution_time_seconds, status
                 FROM research WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?
        else {
            return Ok(None);
        };

        Ok(Some(ResearchRecord {
            id: get_str(&row, 0)?,
            schema_version: row
                .get::<u32>(1)
                .map_err(|e| SerpforgeError::Storage(e.to_string()))?,
            keyword: get_str(&row, 2)?,
            research_name: get_str(&row, 3)?,
            serp: from_json(&get_str(&row, 4)?)?,
            pages: from_json(&get_str(&row, 5)?)?,
            corpus: from_json(&get_str(&row, 6)?)?,
            blueprint: from_json(&get_str(&row, 7)?)?,
            evidence: from_json(&get_str(&row, 8)?)?,
            eeat_checks: from_json(&get_str(&row, 9)?)?,
            serp_source: get_str(&row, 10)?,
            created_at: parse_timestamp(&get_str(&row, 11)?)?,
            execution_time_seconds: row
                .get::<f64>(12)
                .map_err(|e| SerpforgeError::Storage(e.to_string()))?,
            status: get_str(&row, 13)?,
        }))
    }

    /// List the most recent research records, newest first.
    pub async fn list_research(&self, limit: u32) -> Result<Vec<ResearchSummary>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, keyword, research_name, created_at,
                        execution_time_seconds, status
                 FROM research
                 ORDER BY created_at DESC
                 LIMIT ?1",
                params![i64::from(limit)],
            )
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;

        let mut summaries = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?
        {
            summaries.push(ResearchSummary {
                id: get_str(&row, 0)?,
                keyword: get_str(&row, 1)?,
                research_name: get_str(&row, 2)?,
                created_at: parse_timestamp(&get_str(&row, 3)?)?,
                execution_time_seconds: row
                    .get::<f64>(4)
                    .map_err(|e| SerpforgeError::Storage(e.to_string()))?,
                status: get_str(&row, 5)?,
            });
        }
        Ok(summaries)
    }

    // -----------------------------------------------------------------------
    // Research instructions
    // -----------------------------------------------------------------------

    /// Seed the standard research instruction if it is not present yet.
    pub async fn ensure_standard_instruction(&self) -> Result<()> {
        let data = standard_instruction();
        self.conn
            .execute(
                "INSERT OR IGNORE INTO research_instructions
                     (instruction_id, title, version, instruction_data, created_at, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'active')",
                params![
                    STANDARD_INSTRUCTION_ID,
                    "Эталонная инструкция веб-исследования для SEO-анализа",
                    "1.0",
                    data.to_string(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Load an instruction by id. A missing standard instruction is a config
    /// error: research must not run on an unseeded database.
    pub async fn get_instruction(&self, instruction_id: &str) -> Result<serde_json::Value> {
        let mut rows = self
            .conn
            .query(
                "SELECT instruction_data FROM research_instructions
                 WHERE instruction_id = ?1 AND status = 'active'",
                params![instruction_id],
            )
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?
        else {
            return Err(SerpforgeError::config(format!(
                "research instruction '{instruction_id}' not found; run `serpforge config init`"
            )));
        };

        serde_json::from_str(&get_str(&row, 0)?)
            .map_err(|e| SerpforgeError::Storage(format!("corrupt instruction data: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| SerpforgeError::Storage(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| SerpforgeError::Storage(e.to_string()))
}

pub(crate) fn get_str(row: &libsql::Row, idx: i32) -> Result<String> {
    row.get::<String>(idx)
        .map_err(|e| SerpforgeError::Storage(e.to_string()))
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SerpforgeError::Storage(format!("bad timestamp {raw:?}: {e}")))
}

/// The standard research methodology record, stored as JSON.
fn standard_instruction() -> serde_json::Value {
    serde_json::json!({
        "id": STANDARD_INSTRUCTION_ID,
        "title": "Эталонная инструкция веб-исследования для SEO-анализа",
        "version": "1.0",
        "description": "Стандартизированная методология получения и обработки данных из интернета для SEO-анализа",
        "parameters": {
            "keyword_field": "{KW}",
            "language_field": "ru",
            "date_format": "ГГГГ-ММ-ДД",
        },
        "research_methodology": {
            "step_1": { "title": "Определение интента и контекста", "output": "intent_analysis" },
            "step_2": { "title": "SERP анализ ТОП-5", "output": "serp_analysis" },
            "step_3": { "title": "Извлечение артефактов страниц", "output": "pages_data" },
            "step_4": { "title": "Синтез корпуса и консенсус фактов", "output": "corpus_synthesis" },
            "step_5": { "title": "Сбор цифр и источников", "output": "evidence_pack" },
            "step_6": { "title": "E-E-A-T проверка источников", "output": "eeat_checks" },
            "step_7": { "title": "SEO blueprint и структура статьи", "output": "seo_blueprint" },
        },
        "output_format": {
            "description": "Упаковать результат в JSON и сохранить в БД с идентификатором и названием по ключевому слову",
        },
    })
}
