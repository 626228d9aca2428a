//! SQL migration definitions for the serpforge database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed as a batch.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: research, task_queue, task_groups, research_instructions",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Completed keyword research records; heavy payloads live as JSON columns
CREATE TABLE IF NOT EXISTS research (
    id                     TEXT PRIMARY KEY,
    schema_version         INTEGER NOT NULL,
    keyword                TEXT NOT NULL,
    research_name          TEXT NOT NULL,
    serp_json              TEXT NOT NULL,
    pages_json             TEXT NOT NULL,
    corpus_json            TEXT NOT NULL,
    blueprint_json         TEXT NOT NULL,
    evidence_json          TEXT NOT NULL,
    eeat_json              TEXT NOT NULL,
    serp_source            TEXT NOT NULL,
    created_at             TEXT NOT NULL,
    execution_time_seconds REAL NOT NULL,
    status                 TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_research_keyword ON research(keyword);
CREATE INDEX IF NOT EXISTS idx_research_created ON research(created_at);

-- Queued research tasks
CREATE TABLE IF NOT EXISTS task_queue (
    id                     INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id                TEXT UNIQUE NOT NULL,
    group_id               TEXT NOT NULL,
    keyword                TEXT NOT NULL,
    priority               INTEGER NOT NULL DEFAULT 1,
    status                 TEXT NOT NULL DEFAULT 'pending',
    created_at             TEXT NOT NULL,
    started_at             TEXT,
    completed_at           TEXT,
    execution_time_seconds REAL,
    error_message          TEXT,
    result_data            TEXT
);

CREATE INDEX IF NOT EXISTS idx_task_queue_pending
    ON task_queue(status, priority DESC, created_at ASC);
CREATE INDEX IF NOT EXISTS idx_task_queue_group ON task_queue(group_id);

-- Task groups with denormalized progress counters
CREATE TABLE IF NOT EXISTS task_groups (
    id                           INTEGER PRIMARY KEY AUTOINCREMENT,
    group_id                     TEXT UNIQUE NOT NULL,
    group_name                   TEXT NOT NULL,
    total_tasks                  INTEGER NOT NULL DEFAULT 0,
    completed_tasks              INTEGER NOT NULL DEFAULT 0,
    failed_tasks                 INTEGER NOT NULL DEFAULT 0,
    status                       TEXT NOT NULL DEFAULT 'pending',
    created_at                   TEXT NOT NULL,
    started_at                   TEXT,
    completed_at                 TEXT,
    total_execution_time_seconds REAL
);

-- Research methodology instructions; the standard record must exist before
-- any research runs
CREATE TABLE IF NOT EXISTS research_instructions (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    instruction_id   TEXT UNIQUE NOT NULL,
    title            TEXT NOT NULL,
    version          TEXT NOT NULL,
    instruction_data TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    status           TEXT NOT NULL DEFAULT 'active'
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
