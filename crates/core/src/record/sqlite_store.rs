//! SQLite-backed record store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    ApprovalStatus, NewScript, NewTopic, RecordStore, Script, ScriptChange, ScriptFilter,
    ScriptMode, ScriptStats, ScriptStatus, StoreError, Topic, TopicFilter, TopicStatus,
};

const TOPIC_COLUMNS: &str = "id, title, url, score, source, status, created_at";

const SCRIPT_COLUMNS: &str = "id, topic_id, topic_title, mode, text, hook, word_count, \
     estimated_duration, status, audio, video, approval_status, approval_decided_at, \
     upload_results, published_platforms, created_at, updated_at, revision";

/// SQLite-backed record store.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(db)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS topics (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                score INTEGER NOT NULL,
                source TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS scripts (
                id TEXT PRIMARY KEY,
                topic_id TEXT NOT NULL UNIQUE,
                topic_title TEXT NOT NULL,
                mode TEXT NOT NULL,
                text TEXT NOT NULL,
                hook TEXT NOT NULL,
                word_count INTEGER NOT NULL,
                estimated_duration REAL NOT NULL,
                status TEXT NOT NULL,
                audio TEXT,
                video TEXT,
                approval_status TEXT NOT NULL DEFAULT 'none',
                approval_decided_at TEXT,
                upload_results TEXT NOT NULL DEFAULT '{}',
                published_platforms TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                revision INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_topics_status ON topics(status);
            CREATE INDEX IF NOT EXISTS idx_topics_score ON topics(score DESC);
            CREATE INDEX IF NOT EXISTS idx_scripts_status ON scripts(status);
            CREATE INDEX IF NOT EXISTS idx_scripts_mode ON scripts(mode);
            "#,
        )
        .map_err(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_topic(row: &rusqlite::Row) -> rusqlite::Result<Topic> {
        Ok(Topic {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            score: row.get(3)?,
            source: row.get(4)?,
            status: parse_text(5, row.get(5)?)?,
            created_at: parse_time(6, row.get(6)?)?,
        })
    }

    fn row_to_script(row: &rusqlite::Row) -> rusqlite::Result<Script> {
        let audio: Option<String> = row.get(9)?;
        let video: Option<String> = row.get(10)?;
        let decided_at: Option<String> = row.get(12)?;

        Ok(Script {
            id: row.get(0)?,
            topic_id: row.get(1)?,
            topic_title: row.get(2)?,
            mode: parse_text(3, row.get(3)?)?,
            text: row.get(4)?,
            hook: row.get(5)?,
            word_count: row.get::<_, i64>(6)? as usize,
            estimated_duration: row.get(7)?,
            status: parse_text(8, row.get(8)?)?,
            audio: audio.map(|json| parse_json(9, &json)).transpose()?,
            video: video.map(|json| parse_json(10, &json)).transpose()?,
            approval_status: parse_text(11, row.get(11)?)?,
            approval_decided_at: decided_at.map(|ts| parse_time(12, ts)).transpose()?,
            upload_results: parse_json(13, &row.get::<_, String>(13)?)?,
            published_platforms: parse_json(14, &row.get::<_, String>(14)?)?,
            revision: row.get(17)?,
            created_at: parse_time(15, row.get(15)?)?,
            updated_at: parse_time(16, row.get(16)?)?,
        })
    }

    fn script_where_clause(filter: &ScriptFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(mode) = filter.mode {
            conditions.push("mode = ?");
            params.push(Box::new(mode.as_str()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn select_script(conn: &Connection, id: &str) -> Result<Option<Script>, StoreError> {
        conn.query_row(
            &format!("SELECT {} FROM scripts WHERE id = ?", SCRIPT_COLUMNS),
            params![id],
            Self::row_to_script,
        )
        .optional()
        .map_err(db)
    }
}

impl RecordStore for SqliteRecordStore {
    fn insert_topic(&self, topic: NewTopic) -> Result<Topic, StoreError> {
        let conn = self.lock()?;

        let created = Topic {
            id: uuid::Uuid::new_v4().to_string(),
            title: topic.title,
            url: topic.url,
            score: topic.score,
            source: topic.source,
            status: TopicStatus::Pending,
            created_at: Utc::now(),
        };

        conn.execute(
            &format!(
                "INSERT INTO topics ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
                TOPIC_COLUMNS
            ),
            params![
                created.id,
                created.title,
                created.url,
                created.score,
                created.source,
                created.status.as_str(),
                created.created_at.to_rfc3339(),
            ],
        )
        .map_err(db)?;

        Ok(created)
    }

    fn get_topic(&self, id: &str) -> Result<Option<Topic>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM topics WHERE id = ?", TOPIC_COLUMNS),
            params![id],
            Self::row_to_topic,
        )
        .optional()
        .map_err(db)
    }

    fn list_topics(&self, filter: &TopicFilter) -> Result<Vec<Topic>, StoreError> {
        let conn = self.lock()?;

        let status = filter.status.map(|s| s.as_str());
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM topics WHERE (?1 IS NULL OR status = ?1) \
                 ORDER BY created_at DESC, score DESC LIMIT ?2 OFFSET ?3",
                TOPIC_COLUMNS
            ))
            .map_err(db)?;

        let rows = stmt
            .query_map(
                params![status, filter.limit, filter.offset],
                Self::row_to_topic,
            )
            .map_err(db)?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db)
    }

    fn create_script(&self, script: NewScript) -> Result<Script, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db)?;

        let advanced = tx
            .execute(
                "UPDATE topics SET status = ?1 WHERE id = ?2 AND status = ?3",
                params![
                    TopicStatus::ScriptGenerated.as_str(),
                    script.topic_id,
                    TopicStatus::Pending.as_str()
                ],
            )
            .map_err(db)?;

        if advanced == 0 {
            let actual: Option<String> = tx
                .query_row(
                    "SELECT status FROM topics WHERE id = ?",
                    params![script.topic_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db)?;

            return Err(match actual {
                None => StoreError::NotFound {
                    kind: "topic",
                    id: script.topic_id,
                },
                Some(actual) => StoreError::StaleStatus {
                    kind: "topic",
                    id: script.topic_id,
                    expected: TopicStatus::Pending.to_string(),
                    actual,
                },
            });
        }

        let now = Utc::now();
        let created = Script {
            id: uuid::Uuid::new_v4().to_string(),
            topic_id: script.topic_id,
            topic_title: script.topic_title,
            mode: script.mode,
            text: script.text,
            hook: script.hook,
            word_count: script.word_count,
            estimated_duration: script.estimated_duration,
            status: ScriptStatus::PendingAudio,
            audio: None,
            video: None,
            approval_status: ApprovalStatus::None,
            approval_decided_at: None,
            upload_results: Default::default(),
            published_platforms: Vec::new(),
            revision: 0,
            created_at: now,
            updated_at: now,
        };

        let inserted = tx.execute(
            "INSERT INTO scripts (id, topic_id, topic_title, mode, text, hook, word_count, \
             estimated_duration, status, approval_status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                created.id,
                created.topic_id,
                created.topic_title,
                created.mode.as_str(),
                created.text,
                created.hook,
                created.word_count as i64,
                created.estimated_duration,
                created.status.as_str(),
                created.approval_status.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::DuplicateScript(created.topic_id));
            }
            Err(e) => return Err(db(e)),
        }

        tx.commit().map_err(db)?;
        Ok(created)
    }

    fn get_script(&self, id: &str) -> Result<Option<Script>, StoreError> {
        let conn = self.lock()?;
        Self::select_script(&conn, id)
    }

    fn find_script_by_topic(&self, topic_id: &str) -> Result<Option<Script>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM scripts WHERE topic_id = ?", SCRIPT_COLUMNS),
            params![topic_id],
            Self::row_to_script,
        )
        .optional()
        .map_err(db)
    }

    fn list_scripts(&self, filter: &ScriptFilter) -> Result<Vec<Script>, StoreError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::script_where_clause(filter);
        let sql = format!(
            "SELECT {} FROM scripts {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            SCRIPT_COLUMNS, where_clause
        );

        let mut stmt = conn.prepare(&sql).map_err(db)?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));
        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_script)
            .map_err(db)?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db)
    }

    fn count_scripts(&self, filter: &ScriptFilter) -> Result<i64, StoreError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::script_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM scripts {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(db)
    }

    fn transition_script(
        &self,
        id: &str,
        expected: ScriptStatus,
        change: ScriptChange,
    ) -> Result<Script, StoreError> {
        if !expected.can_transition_to(change.status) {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: expected,
                to: change.status,
            });
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db)?;

        let mut script = Self::select_script(&tx, id)?.ok_or_else(|| StoreError::NotFound {
            kind: "script",
            id: id.to_string(),
        })?;

        if script.status != expected {
            return Err(StoreError::StaleStatus {
                kind: "script",
                id: id.to_string(),
                expected: expected.to_string(),
                actual: script.status.to_string(),
            });
        }

        if let Some(expected_revision) = change.revision {
            if script.revision != expected_revision {
                return Err(StoreError::StaleRevision {
                    id: id.to_string(),
                    expected: expected_revision,
                    actual: script.revision,
                });
            }
        }

        let read_revision = script.revision;
        script.status = change.status;
        script.revision += 1;
        if let Some(audio) = change.audio {
            script.audio = Some(audio);
        }
        if let Some(video) = change.video {
            script.video = Some(video);
        }
        if let Some((approval, decided_at)) = change.approval {
            script.approval_status = approval;
            script.approval_decided_at = decided_at;
        }
        if let Some(results) = change.upload_results {
            script.upload_results = results;
        }
        if let Some(published) = change.published_platforms {
            script.published_platforms = published;
        }
        script.updated_at = Utc::now();

        let audio_json = script.audio.as_ref().map(to_json).transpose()?;
        let video_json = script.video.as_ref().map(to_json).transpose()?;

        let updated = tx
            .execute(
                "UPDATE scripts SET status = ?, audio = ?, video = ?, approval_status = ?, \
                 approval_decided_at = ?, upload_results = ?, published_platforms = ?, \
                 updated_at = ?, revision = ? WHERE id = ? AND status = ? AND revision = ?",
                params![
                    script.status.as_str(),
                    audio_json,
                    video_json,
                    script.approval_status.as_str(),
                    script.approval_decided_at.map(|t| t.to_rfc3339()),
                    to_json(&script.upload_results)?,
                    to_json(&script.published_platforms)?,
                    script.updated_at.to_rfc3339(),
                    script.revision,
                    id,
                    expected.as_str(),
                    read_revision,
                ],
            )
            .map_err(db)?;

        if updated == 0 {
            return Err(StoreError::StaleStatus {
                kind: "script",
                id: id.to_string(),
                expected: expected.to_string(),
                actual: "unknown".to_string(),
            });
        }

        tx.commit().map_err(db)?;
        Ok(script)
    }

    fn script_stats(&self) -> Result<ScriptStats, StoreError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT mode, COUNT(*), AVG(word_count), AVG(estimated_duration) \
                 FROM scripts GROUP BY mode",
            )
            .map_err(db)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    parse_text::<ScriptMode>(0, row.get(0)?)?,
                    row.get::<_, i64>(1)? as u64,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })
            .map_err(db)?;

        let mut stats = ScriptStats::default();
        for row in rows {
            let (mode, count, avg_length, avg_duration) = row.map_err(db)?;
            match mode {
                ScriptMode::Info => {
                    stats.info = count;
                    stats.avg_length_info = round1(avg_length);
                    stats.avg_duration_info = round1(avg_duration);
                }
                ScriptMode::Sales => {
                    stats.sales = count;
                    stats.avg_length_sales = round1(avg_length);
                    stats.avg_duration_sales = round1(avg_duration);
                }
            }
        }

        stats.total = stats.info + stats.sales;
        if stats.total > 0 {
            stats.info_percentage = round1(stats.info as f64 * 100.0 / stats.total as f64);
            stats.sales_percentage = round1(stats.sales as f64 * 100.0 / stats.total as f64);
        }

        Ok(stats)
    }
}

fn db(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Database(e.to_string()))
}

fn parse_text<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn parse_json<T: serde::de::DeserializeOwned>(idx: usize, value: &str) -> rusqlite::Result<T> {
    serde_json::from_str(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_time(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
