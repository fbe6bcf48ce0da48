//! SQLite database for subjects, documents, index bookkeeping, chat, summaries and quizzes
//!
//! Every row is scoped by `user_id`; callers pass the authenticated user and
//! lookups for another user's rows behave as if the row did not exist.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::analytics::QaSessionHistoryItem;
use crate::types::chat::{ChatSession, QaTurn};
use crate::types::quiz::{Quiz, QuizAttempt, StoredQuestion};
use crate::types::summary::SummaryRecord;
use crate::types::{
    Difficulty, Document, DocumentStatus, QuestionType, QuizQuestion, SourceKind, Subject,
    SummaryKind, TextBlock, VectorDoc, VectorDocStatus, VectorIndexHandle,
};

/// One graded answer joined with its attempt, used by analytics
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptItemFact {
    pub is_correct: bool,
    pub time_ms: u64,
    pub answered_at: DateTime<Utc>,
    pub attempt_finished_at: Option<DateTime<Utc>>,
}

/// Normalized text of one indexed document
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMaterial {
    pub document_id: i64,
    pub subject_id: i64,
    pub title: String,
    pub texts: Vec<String>,
}

/// New vector index row
#[derive(Debug, Clone)]
pub struct NewVectorIndex<'a> {
    pub user_id: Uuid,
    pub subject_id: i64,
    pub collection_id: &'a str,
    pub provider: &'a str,
    pub embedding_model_name: &'a str,
    pub storage_location: &'a Path,
}

/// SQLite-backed store for everything except vectors
#[derive(Clone)]
pub struct StudyDb {
    conn: Arc<Mutex<Connection>>,
}

impl StudyDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(dir) = path.as_ref().parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::database(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::database(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run a closure against the connection on the blocking pool
    pub async fn call<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&StudyDb) -> Result<T> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
            PRAGMA temp_store=MEMORY;
        "#).map_err(|e| Error::database(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS subjects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_subjects_user ON subjects(user_id);

            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                subject_id INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                source_kind TEXT NOT NULL,
                text_hash TEXT,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_subject ON documents(user_id, subject_id);

            -- Normalized text of each upload, replayed into the quiz registry at startup
            CREATE TABLE IF NOT EXISTS document_blocks (
                document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
                ordinal INTEGER NOT NULL,
                page INTEGER,
                text TEXT NOT NULL,
                PRIMARY KEY (document_id, ordinal)
            );

            -- One collection per (user, subject)
            CREATE TABLE IF NOT EXISTS vector_indexes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                subject_id INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
                collection_id TEXT NOT NULL,
                provider TEXT NOT NULL,
                embedding_model_name TEXT NOT NULL,
                storage_location TEXT NOT NULL,
                chunk_count INTEGER NOT NULL DEFAULT 0,
                doc_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(user_id, subject_id)
            );

            CREATE TABLE IF NOT EXISTS vector_docs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                vector_index_id INTEGER NOT NULL REFERENCES vector_indexes(id) ON DELETE CASCADE,
                document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
                chunk_count INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chat_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                subject_id INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
                title TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chat_sessions_subject ON chat_sessions(user_id, subject_id);

            CREATE TABLE IF NOT EXISTS qa_turns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL REFERENCES chat_sessions(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                has_answer INTEGER NOT NULL,
                citations_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_qa_turns_session ON qa_turns(session_id);

            CREATE TABLE IF NOT EXISTS summaries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                subject_id INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                topic TEXT NOT NULL,
                content_md TEXT NOT NULL,
                model TEXT NOT NULL,
                grounded INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_summaries_subject ON summaries(user_id, subject_id);

            CREATE TABLE IF NOT EXISTS quizzes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                subject_id INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                requested_count INTEGER NOT NULL,
                question_type TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                source TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_quizzes_subject ON quizzes(user_id, subject_id);

            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                quiz_id INTEGER NOT NULL REFERENCES quizzes(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                question_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_questions_quiz ON questions(quiz_id);

            CREATE TABLE IF NOT EXISTS quiz_attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                quiz_id INTEGER NOT NULL REFERENCES quizzes(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL,
                started_at TEXT NOT NULL,
                finished_at TEXT,
                correct_count INTEGER NOT NULL DEFAULT 0,
                accuracy REAL NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_quiz_attempts_user ON quiz_attempts(user_id);

            CREATE TABLE IF NOT EXISTS attempt_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                attempt_id INTEGER NOT NULL REFERENCES quiz_attempts(id) ON DELETE CASCADE,
                question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
                user_answer TEXT NOT NULL,
                is_correct INTEGER NOT NULL,
                time_ms INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_attempt_items_attempt ON attempt_items(attempt_id);
        "#)
        .map_err(|e| Error::database(format!("Failed to run migrations: {}", e)))?;

        tracing::debug!("Database migrations complete");
        Ok(())
    }

    // ==================== Subjects ====================

    /// Find a subject by name, ignoring case
    pub fn find_subject_by_name(&self, user_id: Uuid, name: &str) -> Result<Option<Subject>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, user_id, name, created_at FROM subjects
             WHERE user_id = ?1 AND lower(name) = lower(?2)
             ORDER BY id LIMIT 1",
            params![user_id.to_string(), name],
            row_to_subject,
        )
        .optional()
        .map_err(|e| Error::database(format!("Failed to find subject: {}", e)))
    }

    /// Return the user's subject with this name (ignoring case), inserting it when absent
    pub fn find_or_insert_subject(&self, user_id: Uuid, name: &str) -> Result<Subject> {
        let conn = self.conn.lock();
        let existing = conn
            .query_row(
                "SELECT id, user_id, name, created_at FROM subjects
                 WHERE user_id = ?1 AND lower(name) = lower(?2)
                 ORDER BY id LIMIT 1",
                params![user_id.to_string(), name],
                row_to_subject,
            )
            .optional()?;
        if let Some(subject) = existing {
            return Ok(subject);
        }
        Self::insert_subject_locked(&conn, user_id, name)
    }

    pub fn insert_subject(&self, user_id: Uuid, name: &str) -> Result<Subject> {
        let conn = self.conn.lock();
        Self::insert_subject_locked(&conn, user_id, name)
    }

    fn insert_subject_locked(conn: &Connection, user_id: Uuid, name: &str) -> Result<Subject> {
        let now = Utc::now();
        conn.execute(
            "INSERT INTO subjects (user_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![user_id.to_string(), name, now.to_rfc3339()],
        )
        .map_err(|e| Error::database(format!("Failed to insert subject: {}", e)))?;

        Ok(Subject {
            id: conn.last_insert_rowid(),
            user_id,
            name: name.to_string(),
            created_at: now,
        })
    }

    pub fn get_subject(&self, user_id: Uuid, subject_id: i64) -> Result<Option<Subject>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, user_id, name, created_at FROM subjects WHERE id = ?1 AND user_id = ?2",
            params![subject_id, user_id.to_string()],
            row_to_subject,
        )
        .optional()
        .map_err(|e| Error::database(format!("Failed to get subject: {}", e)))
    }

    pub fn list_subjects(&self, user_id: Uuid) -> Result<Vec<Subject>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT id, user_id, name, created_at FROM subjects WHERE user_id = ?1 ORDER BY id")
            .map_err(|e| Error::database(format!("Failed to prepare query: {}", e)))?;

        let subjects = stmt
            .query_map(params![user_id.to_string()], row_to_subject)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(subjects)
    }

    // ==================== Documents ====================

    pub fn insert_document(
        &self,
        user_id: Uuid,
        subject_id: i64,
        title: &str,
        source_kind: SourceKind,
    ) -> Result<Document> {
        let conn = self.conn.lock();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO documents (user_id, subject_id, title, source_kind, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id.to_string(),
                subject_id,
                title,
                source_kind.as_str(),
                DocumentStatus::Uploaded.as_str(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::database(format!("Failed to insert document: {}", e)))?;

        Ok(Document {
            id: conn.last_insert_rowid(),
            user_id,
            subject_id,
            title: title.to_string(),
            source_kind,
            text_hash: None,
            status: DocumentStatus::Uploaded,
            created_at: now,
        })
    }

    pub fn set_document_hash(&self, document_id: i64, text_hash: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE documents SET text_hash = ?1 WHERE id = ?2",
            params![text_hash, document_id],
        )?;
        Ok(())
    }

    pub fn set_document_status(&self, document_id: i64, status: DocumentStatus) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE documents SET status = ?1 WHERE id = ?2",
            params![status.as_str(), document_id],
        )?;
        Ok(())
    }

    pub fn get_document(&self, user_id: Uuid, document_id: i64) -> Result<Option<Document>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, user_id, subject_id, title, source_kind, text_hash, status, created_at
             FROM documents WHERE id = ?1 AND user_id = ?2",
            params![document_id, user_id.to_string()],
            row_to_document,
        )
        .optional()
        .map_err(|e| Error::database(format!("Failed to get document: {}", e)))
    }

    pub fn list_documents(&self, user_id: Uuid, subject_id: i64) -> Result<Vec<Document>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, subject_id, title, source_kind, text_hash, status, created_at
             FROM documents WHERE user_id = ?1 AND subject_id = ?2 ORDER BY id",
        )?;
        let docs = stmt
            .query_map(params![user_id.to_string(), subject_id], row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(docs)
    }

    pub fn insert_document_blocks(&self, document_id: i64, blocks: &[TextBlock]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for (ordinal, block) in blocks.iter().enumerate() {
            tx.execute(
                "INSERT INTO document_blocks (document_id, ordinal, page, text) VALUES (?1, ?2, ?3, ?4)",
                params![document_id, ordinal as i64, block.page, block.text],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Text of every indexed document, oldest first
    pub fn indexed_materials(&self) -> Result<Vec<StoredMaterial>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT d.id, d.subject_id, d.title, b.text
            FROM documents d
            JOIN document_blocks b ON b.document_id = d.id
            WHERE d.status = ?1
            ORDER BY d.id, b.ordinal
            "#,
        )?;
        let rows = stmt
            .query_map(params![DocumentStatus::Indexed.as_str()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut materials: Vec<StoredMaterial> = Vec::new();
        for (document_id, subject_id, title, text) in rows {
            match materials.last_mut() {
                Some(last) if last.document_id == document_id => last.texts.push(text),
                _ => materials.push(StoredMaterial {
                    document_id,
                    subject_id,
                    title,
                    texts: vec![text],
                }),
            }
        }
        Ok(materials)
    }

    // ==================== Vector index bookkeeping ====================

    pub fn get_vector_index(&self, user_id: Uuid, subject_id: i64) -> Result<Option<VectorIndexHandle>> {
        let conn = self.conn.lock();
        Self::select_vector_index(&conn, user_id, subject_id)
    }

    fn select_vector_index(
        conn: &Connection,
        user_id: Uuid,
        subject_id: i64,
    ) -> Result<Option<VectorIndexHandle>> {
        conn.query_row(
            "SELECT id, user_id, subject_id, collection_id, provider, embedding_model_name,
                    storage_location, chunk_count, doc_count, created_at, updated_at
             FROM vector_indexes WHERE user_id = ?1 AND subject_id = ?2",
            params![user_id.to_string(), subject_id],
            row_to_vector_index,
        )
        .optional()
        .map_err(|e| Error::database(format!("Failed to get vector index: {}", e)))
    }

    /// Return the handle for (user, subject), inserting it on first use
    pub fn ensure_vector_index(&self, new: &NewVectorIndex<'_>) -> Result<VectorIndexHandle> {
        let conn = self.conn.lock();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT OR IGNORE INTO vector_indexes (
                user_id, subject_id, collection_id, provider, embedding_model_name,
                storage_location, chunk_count, doc_count, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0, ?7, ?7)",
            params![
                new.user_id.to_string(),
                new.subject_id,
                new.collection_id,
                new.provider,
                new.embedding_model_name,
                new.storage_location.to_string_lossy(),
                now,
            ],
        )
        .map_err(|e| Error::database(format!("Failed to create vector index: {}", e)))?;

        Self::select_vector_index(&conn, new.user_id, new.subject_id)?
            .ok_or_else(|| Error::database("vector index row missing after insert"))
    }

    /// Add to the document and chunk totals of an index
    pub fn bump_vector_index(&self, index_id: i64, docs: u64, chunks: u64) -> Result<VectorIndexHandle> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE vector_indexes
             SET doc_count = doc_count + ?1, chunk_count = chunk_count + ?2, updated_at = ?3
             WHERE id = ?4",
            params![docs as i64, chunks as i64, Utc::now().to_rfc3339(), index_id],
        )?;

        conn.query_row(
            "SELECT id, user_id, subject_id, collection_id, provider, embedding_model_name,
                    storage_location, chunk_count, doc_count, created_at, updated_at
             FROM vector_indexes WHERE id = ?1",
            params![index_id],
            row_to_vector_index,
        )
        .map_err(|e| Error::database(format!("Failed to reload vector index: {}", e)))
    }

    pub fn insert_vector_doc(
        &self,
        vector_index_id: i64,
        document_id: i64,
        chunk_count: u64,
        status: VectorDocStatus,
    ) -> Result<VectorDoc> {
        let conn = self.conn.lock();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO vector_docs (vector_index_id, document_id, chunk_count, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                vector_index_id,
                document_id,
                chunk_count as i64,
                status.as_str(),
                now.to_rfc3339(),
            ],
        )?;

        Ok(VectorDoc {
            id: conn.last_insert_rowid(),
            vector_index_id,
            document_id,
            chunk_count,
            status,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn set_vector_doc_status(&self, vector_doc_id: i64, status: VectorDocStatus) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE vector_docs SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), vector_doc_id],
        )?;
        Ok(())
    }

    pub fn list_vector_docs(&self, vector_index_id: i64) -> Result<Vec<VectorDoc>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, vector_index_id, document_id, chunk_count, status, created_at, updated_at
             FROM vector_docs WHERE vector_index_id = ?1 ORDER BY id",
        )?;
        let docs = stmt
            .query_map(params![vector_index_id], |row| {
                let status: String = row.get(4)?;
                let chunk_count: i64 = row.get(3)?;
                Ok(VectorDoc {
                    id: row.get(0)?,
                    vector_index_id: row.get(1)?,
                    document_id: row.get(2)?,
                    chunk_count: chunk_count as u64,
                    status: VectorDocStatus::parse(&status),
                    created_at: parse_ts(&row.get::<_, String>(5)?),
                    updated_at: parse_ts(&row.get::<_, String>(6)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(docs)
    }

    // ==================== Chat ====================

    pub fn insert_chat_session(&self, user_id: Uuid, subject_id: i64, title: &str) -> Result<ChatSession> {
        let conn = self.conn.lock();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO chat_sessions (user_id, subject_id, title, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user_id.to_string(), subject_id, title, now.to_rfc3339()],
        )?;

        Ok(ChatSession {
            id: conn.last_insert_rowid(),
            user_id,
            subject_id,
            title: Some(title.to_string()),
            created_at: now,
        })
    }

    pub fn get_chat_session(&self, user_id: Uuid, session_id: i64) -> Result<Option<ChatSession>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, user_id, subject_id, title, created_at FROM chat_sessions
             WHERE id = ?1 AND user_id = ?2",
            params![session_id, user_id.to_string()],
            row_to_chat_session,
        )
        .optional()
        .map_err(|e| Error::database(format!("Failed to get chat session: {}", e)))
    }

    pub fn list_chat_sessions(&self, user_id: Uuid, subject_id: i64) -> Result<Vec<ChatSession>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, subject_id, title, created_at FROM chat_sessions
             WHERE user_id = ?1 AND subject_id = ?2 ORDER BY id DESC",
        )?;
        let sessions = stmt
            .query_map(params![user_id.to_string(), subject_id], row_to_chat_session)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }

    pub fn insert_qa_turn(
        &self,
        session_id: i64,
        user_id: Uuid,
        question: &str,
        answer: &str,
        has_answer: bool,
        citations: &[String],
    ) -> Result<QaTurn> {
        let conn = self.conn.lock();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO qa_turns (session_id, user_id, question, answer, has_answer, citations_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session_id,
                user_id.to_string(),
                question,
                answer,
                has_answer,
                serde_json::to_string(citations)?,
                now.to_rfc3339(),
            ],
        )?;

        Ok(QaTurn {
            id: conn.last_insert_rowid(),
            session_id,
            user_id,
            question: question.to_string(),
            answer: answer.to_string(),
            has_answer,
            citations: citations.to_vec(),
            created_at: now,
        })
    }

    pub fn list_qa_turns(&self, session_id: i64) -> Result<Vec<QaTurn>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, session_id, user_id, question, answer, has_answer, citations_json, created_at
             FROM qa_turns WHERE session_id = ?1 ORDER BY id",
        )?;
        let turns = stmt
            .query_map(params![session_id], row_to_qa_turn)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(turns)
    }

    /// Sessions of a subject with a preview of their latest turn, newest first
    pub fn qa_session_history(
        &self,
        user_id: Uuid,
        subject_id: i64,
        limit: usize,
    ) -> Result<Vec<QaSessionHistoryItem>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT s.id, s.title,
                   (SELECT question FROM qa_turns WHERE session_id = s.id ORDER BY id DESC LIMIT 1),
                   (SELECT answer FROM qa_turns WHERE session_id = s.id ORDER BY id DESC LIMIT 1),
                   (SELECT created_at FROM qa_turns WHERE session_id = s.id ORDER BY id DESC LIMIT 1),
                   (SELECT COUNT(*) FROM qa_turns WHERE session_id = s.id)
            FROM chat_sessions s
            WHERE s.user_id = ?1 AND s.subject_id = ?2
            ORDER BY s.created_at DESC, s.id DESC
            LIMIT ?3
            "#,
        )?;

        let items = stmt
            .query_map(params![user_id.to_string(), subject_id, limit as i64], |row| {
                let title: Option<String> = row.get(1)?;
                let answer: Option<String> = row.get(3)?;
                let last_at: Option<String> = row.get(4)?;
                let count: i64 = row.get(5)?;
                Ok(QaSessionHistoryItem {
                    chat_session_id: row.get(0)?,
                    title: title.unwrap_or_else(|| "Smart Q&A".to_string()),
                    last_question: row.get(2)?,
                    last_answer_preview: answer.map(|a| a.chars().take(200).collect()),
                    last_turn_at: last_at.map(|s| parse_ts(&s)),
                    turn_count: count as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    // ==================== Summaries ====================

    #[allow(clippy::too_many_arguments)]
    pub fn insert_summary(
        &self,
        user_id: Uuid,
        subject_id: i64,
        kind: SummaryKind,
        topic: &str,
        content_md: &str,
        model: &str,
        grounded: bool,
    ) -> Result<SummaryRecord> {
        let conn = self.conn.lock();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO summaries (user_id, subject_id, kind, topic, content_md, model, grounded, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user_id.to_string(),
                subject_id,
                kind.as_str(),
                topic,
                content_md,
                model,
                grounded,
                now.to_rfc3339(),
            ],
        )?;

        Ok(SummaryRecord {
            id: conn.last_insert_rowid(),
            user_id,
            subject_id,
            kind,
            topic: topic.to_string(),
            content_md: content_md.to_string(),
            model: model.to_string(),
            grounded,
            created_at: now,
        })
    }

    /// Summaries of a subject, newest first
    pub fn list_summaries(&self, user_id: Uuid, subject_id: i64, limit: usize) -> Result<Vec<SummaryRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, subject_id, kind, topic, content_md, model, grounded, created_at
             FROM summaries WHERE user_id = ?1 AND subject_id = ?2
             ORDER BY created_at DESC, id DESC LIMIT ?3",
        )?;
        let records = stmt
            .query_map(params![user_id.to_string(), subject_id, limit as i64], row_to_summary)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    // ==================== Quizzes ====================

    /// Store a quiz and its questions in one transaction
    #[allow(clippy::too_many_arguments)]
    pub fn insert_quiz(
        &self,
        user_id: Uuid,
        subject_id: i64,
        title: &str,
        requested_count: usize,
        question_type: QuestionType,
        difficulty: Difficulty,
        source: &str,
        questions: &[QuizQuestion],
    ) -> Result<Quiz> {
        let mut conn = self.conn.lock();
        let now = Utc::now();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO quizzes (user_id, subject_id, title, requested_count, question_type, difficulty, source, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user_id.to_string(),
                subject_id,
                title,
                requested_count as i64,
                question_type.as_str(),
                difficulty.as_str(),
                source,
                now.to_rfc3339(),
            ],
        )?;
        let quiz_id = tx.last_insert_rowid();

        let mut stored = Vec::with_capacity(questions.len());
        for (position, question) in questions.iter().enumerate() {
            tx.execute(
                "INSERT INTO questions (quiz_id, position, question_json) VALUES (?1, ?2, ?3)",
                params![quiz_id, position as i64, serde_json::to_string(question)?],
            )?;
            stored.push(StoredQuestion {
                question_id: tx.last_insert_rowid(),
                question: question.clone(),
            });
        }

        tx.commit()?;

        Ok(Quiz {
            id: quiz_id,
            user_id,
            subject_id,
            title: title.to_string(),
            requested_count,
            question_type,
            difficulty,
            source: source.to_string(),
            created_at: now,
            questions: stored,
        })
    }

    pub fn get_quiz(&self, user_id: Uuid, quiz_id: i64) -> Result<Option<Quiz>> {
        let conn = self.conn.lock();
        let quiz = conn
            .query_row(
                "SELECT id, user_id, subject_id, title, requested_count, question_type, difficulty, source, created_at
                 FROM quizzes WHERE id = ?1 AND user_id = ?2",
                params![quiz_id, user_id.to_string()],
                row_to_quiz,
            )
            .optional()?;

        let Some(mut quiz) = quiz else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT id, question_json FROM questions WHERE quiz_id = ?1 ORDER BY position",
        )?;
        let rows = stmt
            .query_map(params![quiz_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for (question_id, json) in rows {
            quiz.questions.push(StoredQuestion {
                question_id,
                question: serde_json::from_str(&json)?,
            });
        }
        Ok(Some(quiz))
    }

    /// Quizzes of a subject without their questions, newest first
    pub fn list_quizzes(&self, user_id: Uuid, subject_id: i64, limit: usize) -> Result<Vec<Quiz>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, subject_id, title, requested_count, question_type, difficulty, source, created_at
             FROM quizzes WHERE user_id = ?1 AND subject_id = ?2
             ORDER BY created_at DESC, id DESC LIMIT ?3",
        )?;
        let quizzes = stmt
            .query_map(params![user_id.to_string(), subject_id, limit as i64], row_to_quiz)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(quizzes)
    }

    /// A question belonging to `quiz_id`
    pub fn get_question(&self, quiz_id: i64, question_id: i64) -> Result<Option<QuizQuestion>> {
        let conn = self.conn.lock();
        let json: Option<String> = conn
            .query_row(
                "SELECT question_json FROM questions WHERE id = ?1 AND quiz_id = ?2",
                params![question_id, quiz_id],
                |row| row.get(0),
            )
            .optional()?;

        json.map(|j| serde_json::from_str(&j).map_err(Error::from))
            .transpose()
    }

    pub fn insert_attempt(&self, quiz_id: i64, user_id: Uuid) -> Result<QuizAttempt> {
        let conn = self.conn.lock();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO quiz_attempts (quiz_id, user_id, started_at) VALUES (?1, ?2, ?3)",
            params![quiz_id, user_id.to_string(), now.to_rfc3339()],
        )?;

        Ok(QuizAttempt {
            id: conn.last_insert_rowid(),
            quiz_id,
            user_id,
            started_at: now,
            finished_at: None,
            correct_count: 0,
            accuracy: 0.0,
        })
    }

    pub fn get_attempt(&self, user_id: Uuid, attempt_id: i64) -> Result<Option<QuizAttempt>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, quiz_id, user_id, started_at, finished_at, correct_count, accuracy
             FROM quiz_attempts WHERE id = ?1 AND user_id = ?2",
            params![attempt_id, user_id.to_string()],
            row_to_attempt,
        )
        .optional()
        .map_err(|e| Error::database(format!("Failed to get attempt: {}", e)))
    }

    pub fn insert_attempt_item(
        &self,
        attempt_id: i64,
        question_id: i64,
        user_answer: &str,
        is_correct: bool,
        time_ms: u64,
    ) -> Result<i64> {
        self.insert_attempt_item_at(attempt_id, question_id, user_answer, is_correct, time_ms, Utc::now())
    }

    /// Record an answer with an explicit timestamp
    pub fn insert_attempt_item_at(
        &self,
        attempt_id: i64,
        question_id: i64,
        user_answer: &str,
        is_correct: bool,
        time_ms: u64,
        at: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO attempt_items (attempt_id, question_id, user_answer, is_correct, time_ms, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                attempt_id,
                question_id,
                user_answer,
                is_correct,
                time_ms as i64,
                at.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Close an attempt, scoring it over the answers recorded so far
    pub fn finish_attempt(&self, attempt_id: i64, at: DateTime<Utc>) -> Result<QuizAttempt> {
        let conn = self.conn.lock();
        let (answered, correct): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(is_correct), 0) FROM attempt_items WHERE attempt_id = ?1",
            params![attempt_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let accuracy = if answered > 0 {
            correct as f64 / answered as f64
        } else {
            0.0
        };

        conn.execute(
            "UPDATE quiz_attempts SET finished_at = ?1, correct_count = ?2, accuracy = ?3 WHERE id = ?4",
            params![at.to_rfc3339(), correct, accuracy, attempt_id],
        )?;

        conn.query_row(
            "SELECT id, quiz_id, user_id, started_at, finished_at, correct_count, accuracy
             FROM quiz_attempts WHERE id = ?1",
            params![attempt_id],
            row_to_attempt,
        )
        .map_err(|e| Error::database(format!("Failed to reload attempt: {}", e)))
    }

    /// Attempts on a subject's quizzes, most recently submitted first
    pub fn list_attempts(&self, user_id: Uuid, subject_id: i64, limit: usize) -> Result<Vec<QuizAttempt>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT a.id, a.quiz_id, a.user_id, a.started_at, a.finished_at, a.correct_count, a.accuracy
            FROM quiz_attempts a
            JOIN quizzes q ON q.id = a.quiz_id
            WHERE a.user_id = ?1 AND q.user_id = ?1 AND q.subject_id = ?2
            ORDER BY COALESCE(a.finished_at, a.started_at) DESC, a.id DESC
            LIMIT ?3
            "#,
        )?;
        let attempts = stmt
            .query_map(params![user_id.to_string(), subject_id, limit as i64], row_to_attempt)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(attempts)
    }

    /// Every graded answer of the user, optionally restricted to one subject
    pub fn attempt_item_facts(&self, user_id: Uuid, subject_id: Option<i64>) -> Result<Vec<AttemptItemFact>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT i.is_correct, i.time_ms, i.created_at, a.finished_at
            FROM attempt_items i
            JOIN quiz_attempts a ON a.id = i.attempt_id
            JOIN quizzes q ON q.id = a.quiz_id
            WHERE a.user_id = ?1 AND q.user_id = ?1 AND (?2 IS NULL OR q.subject_id = ?2)
            ORDER BY i.id
            "#,
        )?;
        let facts = stmt
            .query_map(params![user_id.to_string(), subject_id], |row| {
                let time_ms: i64 = row.get(1)?;
                let answered_at: String = row.get(2)?;
                let finished_at: Option<String> = row.get(3)?;
                Ok(AttemptItemFact {
                    is_correct: row.get(0)?,
                    time_ms: time_ms.max(0) as u64,
                    answered_at: parse_ts(&answered_at),
                    attempt_finished_at: finished_at.map(|s| parse_ts(&s)),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(facts)
    }
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_user(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap_or_default()
}

fn row_to_subject(row: &rusqlite::Row) -> rusqlite::Result<Subject> {
    let user_id: String = row.get(1)?;
    let created_at: String = row.get(3)?;
    Ok(Subject {
        id: row.get(0)?,
        user_id: parse_user(&user_id),
        name: row.get(2)?,
        created_at: parse_ts(&created_at),
    })
}

fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<Document> {
    let user_id: String = row.get(1)?;
    let source_kind: String = row.get(4)?;
    let status: String = row.get(6)?;
    let created_at: String = row.get(7)?;
    Ok(Document {
        id: row.get(0)?,
        user_id: parse_user(&user_id),
        subject_id: row.get(2)?,
        title: row.get(3)?,
        source_kind: SourceKind::parse(&source_kind),
        text_hash: row.get(5)?,
        status: DocumentStatus::parse(&status),
        created_at: parse_ts(&created_at),
    })
}

fn row_to_vector_index(row: &rusqlite::Row) -> rusqlite::Result<VectorIndexHandle> {
    let user_id: String = row.get(1)?;
    let location: String = row.get(6)?;
    let chunk_count: i64 = row.get(7)?;
    let doc_count: i64 = row.get(8)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;
    Ok(VectorIndexHandle {
        id: row.get(0)?,
        user_id: parse_user(&user_id),
        subject_id: row.get(2)?,
        collection_id: row.get(3)?,
        provider: row.get(4)?,
        embedding_model_name: row.get(5)?,
        storage_location: PathBuf::from(location),
        chunk_count: chunk_count.max(0) as u64,
        doc_count: doc_count.max(0) as u64,
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

fn row_to_chat_session(row: &rusqlite::Row) -> rusqlite::Result<ChatSession> {
    let user_id: String = row.get(1)?;
    let created_at: String = row.get(4)?;
    Ok(ChatSession {
        id: row.get(0)?,
        user_id: parse_user(&user_id),
        subject_id: row.get(2)?,
        title: row.get(3)?,
        created_at: parse_ts(&created_at),
    })
}

fn row_to_qa_turn(row: &rusqlite::Row) -> rusqlite::Result<QaTurn> {
    let user_id: String = row.get(2)?;
    let citations_json: String = row.get(6)?;
    let created_at: String = row.get(7)?;
    Ok(QaTurn {
        id: row.get(0)?,
        session_id: row.get(1)?,
        user_id: parse_user(&user_id),
        question: row.get(3)?,
        answer: row.get(4)?,
        has_answer: row.get(5)?,
        citations: serde_json::from_str(&citations_json).unwrap_or_default(),
        created_at: parse_ts(&created_at),
    })
}

fn row_to_summary(row: &rusqlite::Row) -> rusqlite::Result<SummaryRecord> {
    let user_id: String = row.get(1)?;
    let kind: String = row.get(3)?;
    let created_at: String = row.get(8)?;
    Ok(SummaryRecord {
        id: row.get(0)?,
        user_id: parse_user(&user_id),
        subject_id: row.get(2)?,
        kind: SummaryKind::parse(&kind),
        topic: row.get(4)?,
        content_md: row.get(5)?,
        model: row.get(6)?,
        grounded: row.get(7)?,
        created_at: parse_ts(&created_at),
    })
}

fn row_to_quiz(row: &rusqlite::Row) -> rusqlite::Result<Quiz> {
    let user_id: String = row.get(1)?;
    let requested: i64 = row.get(4)?;
    let question_type: String = row.get(5)?;
    let difficulty: String = row.get(6)?;
    let created_at: String = row.get(8)?;
    Ok(Quiz {
        id: row.get(0)?,
        user_id: parse_user(&user_id),
        subject_id: row.get(2)?,
        title: row.get(3)?,
        requested_count: requested.max(0) as usize,
        question_type: QuestionType::normalize(&question_type).unwrap_or_default(),
        difficulty: Difficulty::normalize(&difficulty).unwrap_or_default(),
        source: row.get(7)?,
        created_at: parse_ts(&created_at),
        questions: Vec::new(),
    })
}

fn row_to_attempt(row: &rusqlite::Row) -> rusqlite::Result<QuizAttempt> {
    let user_id: String = row.get(2)?;
    let started_at: String = row.get(3)?;
    let finished_at: Option<String> = row.get(4)?;
    let correct: i64 = row.get(5)?;
    Ok(QuizAttempt {
        id: row.get(0)?,
        quiz_id: row.get(1)?,
        user_id: parse_user(&user_id),
        started_at: parse_ts(&started_at),
        finished_at: finished_at.map(|s| parse_ts(&s)),
        correct_count: correct.max(0) as u32,
        accuracy: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str) -> QuizQuestion {
        QuizQuestion {
            id: 1,
            question_type: QuestionType::ShortAnswer,
            difficulty: Difficulty::Easy,
            question: text.to_string(),
            options: None,
            answer: "mitochondria".to_string(),
            explanation: None,
            citations: vec![],
        }
    }

    #[test]
    fn test_subject_lookup_is_case_insensitive_and_scoped() {
        let db = StudyDb::in_memory().unwrap();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let created = db.insert_subject(alice, "Biology").unwrap();
        let found = db.find_subject_by_name(alice, "bIOLOGY").unwrap().unwrap();
        assert_eq!(found.id, created.id);

        assert!(db.find_subject_by_name(bob, "Biology").unwrap().is_none());
        assert!(db.get_subject(bob, created.id).unwrap().is_none());
        assert_eq!(db.find_or_insert_subject(alice, "BIOLOGY").unwrap().id, created.id);
        assert_ne!(db.find_or_insert_subject(bob, "Biology").unwrap().id, created.id);
    }

    #[test]
    fn test_indexed_materials_skip_unfinished_documents() {
        let db = StudyDb::in_memory().unwrap();
        let user = Uuid::new_v4();
        let subject = db.insert_subject(user, "Biology").unwrap();

        let done = db
            .insert_document(user, subject.id, "cells.pdf", SourceKind::Pdf)
            .unwrap();
        db.insert_document_blocks(
            done.id,
            &[TextBlock::page("Cells divide.", 1), TextBlock::page("DNA replicates.", 2)],
        )
        .unwrap();
        db.set_document_status(done.id, DocumentStatus::Indexed).unwrap();

        let pending = db
            .insert_document(user, subject.id, "draft.txt", SourceKind::Text)
            .unwrap();
        db.insert_document_blocks(pending.id, &[TextBlock::new("Not indexed yet.")])
            .unwrap();

        let materials = db.indexed_materials().unwrap();
        assert_eq!(
            materials,
            vec![StoredMaterial {
                document_id: done.id,
                subject_id: subject.id,
                title: "cells.pdf".to_string(),
                texts: vec!["Cells divide.".to_string(), "DNA replicates.".to_string()],
            }]
        );
    }

    #[test]
    fn test_vector_index_ensure_and_bump() {
        let db = StudyDb::in_memory().unwrap();
        let user = Uuid::new_v4();
        let subject = db.insert_subject(user, "Chemistry").unwrap();
        let location = PathBuf::from("/tmp/idx");
        let new = NewVectorIndex {
            user_id: user,
            subject_id: subject.id,
            collection_id: "study_uabc_s1",
            provider: "local",
            embedding_model_name: "nomic-embed-text",
            storage_location: &location,
        };

        let first = db.ensure_vector_index(&new).unwrap();
        let again = db.ensure_vector_index(&new).unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(first.doc_count, 0);

        let bumped = db.bump_vector_index(first.id, 1, 12).unwrap();
        assert_eq!(bumped.doc_count, 1);
        assert_eq!(bumped.chunk_count, 12);
        assert_eq!(bumped.storage_location, location);
    }

    #[test]
    fn test_qa_history_preview() {
        let db = StudyDb::in_memory().unwrap();
        let user = Uuid::new_v4();
        let subject = db.insert_subject(user, "History").unwrap();
        let session = db.insert_chat_session(user, subject.id, "When did").unwrap();

        let long_answer = "x".repeat(500);
        db.insert_qa_turn(session.id, user, "first?", "short", true, &[]).unwrap();
        db.insert_qa_turn(session.id, user, "second?", &long_answer, true, &["[1] notes".to_string()])
            .unwrap();

        let history = db.qa_session_history(user, subject.id, 20).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].turn_count, 2);
        assert_eq!(history[0].last_question.as_deref(), Some("second?"));
        assert_eq!(history[0].last_answer_preview.as_ref().unwrap().len(), 200);

        let turns = db.list_qa_turns(session.id).unwrap();
        assert_eq!(turns[1].citations, vec!["[1] notes".to_string()]);
    }

    #[test]
    fn test_quiz_attempt_scoring() {
        let db = StudyDb::in_memory().unwrap();
        let user = Uuid::new_v4();
        let subject = db.insert_subject(user, "Biology").unwrap();
        let quiz = db
            .insert_quiz(
                user,
                subject.id,
                "cells quiz",
                2,
                QuestionType::ShortAnswer,
                Difficulty::Easy,
                "1/cells",
                &[question("powerhouse?"), question("again?")],
            )
            .unwrap();
        assert_eq!(quiz.questions.len(), 2);

        let loaded = db.get_quiz(user, quiz.id).unwrap().unwrap();
        assert_eq!(loaded.questions[1].question.question, "again?");

        let attempt = db.insert_attempt(quiz.id, user).unwrap();
        db.insert_attempt_item(attempt.id, quiz.questions[0].question_id, "mitochondria", true, 30_000)
            .unwrap();
        db.insert_attempt_item(attempt.id, quiz.questions[1].question_id, "nucleus", false, 10_000)
            .unwrap();

        let finished = db.finish_attempt(attempt.id, Utc::now()).unwrap();
        assert_eq!(finished.correct_count, 1);
        assert!((finished.accuracy - 0.5).abs() < 1e-9);
        assert!(finished.finished_at.is_some());

        let facts = db.attempt_item_facts(user, Some(subject.id)).unwrap();
        assert_eq!(facts.len(), 2);
        assert!(db.attempt_item_facts(user, Some(subject.id + 1)).unwrap().is_empty());
        assert_eq!(db.attempt_item_facts(user, None).unwrap().len(), 2);
    }

    #[test]
    fn test_question_scoped_to_quiz() {
        let db = StudyDb::in_memory().unwrap();
        let user = Uuid::new_v4();
        let subject = db.insert_subject(user, "Physics").unwrap();
        let quiz = db
            .insert_quiz(
                user,
                subject.id,
                "q",
                1,
                QuestionType::ShortAnswer,
                Difficulty::Medium,
                "src",
                &[question("force?")],
            )
            .unwrap();

        let qid = quiz.questions[0].question_id;
        assert!(db.get_question(quiz.id, qid).unwrap().is_some());
        assert!(db.get_question(quiz.id + 1, qid).unwrap().is_none());
    }
}
