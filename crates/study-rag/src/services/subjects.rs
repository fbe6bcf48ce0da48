use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::StudyDb;
use crate::types::Subject;

/// A user's subjects (courses)
#[derive(Clone)]
pub struct SubjectService {
    db: StudyDb,
}

impl SubjectService {
    pub fn new(db: StudyDb) -> Self {
        Self { db }
    }

    /// Existing subject with this name (case-insensitive) or a new one
    pub async fn get_or_create(&self, user_id: Uuid, name: &str) -> Result<Subject> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::invalid_input("subject name is required"));
        }

        let subject = self
            .db
            .call(move |db| db.find_or_insert_subject(user_id, &name))
            .await?;
        tracing::debug!("Subject {} ({}) for user {}", subject.id, subject.name, user_id);
        Ok(subject)
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Subject>> {
        self.db.call(move |db| db.list_subjects(user_id)).await
    }

    /// The subject if it belongs to the user, otherwise `NotFound`
    pub async fn require(&self, user_id: Uuid, subject_id: i64) -> Result<Subject> {
        require_subject(&self.db, user_id, subject_id).await
    }
}

pub(crate) async fn require_subject(db: &StudyDb, user_id: Uuid, subject_id: i64) -> Result<Subject> {
    db.call(move |db| db.get_subject(user_id, subject_id))
        .await?
        .ok_or_else(|| Error::not_found(format!("subject {}", subject_id)))
}
