//! Validation lookups used by clients before submitting forms

use std::sync::Arc;

use crate::data::Database;
use crate::error::AppError;

pub struct ValidateService {
    db: Arc<Database>,
}

impl ValidateService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// True iff a user row has this username; soft-deleted users count.
    pub async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        self.db.username_exists(username).await
    }

    pub async fn username_available(&self, username: &str) -> Result<bool, AppError> {
        Ok(!self.username_exists(username).await?)
    }

    pub async fn hashtag_exists(&self, label: &str) -> Result<bool, AppError> {
        Ok(self.db.get_hashtag_by_label(label).await?.is_some())
    }
}
