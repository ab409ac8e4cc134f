use mongodb::Client;

use crate::error::{PersistError, Result};
use crate::mongo::{MongoEmailLogRepository, MongoUserRepository};

/// Entry point to the MongoDB-backed stores.
pub struct MongoStore {
    users: MongoUserRepository,
    email_logs: MongoEmailLogRepository,
}

impl MongoStore {
    /// Connect to MongoDB and bind the typed collections.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;
        let db = client.database(database);

        Ok(Self {
            users: MongoUserRepository::new(&db),
            email_logs: MongoEmailLogRepository::new(&db),
        })
    }

    /// Declare the indexes the pipeline relies on: the unique `message_id`
    /// backstop and the thread/timestamp compound index for context reads.
    pub async fn ensure_indexes(&self) -> Result<()> {
        self.email_logs.ensure_indexes().await
    }

    pub fn users(&self) -> MongoUserRepository {
        self.users.clone()
    }

    pub fn email_logs(&self) -> MongoEmailLogRepository {
        self.email_logs.clone()
    }
}
