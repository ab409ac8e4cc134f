use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::error::Result;
use crate::models::{Direction, EmailLog, BACKFILL_PROVIDER};
use crate::store::EmailLogStore;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoEmailLogRepository {
    collection: Collection<EmailLog>,
}

impl MongoEmailLogRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection("email_logs");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        // Unique message_id makes a racing second insert a duplicate-key
        // no-op instead of a double log.
        let unique_message_id = IndexModel::builder()
            .keys(doc! { "message_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(unique_message_id).await?;

        let thread_timestamp = IndexModel::builder()
            .keys(doc! { "thread_id": 1, "timestamp": 1 })
            .build();
        self.collection.create_index(thread_timestamp).await?;

        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::InsertMany(insert_error) => insert_error
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().all(|e| e.code == DUPLICATE_KEY_CODE)),
        _ => false,
    }
}

#[async_trait]
impl EmailLogStore for MongoEmailLogRepository {
    async fn find_by_message_id(&self, message_id: &str) -> Result<Option<EmailLog>> {
        Ok(self
            .collection
            .find_one(doc! { "message_id": message_id })
            .await?)
    }

    async fn insert_many(&self, logs: &[EmailLog]) -> Result<()> {
        if logs.is_empty() {
            return Ok(());
        }

        match self.collection.insert_many(logs).ordered(false).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => {
                tracing::debug!("duplicate message_id on insert, treating as already logged");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn thread_logs(&self, thread_id: &str, limit: i64) -> Result<Vec<EmailLog>> {
        let logs = self
            .collection
            .find(doc! { "thread_id": thread_id })
            .sort(doc! { "timestamp": 1 })
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(logs)
    }

    async fn user_logs(
        &self,
        email: &str,
        limit: i64,
        direction: Option<Direction>,
    ) -> Result<Vec<EmailLog>> {
        let mut filter = doc! {
            "user_email": email,
            "ai_provider": { "$ne": BACKFILL_PROVIDER },
        };
        if let Some(direction) = direction {
            filter.insert("direction", bson::to_bson(&direction)?);
        }

        let logs = self
            .collection
            .find(filter)
            .sort(doc! { "timestamp": -1 })
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(logs)
    }
}
