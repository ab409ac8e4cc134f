use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc};
use mongodb::{Collection, Database};

use crate::error::Result;
use crate::models::User;
use crate::store::UserStore;

#[derive(Clone)]
pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection("users");
        Self { collection }
    }
}

#[async_trait]
impl UserStore for MongoUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    async fn upsert(&self, user: &User) -> Result<()> {
        let document = bson::to_document(user)?;
        self.collection
            .update_one(doc! { "email": &user.email }, doc! { "$set": document })
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn set_active(
        &self,
        email: &str,
        is_active: bool,
        last_started_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut update = doc! { "is_active": is_active };
        if let Some(started) = last_started_at {
            update.insert("last_started_at", bson::DateTime::from_chrono(started));
        }

        self.collection
            .update_one(doc! { "email": email }, doc! { "$set": update })
            .await?;
        Ok(())
    }
}
