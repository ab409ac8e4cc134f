pub mod error;
pub mod models;
pub mod mongo;
pub mod store;

pub use error::{PersistError, Result};
pub use models::{Direction, EmailLog, User, UserSettings, BACKFILL_PROVIDER};
pub use mongo::{MongoEmailLogRepository, MongoStore, MongoUserRepository};
pub use store::{EmailLogStore, UserStore};
