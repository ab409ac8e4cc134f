pub mod client;
pub mod email_logs;
pub mod users;

pub use client::MongoStore;
pub use email_logs::MongoEmailLogRepository;
pub use users::MongoUserRepository;
