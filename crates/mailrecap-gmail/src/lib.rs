pub mod client;
pub mod error;
pub mod models;
pub mod token;

pub use client::{GmailMailbox, GmailProvider};
pub use error::{GmailError, Result};
pub use models::{MailMessage, Mailbox, MailboxProvider, MessageRef, DRAFT_LABEL, SENT_LABEL};
pub use token::GoogleTokenClient;
