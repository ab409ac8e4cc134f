use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Persistence error: {0}")]
    Persist(#[from] mailrecap_persist::PersistError),

    #[error("Mail provider error: {0}")]
    Mail(#[from] mailrecap_gmail::GmailError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
