use derive_more::Display;

use crate::repos::RepoError;

use super::provider::ProviderError;

#[derive(Debug, Display)]
pub enum SchedulerError {
    #[display("provider error: {_0}")]
    Provider(String),
    #[display("repo error: {_0}")]
    Repo(String),
}

impl std::error::Error for SchedulerError {}

impl From<ProviderError> for SchedulerError {
    fn from(value: ProviderError) -> Self {
        SchedulerError::Provider(value.to_string())
    }
}

impl From<RepoError> for SchedulerError {
    fn from(value: RepoError) -> Self {
        SchedulerError::Repo(value.to_string())
    }
}
