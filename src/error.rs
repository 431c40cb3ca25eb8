use crate::assemble::AssembleError;
use crate::extract::ExtractError;
use crate::fetch::error::FetchError;
use crate::readers::error::ReadError;
use crate::writers::error::WriteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CamelsError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Conversion cancelled, {0} download(s) left incomplete")]
    Cancelled(usize),

    #[error("Pipeline stage task failed")]
    TaskJoin(#[from] tokio::task::JoinError),
}
