mod cli;
mod commands;
mod infra;
mod render;

use enrollment_desk::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
