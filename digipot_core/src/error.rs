use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DigipotError {
    #[error("bus error: {0}")]
    Bus(String),
    #[error("bus fault: {0}")]
    BusFault(String),
    #[error("display error: {0}")]
    Display(String),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
