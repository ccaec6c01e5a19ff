use thiserror::Error;

#[derive(Error, Debug)]
pub enum HazeError {
    #[error("Render graph error: {0}")]
    Graph(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Shader error: {0}")]
    Shader(String),

    #[error("GPU device error: {0}")]
    Gpu(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HazeError>;
