use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("shader file could not be read: {0}")]
    Io(#[from] std::io::Error),
    #[error("shader stage compilation failed: {0}")]
    Compile(String),
    #[error("shader program linking failed: {0}")]
    Link(String),
}
