use thiserror::Error;

#[derive(Error, Debug)]
pub enum CcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Unknown material: {0}")]
    UnknownMaterial(String),

    #[error("Unknown physics list: {0}")]
    UnknownPhysicsList(String),

    #[error("Unknown camera model: {0}")]
    UnknownCameraModel(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Macro error at {file}:{line}: {message}")]
    Macro {
        file: String,
        line: usize,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, CcError>;
