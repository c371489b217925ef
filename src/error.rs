pub type ReelResult<T> = Result<T, ReelError>;

#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("encoder init failure: {0}")]
    EncoderInit(String),

    #[error("encoder runtime failure: {0}")]
    EncoderRuntime(String),

    #[error("audio load failure: {0}")]
    AudioLoad(String),

    #[error("generation cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::SurfaceUnavailable(msg.into())
    }

    pub fn encoder_init(msg: impl Into<String>) -> Self {
        Self::EncoderInit(msg.into())
    }

    pub fn encoder_runtime(msg: impl Into<String>) -> Self {
        Self::EncoderRuntime(msg.into())
    }

    pub fn audio_load(msg: impl Into<String>) -> Self {
        Self::AudioLoad(msg.into())
    }
}
