/// Errors that can occur while encoding or sending frames.
///
/// Decoding has no error path: malformed input is dropped, not reported.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit the 1-byte length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A JSON payload could not be serialized or parsed.
    #[error("json payload error: {0}")]
    Json(#[from] serde_json::Error),

    /// The transport failed while sending or polling.
    #[error("transport error: {0}")]
    Transport(#[from] glitchrig_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
