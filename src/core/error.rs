/// Contract violations raised by the detector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("no expense records to compute quantiles from")]
    InsufficientData,

    #[error("expense record {index} is malformed: {reason}")]
    MalformedInput { index: usize, reason: String },
}
