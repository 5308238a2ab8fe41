use thiserror::Error;

/// Text rejected at the normalizer boundary. Never reaches scoring.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("text contains a NUL character")]
    NulByte,

    #[error("text looks binary: {control_ratio:.2} of characters are control or replacement characters")]
    BinaryContent { control_ratio: f64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("unknown {kind}: '{name}'")]
    UnknownComponent { kind: &'static str, name: String },

    #[error("failed to read calibration file {path}: {source}")]
    CalibrationFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse calibration file: {0}")]
    CalibrationFileParse(#[from] serde_yaml::Error),

    #[error("calibration validation failed: {0}")]
    Validation(String),
}
