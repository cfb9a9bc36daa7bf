//! Domain error types.

/// Top-level error type for algotester.
#[derive(Debug, thiserror::Error)]
pub enum AlgotesterError {
    #[error("no price data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("series misaligned for {symbol}: {returns} returns vs {positions} positions")]
    Alignment {
        symbol: String,
        returns: usize,
        positions: usize,
    },

    #[error("volatility of {series} is zero, Sharpe ratio undefined")]
    DegenerateVolatility { series: String },

    #[error("unknown strategy '{name}' (expected one of: sma, random, lag, rsi, macd)")]
    UnknownStrategy { name: String },

    #[error("no strategy returns computed for {symbol}")]
    NoStrategyColumn { symbol: String },

    #[error("no instruments to combine")]
    EmptyUniverse,

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl AlgotesterError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        AlgotesterError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            AlgotesterError::Io(_) | AlgotesterError::Csv(_) => 1,
            AlgotesterError::ConfigParse { .. }
            | AlgotesterError::ConfigMissing { .. }
            | AlgotesterError::ConfigInvalid { .. }
            | AlgotesterError::UnknownStrategy { .. } => 2,
            AlgotesterError::DataSource { .. } => 3,
            AlgotesterError::NoData { .. }
            | AlgotesterError::InsufficientData { .. }
            | AlgotesterError::EmptyUniverse => 5,
            AlgotesterError::Alignment { .. }
            | AlgotesterError::NoStrategyColumn { .. }
            | AlgotesterError::DegenerateVolatility { .. } => 6,
        }
    }
}

impl From<&AlgotesterError> for std::process::ExitCode {
    fn from(err: &AlgotesterError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}
