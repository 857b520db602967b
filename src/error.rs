use thiserror::Error;

/// Errors that can occur while imputing, aggregating, projecting or thinning a stand.
#[derive(Error, Debug)]
pub enum ConifersError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Invalid coefficients: {0}")]
    InvalidCoeff(String),

    #[error("Invalid input value: {0}")]
    InvalidInputVal(String),

    #[error("Invalid plant count: {0}")]
    InvalidPlantCount(String),

    #[error("Invalid plot count: {0}")]
    InvalidPlotCount(String),

    #[error("Fill values error: {count} plant record(s) could not be completed")]
    FillValues { count: usize },

    #[error("Failed to project plant {plant} on plot {plot}: {reason}")]
    FailedProjectPlant { plot: u32, plant: u32, reason: String },

    #[error("Invalid species code: {0}")]
    InvalidSpCode(String),

    #[error("Fill sample failed: {0}")]
    FillSampleFailed(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ConifersError>;

/// Flat return-code enumeration handed to foreign callers.
///
/// The numeric values are stable and match the order callers expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    Success = 0,
    Error = 1,
    InvalidCoeff = 2,
    InvalidInputVal = 3,
    InvalidPlantCount = 4,
    InvalidPlotCount = 5,
    FillValuesError = 6,
    FailedProjectPlant = 7,
    FailedMemoryAlloc = 8,
    InvalidSpCode = 9,
    FillSampleFailed = 10,
}

impl ReturnCode {
    /// Numeric value of the code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Symbolic name of the code.
    pub fn name(self) -> &'static str {
        match self {
            ReturnCode::Success => "CONIFERS_SUCCESS",
            ReturnCode::Error => "CONIFERS_ERROR",
            ReturnCode::InvalidCoeff => "INVALID_COEFF",
            ReturnCode::InvalidInputVal => "INVALID_INPUT_VAL",
            ReturnCode::InvalidPlantCount => "INVALID_PLANT_COUNT",
            ReturnCode::InvalidPlotCount => "INVALID_PLOT_COUNT",
            ReturnCode::FillValuesError => "FILL_VALUES_ERROR",
            ReturnCode::FailedProjectPlant => "FAILED_PROJECT_PLANT",
            ReturnCode::FailedMemoryAlloc => "FAILED_MEMORY_ALLOC",
            ReturnCode::InvalidSpCode => "INVALID_SP_CODE",
            ReturnCode::FillSampleFailed => "FILL_SAMPLE_FAILED",
        }
    }

    /// Collapse a call result into its return code.
    pub fn from_result<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => ReturnCode::Success,
            Err(e) => ReturnCode::from(e),
        }
    }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<&ConifersError> for ReturnCode {
    fn from(e: &ConifersError) -> Self {
        match e {
            ConifersError::Io(_)
            | ConifersError::Csv(_)
            | ConifersError::Json(_)
            | ConifersError::Config(_)
            | ConifersError::ParseError(_)
            | ConifersError::Simulation(_) => ReturnCode::Error,
            ConifersError::InvalidCoeff(_) => ReturnCode::InvalidCoeff,
            ConifersError::InvalidInputVal(_) => ReturnCode::InvalidInputVal,
            ConifersError::InvalidPlantCount(_) => ReturnCode::InvalidPlantCount,
            ConifersError::InvalidPlotCount(_) => ReturnCode::InvalidPlotCount,
            ConifersError::FillValues { .. } => ReturnCode::FillValuesError,
            ConifersError::FailedProjectPlant { .. } => ReturnCode::FailedProjectPlant,
            ConifersError::InvalidSpCode(_) => ReturnCode::InvalidSpCode,
            ConifersError::FillSampleFailed(_) => ReturnCode::FillSampleFailed,
        }
    }
}
