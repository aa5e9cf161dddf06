/// Errors raised by the KPI aggregator.
///
/// Everything except [`KpiError::EmptyInput`] is a validation failure of the
/// weight table or of the metrics it is applied to; the caller has to supply
/// corrected input; retrying the same call gives the same error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KpiError {
    #[error("weight table references unknown metric `{0}`")]
    UnknownMetric(String),

    #[error("weights sum to {0}, expected 100")]
    WeightSum(f64),

    #[error("negative weight {weight} for metric `{metric}`")]
    NegativeWeight { metric: String, weight: f64 },

    #[error("non-finite weight for metric `{0}`")]
    NonFiniteWeight(String),

    #[error("metric `{0}` appears more than once in the weight table")]
    DuplicateMetric(String),

    #[error("weight table is empty")]
    EmptyWeights,

    #[error("cannot aggregate over zero entities")]
    EmptyInput,
}

impl KpiError {
    /// Returns `true` for weight-table and metric validation failures.
    pub fn is_validation(&self) -> bool {
        !matches!(self, KpiError::EmptyInput)
    }
}

pub type KpiResult<T> = Result<T, KpiError>;
