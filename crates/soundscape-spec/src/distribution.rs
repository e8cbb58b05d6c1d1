//! Distribution descriptors for event parameters.
//!
//! Every tunable field of an event template is either a fixed literal or a
//! distribution to be sampled at instantiation time. Both cases are covered
//! by [`DistributionSpec`], a tagged variant evaluated through the engine's
//! single sampling dispatch, so use sites never inspect parameter types
//! ad hoc.

use serde::{Deserialize, Serialize};

use crate::error::DistributionError;

/// The value domain of a sampled parameter: a number or a piece of text.
///
/// Labels and source files sample to text; times, durations, levels, and
/// transform parameters sample to numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Numeric value (seconds, dB, semitones, stretch factor).
    Number(f64),
    /// Text value (label, file path).
    Text(String),
}

impl ParamValue {
    /// Returns the numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(v) => Some(*v),
            ParamValue::Text(_) => None,
        }
    }

    /// Returns the text value, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Number(_) => None,
            ParamValue::Text(s) => Some(s),
        }
    }

    /// Returns a short name for the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Number(_) => "number",
            ParamValue::Text(_) => "text",
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Number(v) => write!(f, "{}", v),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A declarative distribution over parameter values.
///
/// Serialized as a tagged object, e.g.
/// `{"dist": "uniform", "min": 0.0, "max": 8.0}` or
/// `{"dist": "const", "value": "siren"}`.
///
/// Parameter consistency is checked eagerly by [`validate`] when an event
/// is added to a scene, and re-checked at sample time; inconsistent
/// parameters are never coerced.
///
/// [`validate`]: DistributionSpec::validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dist", rename_all = "snake_case")]
pub enum DistributionSpec {
    /// A fixed literal; sampling returns it unchanged.
    Const {
        /// The literal value.
        value: ParamValue,
    },
    /// Uniform choice over an explicit option list.
    Choose {
        /// Candidate values; must be non-empty.
        options: Vec<ParamValue>,
    },
    /// Weighted choice over an explicit option list.
    ChooseWeighted {
        /// Candidate values; must be non-empty.
        options: Vec<ParamValue>,
        /// One finite, non-negative weight per option; positive sum.
        weights: Vec<f64>,
    },
    /// Uniform choice over the files of a folder.
    ///
    /// The folder is listed lazily at each sample call, so files added
    /// between independent generation runs are visible without rebuilding
    /// the scene.
    ChooseFile {
        /// Folder to list.
        folder: String,
    },
    /// Continuous uniform over `[min, max]`.
    Uniform {
        /// Lower bound (inclusive).
        min: f64,
        /// Upper bound (inclusive).
        max: f64,
    },
    /// Normal with the given mean and standard deviation.
    Normal {
        /// Mean.
        mean: f64,
        /// Standard deviation; must be positive.
        std: f64,
    },
    /// Normal truncated to `[min, max]` by rejection.
    ///
    /// Out-of-range draws are redrawn, never clipped; clipping would pile
    /// probability mass on the boundaries and bias the mean.
    #[serde(rename = "truncnorm")]
    TruncNorm {
        /// Mean of the underlying normal.
        mean: f64,
        /// Standard deviation; must be positive.
        std: f64,
        /// Lower truncation bound.
        min: f64,
        /// Upper truncation bound.
        max: f64,
    },
}

impl DistributionSpec {
    /// Creates a `const` descriptor.
    pub fn constant(value: impl Into<ParamValue>) -> Self {
        DistributionSpec::Const {
            value: value.into(),
        }
    }

    /// Creates a `choose` descriptor.
    pub fn choose<V: Into<ParamValue>>(options: impl IntoIterator<Item = V>) -> Self {
        DistributionSpec::Choose {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a `choose_file` descriptor over a folder.
    pub fn choose_file(folder: impl Into<String>) -> Self {
        DistributionSpec::ChooseFile {
            folder: folder.into(),
        }
    }

    /// Creates a `uniform` descriptor.
    pub fn uniform(min: f64, max: f64) -> Self {
        DistributionSpec::Uniform { min, max }
    }

    /// Creates a `normal` descriptor.
    pub fn normal(mean: f64, std: f64) -> Self {
        DistributionSpec::Normal { mean, std }
    }

    /// Creates a `truncnorm` descriptor.
    pub fn truncnorm(mean: f64, std: f64, min: f64, max: f64) -> Self {
        DistributionSpec::TruncNorm {
            mean,
            std,
            min,
            max,
        }
    }

    /// Returns the descriptor's kind tag as a string.
    pub fn kind(&self) -> &'static str {
        match self {
            DistributionSpec::Const { .. } => "const",
            DistributionSpec::Choose { .. } => "choose",
            DistributionSpec::ChooseWeighted { .. } => "choose_weighted",
            DistributionSpec::ChooseFile { .. } => "choose_file",
            DistributionSpec::Uniform { .. } => "uniform",
            DistributionSpec::Normal { .. } => "normal",
            DistributionSpec::TruncNorm { .. } => "truncnorm",
        }
    }

    /// Returns true if this descriptor bypasses randomness.
    pub fn is_const(&self) -> bool {
        matches!(self, DistributionSpec::Const { .. })
    }

    /// Returns the literal value of a `const` descriptor.
    pub fn as_const(&self) -> Option<&ParamValue> {
        match self {
            DistributionSpec::Const { value } => Some(value),
            _ => None,
        }
    }

    /// Checks parameter consistency for this descriptor.
    ///
    /// # Errors
    /// Returns a [`DistributionError`] when the parameters do not satisfy
    /// the arity/range requirements of the kind (e.g. `min > max`,
    /// non-positive `std`, empty option list, mismatched weights).
    pub fn validate(&self) -> Result<(), DistributionError> {
        match self {
            DistributionSpec::Const { .. } => Ok(()),
            DistributionSpec::Choose { options } => {
                if options.is_empty() {
                    return Err(DistributionError::EmptyOptions {
                        kind: self.kind(),
                    });
                }
                Ok(())
            }
            DistributionSpec::ChooseWeighted { options, weights } => {
                if options.is_empty() {
                    return Err(DistributionError::EmptyOptions {
                        kind: self.kind(),
                    });
                }
                if options.len() != weights.len() {
                    return Err(DistributionError::WeightCountMismatch {
                        options: options.len(),
                        weights: weights.len(),
                    });
                }
                let mut total = 0.0;
                for &w in weights {
                    if !w.is_finite() || w < 0.0 {
                        return Err(DistributionError::InvalidWeight { weight: w });
                    }
                    total += w;
                }
                if total <= 0.0 {
                    return Err(DistributionError::ZeroWeightSum);
                }
                Ok(())
            }
            DistributionSpec::ChooseFile { folder } => {
                if folder.is_empty() {
                    return Err(DistributionError::EmptyFolderPath);
                }
                Ok(())
            }
            DistributionSpec::Uniform { min, max } => {
                check_finite(self.kind(), "min", *min)?;
                check_finite(self.kind(), "max", *max)?;
                if min > max {
                    return Err(DistributionError::InvalidBounds {
                        kind: self.kind(),
                        min: *min,
                        max: *max,
                    });
                }
                Ok(())
            }
            DistributionSpec::Normal { mean, std } => {
                check_finite(self.kind(), "mean", *mean)?;
                check_finite(self.kind(), "std", *std)?;
                if *std <= 0.0 {
                    return Err(DistributionError::NonPositiveStd {
                        kind: self.kind(),
                        std: *std,
                    });
                }
                Ok(())
            }
            DistributionSpec::TruncNorm {
                mean,
                std,
                min,
                max,
            } => {
                check_finite(self.kind(), "mean", *mean)?;
                check_finite(self.kind(), "std", *std)?;
                check_finite(self.kind(), "min", *min)?;
                check_finite(self.kind(), "max", *max)?;
                if *std <= 0.0 {
                    return Err(DistributionError::NonPositiveStd {
                        kind: self.kind(),
                        std: *std,
                    });
                }
                if min > max {
                    return Err(DistributionError::InvalidBounds {
                        kind: self.kind(),
                        min: *min,
                        max: *max,
                    });
                }
                Ok(())
            }
        }
    }
}

fn check_finite(kind: &'static str, param: &'static str, value: f64) -> Result<(), DistributionError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DistributionError::NonFiniteParameter { kind, param, value })
    }
}
