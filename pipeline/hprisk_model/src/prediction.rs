use crate::model::PredictedValue;
use serde::Serialize;
use std::fmt;

/// Output of one inference call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Prediction {
    /// Per-class probabilities, in the estimator's class order.
    Probabilities(Vec<f64>),
    /// The value produced when only `predict` is available.
    Value(PredictedValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Positive,
    Negative,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Positive => f.write_str("positive"),
            Verdict::Negative => f.write_str("negative"),
        }
    }
}

impl Prediction {
    /// Probability of the positive class (index 1), when there is one.
    pub fn positive_probability(&self) -> Option<f64> {
        match self {
            Prediction::Probabilities(p) if p.len() >= 2 => Some(p[1]),
            _ => None,
        }
    }

    /// Binary reading of the result.
    ///
    /// Probabilities compare class 1 against class 0; a numeric value is
    /// positive above 0.5. Text labels and short probability vectors give
    /// no verdict.
    pub fn verdict(&self) -> Option<Verdict> {
        let positive = match self {
            Prediction::Probabilities(p) if p.len() >= 2 => p[1] > p[0],
            Prediction::Probabilities(_) => return None,
            Prediction::Value(PredictedValue::Number(v)) => *v > 0.5,
            Prediction::Value(PredictedValue::Label(_)) => return None,
        };
        Some(if positive {
            Verdict::Positive
        } else {
            Verdict::Negative
        })
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Probabilities(p) => {
                let parts: Vec<String> = p.iter().map(|v| format!("{v:.4}")).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Prediction::Value(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_verdicts() {
        let p = Prediction::Probabilities(vec![0.3, 0.7]);
        assert_eq!(p.verdict(), Some(Verdict::Positive));
        assert_eq!(p.positive_probability(), Some(0.7));
        assert_eq!(
            Prediction::Probabilities(vec![0.5, 0.5]).verdict(),
            Some(Verdict::Negative)
        );
        assert_eq!(Prediction::Probabilities(vec![1.0]).verdict(), None);
    }

    #[test]
    fn scalar_verdicts() {
        let v = |x| Prediction::Value(PredictedValue::Number(x));
        assert_eq!(v(0.42).verdict(), Some(Verdict::Negative));
        assert_eq!(v(0.5).verdict(), Some(Verdict::Negative));
        assert_eq!(v(0.51).verdict(), Some(Verdict::Positive));
        assert_eq!(
            Prediction::Value(PredictedValue::Label("high".into())).verdict(),
            None
        );
    }

    #[test]
    fn display() {
        assert_eq!(
            Prediction::Probabilities(vec![0.25, 0.75]).to_string(),
            "[0.2500, 0.7500]"
        );
        assert_eq!(Prediction::Value(PredictedValue::Number(0.42)).to_string(), "0.42");
    }
}
