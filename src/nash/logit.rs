use crate::LOGODDS_EPSILON;
use crate::Probability;
use crate::Utility;

/// Clamp a win rate into [ε, 1-ε] so its log-odds stay finite.
pub fn clamp(p: Probability) -> Probability {
    p.clamp(LOGODDS_EPSILON, 1.0 - LOGODDS_EPSILON)
}

/// log(p / (1 - p)) of the clamped win rate.
pub fn logit(p: Probability) -> Utility {
    let p = clamp(p);
    (p / (1.0 - p)).ln()
}

/// Logistic function, inverse of [`logit`] on (ε, 1-ε).
pub fn inverse_logit(x: Utility) -> Probability {
    1.0 / (1.0 + (-x).exp())
}
