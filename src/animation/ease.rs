/// Easing functions used to map normalized animation progress.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    /// Exponential ease-out `(1 - e^(-k t)) / (1 - e^(-k))`.
    Exponential {
        /// Stiffness `k`, must be > 0.
        stiffness: f64,
    },
}

impl Ease {
    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Exponential { stiffness } => {
                if stiffness <= 0.0 {
                    return t;
                }
                (1.0 - (-t * stiffness).exp()) / (1.0 - (-stiffness).exp())
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
