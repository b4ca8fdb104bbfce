//! On-device machine learning.
//!
//! The controller only needs inference, so it depends on the
//! [`Predictor`] trait; training lives on the concrete model.

pub mod lin_reg;

/// Inference side of a model. Must be a pure function of its parameters.
pub trait Predictor: Sync {
    fn predict(&self, input: f64) -> f64;
}
