//! Continuous local optimization contract.
//!
//! Some chromosomes carry numeric slots whose values are not chosen by the
//! genetic operators but by an external optimizer (for example a least-squares
//! fit of the constants in a formula). This trait is everything such an
//! optimizer needs: it never inspects the structure behind the slots.

/// A chromosome exposing slots that need externally supplied values.
pub trait ContinuousLocalOptimization {
    /// Number of slots awaiting a value from the optimizer.
    fn get_number_local_optimization_params(&self) -> usize;

    /// Assign values to the slots in ascending slot order.
    ///
    /// If fewer values than slots are supplied, only that many slots are
    /// assigned and the remaining slots keep their prior state. Extra values
    /// are ignored.
    fn set_local_optimization_params(&mut self, params: &[f64]);

    /// Whether any slot is awaiting a value.
    ///
    /// Derived from [`Self::get_number_local_optimization_params`] and
    /// read-only.
    fn needs_continuous_opt(&self) -> bool {
        self.get_number_local_optimization_params() > 0
    }
}
