use crate::base::Config;
use crate::StrError;
use russell_lab::{vec_norm, Norm, Vector};

/// Controls the convergence of the Newton-Raphson iterations
///
/// The iterations converge when the max-norm of the condensed residual satisfies either:
///
/// 1. `‖R‖∞ < tol_rr_abs` (absolute floor), or
/// 2. `‖R‖∞ / ‖R₀‖∞ < tol_rr_rel` after the first iteration (relative to the first residual)
///
/// The norm of the correction `mdu` is recorded for printing only.
pub struct ControlConvergence<'a> {
    config: &'a Config,
    iteration: usize,
    norm_rr0: f64,
    norm_rr_prev: f64,
    norm_rr: f64,
    norm_mdu: f64,
    converged_on_norm_rr: bool,
    diverging_on_norm_rr: bool,
    n_converged_total: usize,
}

impl<'a> ControlConvergence<'a> {
    /// Creates a new convergence controller
    pub fn new(config: &'a Config) -> Self {
        ControlConvergence {
            config,
            iteration: 0,
            norm_rr0: 0.0,
            norm_rr_prev: 0.0,
            norm_rr: 0.0,
            norm_mdu: 0.0,
            converged_on_norm_rr: false,
            diverging_on_norm_rr: false,
            n_converged_total: 0,
        }
    }

    /// Resets the convergence flags for a new step
    pub fn reset(&mut self) {
        self.iteration = 0;
        self.norm_rr0 = 0.0;
        self.norm_mdu = 0.0;
        self.converged_on_norm_rr = false;
        self.diverging_on_norm_rr = false;
    }

    /// Increments the total number of converged steps
    pub fn add_converged(&mut self) {
        self.n_converged_total += 1;
    }

    /// Returns the total number of converged steps
    pub fn n_converged_total(&self) -> usize {
        self.n_converged_total
    }

    /// Returns the max-norm of the last analyzed residual
    pub fn norm_rr(&self) -> f64 {
        self.norm_rr
    }

    /// Checks if the iterations have converged
    pub fn converged(&self) -> bool {
        self.converged_on_norm_rr
    }

    /// Analyzes the convergence based on the residual vector
    ///
    /// Returns an error if NaN or Inf values are found.
    pub(crate) fn analyze_rr(&mut self, iteration: usize, rr: &Vector) -> Result<(), StrError> {
        self.iteration = iteration;
        self.norm_rr = vec_norm(rr, Norm::Max);
        if !self.norm_rr.is_finite() || rr.as_data().iter().any(|v| !v.is_finite()) {
            self.converged_on_norm_rr = false;
            self.diverging_on_norm_rr = false;
            return Err("found NaN or Inf in the residual vector");
        }
        if iteration == 0 {
            self.norm_rr0 = self.norm_rr;
        }
        let converged_abs = self.norm_rr < self.config.tol_rr_abs;
        let converged_rel = iteration > 0 && self.norm_rr < self.config.tol_rr_rel * self.norm_rr0;
        self.converged_on_norm_rr = converged_abs || converged_rel;
        self.diverging_on_norm_rr = iteration > 0 && self.norm_rr > self.norm_rr_prev;
        self.norm_rr_prev = self.norm_rr;
        Ok(())
    }

    /// Records the max-norm of the correction vector
    ///
    /// Returns an error if NaN or Inf values are found.
    pub(crate) fn analyze_mdu(&mut self, mdu: &Vector) -> Result<(), StrError> {
        self.norm_mdu = vec_norm(mdu, Norm::Max);
        if !self.norm_mdu.is_finite() || mdu.as_data().iter().any(|v| !v.is_finite()) {
            return Err("found NaN or Inf in the correction vector");
        }
        Ok(())
    }

    /// Prints the header before the pseudo-time stepping
    pub fn print_header(&self) {
        if self.config.verbose_timesteps || self.config.verbose_iterations {
            println!("\nPLASTOPT === PSEUDO-TIME STEPPING AND CONVERGENCE STATISTICS ==================");
            println!("\nLegend:");
            println!("➖ ─ unknown");
            println!("✅ ─ converged");
            println!("🔹 ─ converging");
            println!("🎈 ─ diverging");
            println!("\"iter\" means iteration\n");
            println!("{}", "─".repeat(62));
            println!(
                "{:8} {:>11} {:>11} {:>5} {:>9} {:>9} ➖",
                "step", "t", "ℓ(t)", "iter", "‖mdu‖∞", "‖R‖∞"
            );
            println!("{}", "─".repeat(62));
        }
    }

    /// Prints the step information
    pub(crate) fn print_timestep(&self, step: usize, t: f64, multiplier: f64) {
        if self.config.verbose_timesteps {
            println!("{:>8} {:>11.6e} {:>11.6e}", step + 1, t, multiplier);
        }
    }

    /// Prints the iteration information
    pub(crate) fn print_iteration(&self) {
        if self.config.verbose_iterations {
            let icon = if self.converged_on_norm_rr {
                "✅"
            } else if self.diverging_on_norm_rr {
                "🎈"
            } else if self.iteration == 0 {
                "➖"
            } else {
                "🔹"
            };
            if self.iteration == 0 {
                println!(
                    "{:>8} {:>11} {:>11} {:>5} {:>9} {:>9.2e} {}",
                    "·", "·", "·", self.iteration, "·", self.norm_rr, icon
                );
            } else {
                println!(
                    "{:>8} {:>11} {:>11} {:>5} {:>9.2e} {:>9.2e} {}",
                    "·", "·", "·", self.iteration, self.norm_mdu, self.norm_rr, icon
                );
            }
        }
    }

    /// Prints the horizontal line at the end of the analysis
    pub(crate) fn print_footer(&self) {
        if self.config.verbose_timesteps || self.config.verbose_iterations {
            println!("{}", "─".repeat(62));
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
