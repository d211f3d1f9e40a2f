use super::{ElementOutput, FemBase, StepContext, ZeroState};
use crate::StrError;
use russell_lab::Vector;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds the converged states of all pseudo-time steps
///
/// The state preceding the first step is zero and is not stored.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StateHistory {
    /// Global states U_k
    pub uu: Vec<Vector>,

    /// Local states C_k (all cells)
    pub cc: Vec<Vector>,

    /// Projected fields Π_k (empty vectors for the displacement formulation)
    pub pi: Vec<Vector>,
}

impl StateHistory {
    /// Allocates a new (empty) instance
    pub fn new() -> Self {
        StateHistory {
            uu: Vec::new(),
            cc: Vec::new(),
            pi: Vec::new(),
        }
    }

    /// Clears all steps and reserves space for a new forward solve
    pub fn reset(&mut self, n_steps: usize) {
        self.uu.clear();
        self.cc.clear();
        self.pi.clear();
        self.uu.reserve(n_steps);
        self.cc.reserve(n_steps);
        self.pi.reserve(n_steps);
    }

    /// Appends the converged state of the next step
    pub fn push(&mut self, uu: &Vector, cc: &Vector, pi: &Vector) {
        self.uu.push(uu.clone());
        self.cc.push(cc.clone());
        self.pi.push(pi.clone());
    }

    /// Returns the number of stored steps
    pub fn n_steps(&self) -> usize {
        self.uu.len()
    }

    /// Checks that every step holds fields consistent with the mesh and the kernel
    pub fn check_dims(&self, base: &FemBase) -> Result<(), StrError> {
        let n_steps = self.n_steps();
        if self.cc.len() != n_steps || self.pi.len() != n_steps {
            return Err("state history has incorrect dimensions");
        }
        let (n_equation, n_local, n_projected) = (base.n_equation(), base.n_local_total(), base.n_projected_total());
        for k in 0..n_steps {
            if self.uu[k].dim() != n_equation || self.cc[k].dim() != n_local || self.pi[k].dim() != n_projected {
                return Err("state history has incorrect dimensions");
            }
        }
        Ok(())
    }

    /// Returns the context to gather element arguments at step k
    ///
    /// The previous state of step 0 is taken from `zero`.
    pub fn context<'b>(
        &'b self,
        k: usize,
        zero: &'b ZeroState,
        control: &'b Vector,
        config: &'b Vector,
    ) -> Result<StepContext<'b>, StrError> {
        if k >= self.n_steps() {
            return Err("step index is out of range");
        }
        let (uu_prev, cc_prev, pi_prev) = if k == 0 {
            (&zero.uu, &zero.cc, &zero.pi)
        } else {
            (&self.uu[k - 1], &self.cc[k - 1], &self.pi[k - 1])
        };
        Ok(StepContext {
            uu: &self.uu[k],
            uu_prev,
            cc: &self.cc[k],
            cc_prev,
            pi_prev,
            control,
            config,
        })
    }

    /// Computes the element diagnostics (stresses, plastic strains) at step k
    pub fn element_outputs(
        &self,
        base: &FemBase,
        k: usize,
        control: &Vector,
        config: &Vector,
    ) -> Result<Vec<ElementOutput>, StrError> {
        base.check_fields(control, config)?;
        self.check_dims(base)?;
        let zero = base.zero_state();
        let ctx = self.context(k, &zero, control, config)?;
        let mut args = base.new_args();
        let mut outputs = Vec::with_capacity(base.n_cell());
        for cell_id in 0..base.n_cell() {
            base.gather(&mut args, cell_id, &ctx);
            outputs.push(base.kernel.output(&args)?);
        }
        Ok(outputs)
    }

    /// Reads a JSON file containing the state history
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let input = File::open(path).map_err(|_| "cannot open file")?;
        let buffered = BufReader::new(input);
        let history = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(history)
    }

    /// Writes a JSON file with the state history
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
