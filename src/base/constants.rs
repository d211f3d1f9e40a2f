/// Defines the directory where the simulation result files are saved
pub const DEFAULT_OUT_DIR: &str = "/tmp/plastopt/results";

/// Defines an auxiliary directory where the test result files are saved
pub const DEFAULT_TEST_DIR: &str = "/tmp/plastopt/test";

/// Minimum allowed tolerance for the Newton-Raphson stopping criteria
pub const CONFIG_MIN_TOL: f64 = 1e-15;

/// Number of local (history) variables per element of the J2 plasticity kernel
///
/// The local state is `[ᾱ, Δγ, εᵖ_xx, εᵖ_yy, εᵖ_zz, √2 εᵖ_xy]`.
pub const N_LOCAL_J2: usize = 6;

/// Number of nodes of the linear triangle (Tri3) cells
pub const N_NODE_TRI3: usize = 3;
