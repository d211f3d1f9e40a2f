use plastopt::base::DEFAULT_OUT_DIR;
use plastopt::prelude::*;
use plastopt::StrError;
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "plastopt_box",
    about = "Stretches a unit square of J2 plastic material and computes the gradient of a criterion"
)]
struct Options {
    /// Number of divisions along x and y
    #[structopt(long, default_value = "4")]
    ndiv: usize,

    /// Number of pseudo-time steps
    #[structopt(long, default_value = "4")]
    n_steps: usize,

    /// Horizontal displacement prescribed at the right side
    #[structopt(long, default_value = "0.004")]
    ux: f64,

    /// Uses the stabilized displacement-pressure formulation with this alpha
    #[structopt(long)]
    alpha: Option<f64>,

    /// Criterion: energy, work, or volume
    #[structopt(long, default_value = "energy")]
    criterion: String,

    /// Computes the gradient with respect to the coordinates instead of the control field
    #[structopt(long)]
    configuration: bool,

    /// Shows the pseudo-time steps and iterations
    #[structopt(short, long)]
    verbose: bool,

    /// Writes the state history to a JSON file with this stem
    #[structopt(long)]
    fn_stem: Option<String>,
}

fn main() -> Result<(), StrError> {
    // parse options
    let options = Options::from_args();
    let formulation = match options.alpha {
        Some(alpha) => Formulation::Stabilized { alpha },
        None => Formulation::Displacement,
    };
    let kind = if options.configuration {
        GradientKind::Configuration
    } else {
        GradientKind::Control
    };

    // mesh and element kernel
    let mesh = SampleMeshes::box2d(1.0, 1.0, options.ndiv, options.ndiv);
    let param = ParamPlasticity::sample_von_mises();
    let kernel = J2Plasticity::new(&param, formulation)?;
    let base = FemBase::new(&mesh, &kernel)?;

    // boundary conditions
    let mut essential = Essential::new();
    essential
        .points(&SampleMeshes::points_at_x(&mesh, 0.0), Dof::Ux, 0.0)
        .points(&SampleMeshes::points_at_y(&mesh, 0.0), Dof::Uy, 0.0)
        .points(&SampleMeshes::points_at_x(&mesh, 1.0), Dof::Ux, options.ux);
    let natural = Natural::new();

    // configuration
    let mut config = Config::new();
    config
        .set_n_steps(options.n_steps)
        .set_verbose(options.verbose, options.verbose)
        .set_verbose_adjoint(options.verbose);

    // criterion
    let energy = InternalEnergy::new(&kernel);
    let work = PlasticWork::new(&kernel);
    let volume = Volume::new(&kernel);
    let criterion: &dyn Criterion = match options.criterion.as_str() {
        "energy" => &energy,
        "work" => &work,
        "volume" => &volume,
        _ => return Err("criterion must be energy, work, or volume"),
    };

    // run
    let mut sensitivity = Sensitivity::new(&config, &base, &essential, &natural);
    sensitivity.set_criterion(criterion);
    let control = base.uniform_control(1.0);
    let coords = base.configuration_field();
    let (value, gradient, history) = sensitivity.value_and_gradient(&control, &coords, kind)?;

    // results
    println!("\nF = {:?}", value);
    println!("dF/dz =\n{}", gradient);
    if let Some(fn_stem) = &options.fn_stem {
        let path = format!("{}/{}.json", DEFAULT_OUT_DIR, fn_stem);
        history.write_json(&path)?;
        println!("state history written to {}", path);
    }
    Ok(())
}
