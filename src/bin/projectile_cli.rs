use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use projectile_drag::analytical::{sample_trajectory, summarize, validate_explorer_inputs};
use projectile_drag::constants::{
    ANALYTIC_ANGLE_DEFAULT, ANALYTIC_SPEED_DEFAULT, ANALYTIC_SPEED_MAX, G_ACCEL_MPS2,
};
use projectile_drag::output::{render_csv, render_json, render_table};
use projectile_drag::{
    calculate_trajectory_characteristics, integrate_trajectory, run_pipeline, DragCoefficients,
    PipelineConfig, Termination, TrajectoryCharacteristics, TrajectorySample, TrajectorySettings,
};

#[derive(Parser)]
#[command(name = "projectile")]
#[command(version)]
#[command(about = "Drag coefficient regression and projectile trajectory calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit drag coefficients from a dataset and integrate the resulting trajectory
    Analyze {
        /// Dataset CSV with columns v (or velocity), a, b
        #[arg(short = 'd', long)]
        dataset: Option<PathBuf>,

        /// Directory for exported CSV series and report.json
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Launch angle (degrees)
        #[arg(long)]
        angle: Option<f64>,

        /// Quantile of observed speeds used as launch speed
        #[arg(short = 'q', long)]
        quantile: Option<f64>,

        /// Explicit launch speed (m/s), overrides --quantile
        #[arg(long)]
        speed: Option<f64>,

        /// End of the integration window (s)
        #[arg(long)]
        t_end: Option<f64>,

        /// Number of output samples
        #[arg(long)]
        points: Option<usize>,

        /// Gravitational acceleration (m/s²)
        #[arg(long)]
        gravity: Option<f64>,

        /// Stop the integration where the projectile returns to the ground
        #[arg(long)]
        stop_at_ground: bool,

        /// Skip writing result files
        #[arg(long)]
        no_export: bool,

        /// JSON config file; command-line flags take precedence
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Integrate a trajectory for given drag coefficients
    Simulate {
        /// Launch speed (m/s)
        #[arg(short = 'v', long)]
        velocity: f64,

        /// Launch angle (degrees)
        #[arg(long, default_value = "30.0")]
        angle: f64,

        /// Linear drag coefficient on Vx (1/s)
        #[arg(short = 'a', long, default_value = "0.0")]
        drag_a: f64,

        /// Linear drag coefficient on Vy (1/s)
        #[arg(short = 'b', long, default_value = "0.0")]
        drag_b: f64,

        /// End of the integration window (s)
        #[arg(long, default_value = "10.0")]
        t_end: f64,

        /// Number of output samples
        #[arg(long, default_value = "500")]
        points: usize,

        /// Stop the integration where the projectile returns to the ground
        #[arg(long)]
        stop_at_ground: bool,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,

        /// Full output (show all trajectory points)
        #[arg(long)]
        full: bool,
    },

    /// Closed-form flight without air resistance
    Analytic {
        /// Launch speed (m/s)
        #[arg(short = 'v', long, default_value_t = ANALYTIC_SPEED_DEFAULT)]
        velocity: f64,

        /// Launch angle (degrees)
        #[arg(long, default_value_t = ANALYTIC_ANGLE_DEFAULT)]
        angle: f64,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Display model information
    Info,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
    Table,
}

#[derive(Serialize)]
struct SimulationOutput<'a> {
    launch_speed: f64,
    launch_angle_deg: f64,
    coefficients: DragCoefficients,
    impact_time: Option<f64>,
    characteristics: TrajectoryCharacteristics,
    trajectory: &'a TrajectorySample,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            dataset, output_dir, angle, quantile, speed,
            t_end, points, gravity, stop_at_ground, no_export,
            config, output
        } => {
            let mut pipeline = match config {
                Some(path) => PipelineConfig::from_json_file(path)?,
                None => PipelineConfig::default(),
            };

            if let Some(path) = dataset {
                pipeline.dataset_path = path;
            }
            if let Some(dir) = output_dir {
                pipeline.output_dir = dir;
            }
            if let Some(angle) = angle {
                pipeline.launch_angle_deg = angle;
            }
            if let Some(q) = quantile {
                pipeline.speed_quantile = q;
            }
            if speed.is_some() {
                pipeline.launch_speed = speed;
            }
            if let Some(t_end) = t_end {
                pipeline.trajectory.t_span.1 = t_end;
            }
            if let Some(points) = points {
                pipeline.trajectory.num_points = points;
            }
            if let Some(g) = gravity {
                pipeline.trajectory.gravity = g;
            }
            if stop_at_ground {
                pipeline.trajectory.termination = Termination::GroundImpact;
            }
            if no_export {
                pipeline.export = false;
            }

            let report = run_pipeline(&pipeline)?;

            match output {
                OutputFormat::Table => {
                    print!("{}", render_table(&report));
                    if pipeline.export {
                        println!("\nResults written to {}", pipeline.output_dir.display());
                    }
                }
                OutputFormat::Json => println!("{}", render_json(&report)?),
                OutputFormat::Csv => print!("{}", render_csv(&report)),
            }
        },

        Commands::Simulate {
            velocity, angle, drag_a, drag_b, t_end,
            points, stop_at_ground, output, full
        } => {
            let settings = TrajectorySettings {
                t_span: (0.0, t_end),
                num_points: points,
                termination: if stop_at_ground { Termination::GroundImpact } else { Termination::FixedDuration },
                ..Default::default()
            };
            let coefficients = DragCoefficients::new(drag_a, drag_b);

            let run = integrate_trajectory(angle, velocity, coefficients, &settings)?;
            let characteristics = calculate_trajectory_characteristics(&run.sample)?;

            display_simulation(
                &SimulationOutput {
                    launch_speed: velocity,
                    launch_angle_deg: angle,
                    coefficients,
                    impact_time: run.impact_time,
                    characteristics,
                    trajectory: &run.sample,
                },
                output,
                full,
            )?;
        },

        Commands::Analytic { velocity, angle, output } => {
            validate_explorer_inputs(velocity, angle)?;
            let summary = summarize(velocity, angle, G_ACCEL_MPS2);

            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Csv => {
                    println!("t,x,y");
                    for (t, x, y) in sample_trajectory(velocity, angle, G_ACCEL_MPS2, 500) {
                        println!("{:.4},{:.3},{:.3}", t, x, y);
                    }
                }
                OutputFormat::Table => {
                    println!("╔════════════════════════════════════════╗");
                    println!("║      NO-DRAG TRAJECTORY                ║");
                    println!("╠════════════════════════════════════════╣");
                    println!("║ Speed:             {:>8.2} m/s        ║", summary.v0);
                    println!("║ Angle:             {:>8.2} deg        ║", summary.angle_deg);
                    println!("║ Range:             {:>8.2} m          ║", summary.range);
                    println!("║ Max Height:        {:>8.2} m          ║", summary.max_height);
                    println!("║ Time of Flight:    {:>8.3} s          ║", summary.time_of_flight);
                    println!("║ Time to Apex:      {:>8.3} s          ║", summary.time_to_apex);
                    println!("╚════════════════════════════════════════╝");
                }
            }
        },

        Commands::Info => {
            println!("╔════════════════════════════════════════╗");
            println!("║      PROJECTILE DRAG v{:<8}         ║", env!("CARGO_PKG_VERSION"));
            println!("╠════════════════════════════════════════╣");
            println!("║ Fits speed-dependent drag coefficients ║");
            println!("║ and integrates 2D projectile motion.   ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Model:                                 ║");
            println!("║ • dVx/dt = -a·Vx                       ║");
            println!("║ • dVy/dt = -g - b·Vy                   ║");
            println!("║ • a = k₁·v + c₁,  b = k₂·v² + c₂       ║");
            println!("║ • Dormand-Prince 5(4) integration      ║");
            println!("║ • Analytic range up to {:>5.0} m/s       ║", ANALYTIC_SPEED_MAX);
            println!("╚════════════════════════════════════════╝");
        }
    }

    Ok(())
}

fn display_simulation(result: &SimulationOutput, format: OutputFormat, full: bool) -> Result<(), Box<dyn Error>> {
    let sample = result.trajectory;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        },

        OutputFormat::Csv => {
            println!("t,x,y,vx,vy");
            for p in sample.iter() {
                println!("{:.4},{:.3},{:.3},{:.3},{:.3}", p.t, p.x, p.y, p.vx, p.vy);
            }
        },

        OutputFormat::Table => {
            let c = &result.characteristics;
            println!("╔════════════════════════════════════════╗");
            println!("║         TRAJECTORY RESULTS             ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Range:             {:>8.2} m          ║", c.range);
            println!("║ Max Height:        {:>8.2} m          ║", c.max_height);
            println!("║ Flight Time:       {:>8.3} s          ║", c.flight_time);
            println!("║ Time to Apex:      {:>8.3} s          ║", c.time_to_apex);
            println!("║ Impact Speed:      {:>8.2} m/s        ║", c.impact_speed);
            if let Some(t) = result.impact_time {
                println!("║ Ground Impact:     {:>8.3} s          ║", t);
            }
            println!("╚════════════════════════════════════════╝");

            let step = if full { 1 } else { (sample.len() / 10).max(1) };
            if full {
                println!("\nFull Trajectory Points:");
            } else {
                println!("\nTrajectory Points (every {:.2}s):", c.flight_time / 10.0);
            }
            println!("┌──────────┬──────────┬──────────┬──────────┬──────────┐");
            println!("│ Time (s) │  X (m)   │  Y (m)   │ Vx (m/s) │ Vy (m/s) │");
            println!("├──────────┼──────────┼──────────┼──────────┼──────────┤");
            let last = sample.len().saturating_sub(1);
            for (i, p) in sample.iter().enumerate() {
                if i % step == 0 || i == last {
                    println!("│ {:>8.3} │ {:>8.2} │ {:>8.2} │ {:>8.2} │ {:>8.2} │",
                        p.t, p.x, p.y, p.vx, p.vy);
                }
            }
            println!("└──────────┴──────────┴──────────┴──────────┴──────────┘");
        },
    }

    Ok(())
}
