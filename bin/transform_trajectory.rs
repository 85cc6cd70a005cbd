use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use apex_trajectory::io::calibration::extrinsic_from_values;
use apex_trajectory::manifold::so3::EulerSequence;
use apex_trajectory::{
    ColumnLayout, Delimiter, ExtrinsicCompositor, ExtrinsicConfig, OrientationEncoding,
    OutputFormat, Relativizer, RelativizerConfig, Trajectory, TrajectoryError, TrajectoryReader,
    TrajectoryResult, TrajectoryWriter, init_logger, init_logger_with_level, load_extrinsic,
};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "transform_trajectory")]
#[command(about = "Re-express pose trajectories in a new reference frame")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Express every pose relative to the first pose of the trajectory
    Relativize(RelativizeArgs),
    /// Turn A_T_B poses into A_T_C through a fixed C_T_B calibration
    Extrinsic(ExtrinsicArgs),
}

impl Command {
    fn common(&self) -> &CommonArgs {
        match self {
            Command::Relativize(args) => &args.common,
            Command::Extrinsic(args) => &args.common,
        }
    }
}

#[derive(clap::Args)]
struct CommonArgs {
    /// Input trajectory file
    #[arg(short, long)]
    input: PathBuf,

    /// Output trajectory file
    #[arg(short, long)]
    output: PathBuf,

    /// Timestamp column index
    #[arg(long, default_value_t = 0)]
    time_col: usize,

    /// Translation column indices x,y,z
    #[arg(long, value_delimiter = ',', default_value = "1,2,3")]
    pos_cols: Vec<usize>,

    /// Orientation column indices: qx,qy,qz,qw or roll,pitch,yaw
    /// (default: right after the translation)
    #[arg(long, value_delimiter = ',')]
    orient_cols: Option<Vec<usize>>,

    /// Input orientation encoding: "quat", "euler" (radians) or "euler_deg"
    #[arg(long, default_value = "quat")]
    orient_format: OrientationEncoding,

    /// Output orientation encoding (default: quaternion)
    #[arg(long)]
    output_format: Option<OrientationEncoding>,

    /// Euler sequence: "XYZ" (intrinsic) or "xyz" (extrinsic)
    #[arg(long, default_value = "XYZ")]
    euler_sequence: EulerSequence,

    /// Column delimiter: "whitespace", a single character, "tab" or "comma"
    #[arg(long, default_value = "whitespace")]
    delimiter: Delimiter,

    /// Decimal places written for every value
    #[arg(long, default_value_t = 6)]
    decimal_places: usize,

    /// Keep input quaternions as they are instead of normalizing them
    #[arg(long)]
    no_normalize: bool,

    /// Reject rotations that deviate from orthonormal by more than this
    #[arg(long)]
    rotation_tolerance: Option<f64>,

    /// Log at DEBUG level
    #[arg(short, long)]
    verbose: bool,
}

impl CommonArgs {
    fn layout(&self) -> TrajectoryResult<ColumnLayout> {
        let translation: [usize; 3] =
            self.pos_cols
                .as_slice()
                .try_into()
                .map_err(|_| TrajectoryError::DimensionMismatch {
                    what: "translation columns".to_string(),
                    expected: 3,
                    actual: self.pos_cols.len(),
                })?;

        let encoding = self.orient_format.with_sequence(self.euler_sequence);
        let orientation = match &self.orient_cols {
            Some(cols) => cols.clone(),
            None => {
                let start = translation.iter().copied().max().unwrap_or(3) + 1;
                (start..start + encoding.dimension()).collect()
            }
        };

        Ok(
            ColumnLayout::new(self.time_col, translation, &orientation, encoding)?
                .with_normalize_quaternions(!self.no_normalize),
        )
    }

    fn output_encoding(&self) -> OrientationEncoding {
        self.output_format
            .unwrap_or_default()
            .with_sequence(self.euler_sequence)
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::new()
            .with_delimiter(self.delimiter)
            .with_decimal_places(self.decimal_places)
    }

    fn load(&self) -> TrajectoryResult<Trajectory> {
        let layout = self.layout()?;
        let trajectory = TrajectoryReader::load(&self.input, &layout, self.delimiter)?;
        info!(
            "Loaded {} poses from {} ({})",
            trajectory.len(),
            self.input.display(),
            layout.encoding()
        );
        Ok(trajectory)
    }

    fn save(&self, trajectory: &Trajectory) -> TrajectoryResult<()> {
        TrajectoryWriter::write_trajectory(&self.output, trajectory, &self.format())?;
        info!(
            "Saved {} poses to {}",
            trajectory.len(),
            self.output.display()
        );
        Ok(())
    }
}

#[derive(clap::Args)]
struct RelativizeArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Subtract the first timestamp from every row
    #[arg(long)]
    shift_time: bool,
}

#[derive(clap::Args)]
#[command(group(
    ArgGroup::new("calibration")
        .required(true)
        .args(["extrinsic_file", "extrinsic"])
))]
struct ExtrinsicArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Calibration file with C_T_B: tx ty tz followed by the row-major rotation
    #[arg(long)]
    extrinsic_file: Option<PathBuf>,

    /// Inline C_T_B as 12 comma-separated values: tx,ty,tz,r00,r01,...,r22
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    extrinsic: Option<Vec<f64>>,
}

fn run_relativize(args: &RelativizeArgs) -> TrajectoryResult<()> {
    let common = &args.common;
    let trajectory = common.load()?;

    let mut config = RelativizerConfig::new()
        .with_shift_time(args.shift_time)
        .with_output_encoding(common.output_encoding());
    if let Some(tolerance) = common.rotation_tolerance {
        config = config.with_rotation_tolerance(tolerance);
    }

    let start = Instant::now();
    let relative = Relativizer::with_config(config).relativize(&trajectory)?;
    info!("Relativized in {:.2?}", start.elapsed());

    common.save(&relative)
}

fn run_extrinsic(args: &ExtrinsicArgs) -> TrajectoryResult<()> {
    let common = &args.common;

    let c_t_b = match (&args.extrinsic_file, &args.extrinsic) {
        (Some(path), _) => load_extrinsic(path)?,
        (None, Some(values)) => extrinsic_from_values(values)?,
        (None, None) => {
            return Err(TrajectoryError::InvalidInput(
                "either --extrinsic-file or --extrinsic is required".to_string(),
            ));
        }
    };
    info!("Extrinsic C_T_B: {}", c_t_b);

    let mut config = ExtrinsicConfig::new().with_output_encoding(common.output_encoding());
    if let Some(tolerance) = common.rotation_tolerance {
        config = config.with_rotation_tolerance(tolerance);
    }
    let compositor = ExtrinsicCompositor::new(c_t_b, config)?;

    let trajectory = common.load()?;
    let start = Instant::now();
    let a_t_c = compositor.apply(&trajectory)?;
    info!("Composed extrinsic in {:.2?}", start.elapsed());

    common.save(&a_t_c)
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.command.common().verbose {
        init_logger_with_level(Level::DEBUG);
    } else {
        init_logger();
    }

    let result = match &args.command {
        Command::Relativize(relativize) => run_relativize(relativize),
        Command::Extrinsic(extrinsic) => run_extrinsic(extrinsic),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALIBRATION: &str = "-0.019978,-0.075,-0.036192,0.999168,-0.040781,0.000593,\
                               -0.040781,-0.999168,0.0,0.000592,-0.000024,-1.0";

    #[test]
    fn test_inline_extrinsic_accepts_negative_values() {
        let args = Args::try_parse_from([
            "transform_trajectory",
            "extrinsic",
            "-i",
            "in.txt",
            "-o",
            "out.txt",
            "--extrinsic",
            CALIBRATION,
        ])
        .unwrap();

        let Command::Extrinsic(extrinsic) = args.command else {
            panic!("Expected the extrinsic subcommand");
        };
        let values = extrinsic.extrinsic.unwrap();
        assert_eq!(12, values.len());
        assert_eq!(-0.019978, values[0]);
        assert_eq!(-1.0, values[11]);

        let c_t_b = extrinsic_from_values(&values).unwrap();
        assert_eq!(-0.075, c_t_b.translation().y);
    }

    #[test]
    fn test_inline_extrinsic_keeps_following_flags() {
        let args = Args::try_parse_from([
            "transform_trajectory",
            "extrinsic",
            "--extrinsic",
            CALIBRATION,
            "-i",
            "in.txt",
            "-o",
            "out.txt",
            "--verbose",
        ])
        .unwrap();

        assert!(args.command.common().verbose);
        assert_eq!(PathBuf::from("in.txt"), args.command.common().input);
    }

    #[test]
    fn test_extrinsic_source_required() {
        let result = Args::try_parse_from([
            "transform_trajectory",
            "extrinsic",
            "-i",
            "in.txt",
            "-o",
            "out.txt",
        ]);
        assert!(result.is_err());
    }
}
