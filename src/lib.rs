//! SE(3) trajectory frame changes.
//!
//! Reads timestamped pose logs, re-expresses them against a reference pose
//! or through a fixed sensor calibration, and writes them back out.
//!
//! ```rust
//! use apex_trajectory::{ColumnLayout, Delimiter, Relativizer, TrajectoryReader};
//!
//! let content = "0.0 1 0 0 0 0 0 1\n1.0 2 0 0 0 0 0 1\n";
//! let trajectory =
//!     TrajectoryReader::parse_content(content, &ColumnLayout::default(), Delimiter::Whitespace)?;
//! let relative = Relativizer::new().relativize(&trajectory)?;
//! assert_eq!(vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0], relative.rows()[1]);
//! # Ok::<(), apex_trajectory::TrajectoryError>(())
//! ```

pub mod error;
pub mod io;
pub mod logger;
pub mod manifold;
pub mod parser;
pub mod pose;
pub mod trajectory;

pub use error::{TrajectoryError, TrajectoryResult};
pub use io::{Delimiter, OutputFormat, TrajectoryReader, TrajectoryWriter, load_extrinsic};
pub use logger::{init_logger, init_logger_with_level};
pub use parser::{ColumnLayout, parse_pose};
pub use pose::{Orientation, OrientationEncoding, Pose, Trajectory};
pub use trajectory::{
    ExtrinsicCompositor, ExtrinsicConfig, Reference, Relativizer, RelativizerConfig,
};
