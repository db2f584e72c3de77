//! Quaternion conversion tool
//!
//! Reads quaternions from a CSV file with `w,x,y,z` columns and writes, for each row,
//! the rotation vector, axis-angle pair, Euler angles and spherical coordinates.
//!
//! # Usage
//! ```bash
//! cargo run --release --bin quat_convert -- --input rotations.csv
//!
//! # Euler angles for another sequence, writing to a file:
//! cargo run --release --bin quat_convert -- -i rotations.csv -s xyz -o converted.csv
//! ```

use clap::Parser;
use csv::{Reader, Writer};
use quaternion_array::{EulerSequence, Quaternion, QuaternionArray, Tolerances, init_logger};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Convert quaternions to other rotation representations
#[derive(Parser)]
#[command(name = "quat_convert")]
#[command(about = "Convert quaternions from a CSV file to other rotation representations")]
struct Args {
    /// CSV file with w,x,y,z columns
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Euler axis sequence: one of xyz, xzy, yxz, yzx, zxy, zyx, xyx, xzx, yxy, yzy, zxz, zyz
    #[arg(short, long, default_value = "zyx")]
    sequence: EulerSequence,

    /// Normalize each quaternion before converting
    #[arg(long)]
    normalize: bool,

    /// Tolerance on the middle Euler angle for gimbal-lock detection
    #[arg(long, default_value = "1e-9")]
    gimbal_tolerance: f64,
}

#[derive(Debug, Deserialize)]
struct InputRecord {
    w: f64,
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Serialize)]
struct OutputRecord {
    w: f64,
    x: f64,
    y: f64,
    z: f64,
    rotvec_x: f64,
    rotvec_y: f64,
    rotvec_z: f64,
    axis_x: f64,
    axis_y: f64,
    axis_z: f64,
    angle: f64,
    sequence: String,
    euler_1: f64,
    euler_2: f64,
    euler_3: f64,
    theta: f64,
    phi: f64,
}

fn read_quaternions(path: &PathBuf) -> Result<QuaternionArray, Box<dyn Error>> {
    let mut reader =
        Reader::from_path(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let mut quaternions = Vec::new();
    for (row, record) in reader.deserialize().enumerate() {
        let record: InputRecord =
            record.map_err(|e| format!("Failed to parse CSV record {}: {}", row + 1, e))?;
        quaternions.push(Quaternion::new(record.w, record.x, record.y, record.z));
    }
    Ok(QuaternionArray::from_vec(quaternions))
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    init_logger();

    let tolerances = Tolerances::default().with_gimbal_lock(args.gimbal_tolerance);
    tolerances.validate()?;

    let start = Instant::now();
    let mut quaternions = read_quaternions(&args.input)?;
    info!("Loaded {} quaternions from {}", quaternions.len(), args.input.display());

    quaternions.ensure_finite()?;
    if args.normalize {
        quaternions.normalize_in_place(&tolerances)?;
    }

    let rotation_vectors = quaternions.to_rotation_vector_with(&tolerances)?;
    let (axes, angles) = quaternions.to_axis_angle_with(&tolerances)?;
    let euler = quaternions.to_euler_angles_with(args.sequence, &tolerances)?;
    let (theta, phi) = quaternions.to_spherical_coordinates_with(&tolerances)?;

    let sink: Box<dyn io::Write> = match &args.output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(io::stdout()),
    };
    let mut writer = Writer::from_writer(sink);

    for i in 0..quaternions.len() {
        let q = quaternions.as_slice()[i];
        let v = rotation_vectors.as_slice()[i];
        let axis = axes.as_slice()[i];
        let e = euler.as_slice()[i];
        writer.serialize(OutputRecord {
            w: q.w(),
            x: q.x(),
            y: q.y(),
            z: q.z(),
            rotvec_x: v.x,
            rotvec_y: v.y,
            rotvec_z: v.z,
            axis_x: axis.x,
            axis_y: axis.y,
            axis_z: axis.z,
            angle: angles.as_slice()[i],
            sequence: args.sequence.to_string(),
            euler_1: e.x,
            euler_2: e.y,
            euler_3: e.z,
            theta: theta.as_slice()[i],
            phi: phi.as_slice()[i],
        })?;
    }
    writer.flush()?;

    info!(
        "Converted {} quaternions ({} Euler angles) in {:?}",
        quaternions.len(),
        args.sequence,
        start.elapsed()
    );
    Ok(())
}
