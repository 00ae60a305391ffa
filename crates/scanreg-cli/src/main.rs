use argh::FromArgs;
use std::path::PathBuf;

use scanreg_3d::{
    io::{pcd, pose},
    voxel_grid::VoxelGrid,
};
use scanreg_icp::{register_sequence, AlignmentContext, PairOutcome, Scan};

#[derive(FromArgs)]
/// Register a sequence of scans pairwise into the frame of the first scan.
struct Args {
    /// directory holding scanNNN.pcd files and optional scanNNN.pose files
    #[argh(option)]
    data_dir: PathBuf,

    /// index of the first scan
    #[argh(option, default = "0")]
    start: usize,

    /// index of the last scan, inclusive
    #[argh(option)]
    end: usize,

    /// directory to write the registered pair clouds into
    #[argh(option)]
    output_dir: PathBuf,

    /// downsample the scans with a voxel grid before registering
    #[argh(switch)]
    downsample: bool,

    /// voxel grid leaf size in meters
    #[argh(option, default = "0.05")]
    leaf_size: f64,

    /// correspondence rejection distance in meters
    #[argh(option, default = "0.5")]
    max_correspondence_distance: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    if args.downsample && args.leaf_size <= 0.0 {
        return Err("leaf size must be positive".into());
    }

    let scans = load_scans(&args);
    if scans.len() < 2 {
        return Err(format!(
            "need at least 2 scans to register, found {} in {}",
            scans.len(),
            args.data_dir.display()
        )
        .into());
    }
    log::info!("loaded {} scans from {}", scans.len(), args.data_dir.display());

    let context = AlignmentContext {
        max_correspondence_distance: args.max_correspondence_distance,
        ..AlignmentContext::default()
    };

    std::fs::create_dir_all(&args.output_dir)?;

    let registered = register_sequence(&scans, &context)?;
    for pair in &registered {
        match pair.outcome {
            PairOutcome::Aligned(status) => {
                let path = args.output_dir.join(format!("{}.pcd", pair.scan_index));
                pcd::write_pcd_binary(&pair.cloud, &path)?;
                println!(
                    "{}: {:?}, {} points -> {}",
                    pair.name,
                    status,
                    pair.cloud.len(),
                    path.display()
                );
            }
            PairOutcome::Skipped => {
                println!("{}: skipped", pair.name);
            }
        }
    }

    Ok(())
}

/// Load the scan range, pairing each cloud with its pose file when one sits
/// next to it. Pose headings are stored in degrees.
///
/// A scan that fails to load is skipped with a warning; the caller decides
/// whether enough scans survived.
fn load_scans(args: &Args) -> Vec<Scan> {
    let mut scans = Vec::with_capacity(args.end.saturating_sub(args.start) + 1);
    for index in args.start..=args.end {
        let name = format!("scan{index:03}");
        let pcd_path = args.data_dir.join(format!("{name}.pcd"));
        let cloud = match pcd::read_pcd_binary(&pcd_path) {
            Ok(cloud) => cloud,
            Err(e) => {
                log::warn!("skipping {}: {}", pcd_path.display(), e);
                continue;
            }
        };

        let pose_path = args.data_dir.join(format!("{name}.pose"));
        let pose = match pose::read_pose_file(&pose_path) {
            Ok(pose) => Some(pose.heading_to_radians()),
            Err(e) => {
                if pose_path.exists() {
                    log::warn!("ignoring {}: {}", pose_path.display(), e);
                }
                None
            }
        };

        let cloud = if args.downsample {
            let filter = VoxelGrid::new(args.leaf_size);
            let downsampled = filter.downsample(&cloud);
            log::info!(
                "{}: downsampled {} -> {} points",
                name,
                cloud.len(),
                downsampled.len()
            );
            downsampled
        } else {
            cloud
        };

        scans.push(Scan { name, cloud, pose });
    }
    scans
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanreg_3d::pointcloud::PointCloud;

    #[test]
    fn missing_scans_in_the_range_are_skipped() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cloud = PointCloud::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            None,
            None,
        );
        pcd::write_pcd_binary(&cloud, dir.path().join("scan000.pcd")).expect("write scan000");
        pcd::write_pcd_binary(&cloud, dir.path().join("scan002.pcd")).expect("write scan002");

        let args = Args {
            data_dir: dir.path().to_path_buf(),
            start: 0,
            end: 2,
            output_dir: dir.path().join("out"),
            downsample: false,
            leaf_size: 0.05,
            max_correspondence_distance: 0.5,
        };

        // scan001.pcd does not exist, the two others load
        let scans = load_scans(&args);
        assert_eq!(scans.len(), 2);
        assert_eq!(scans[0].name, "scan000");
        assert_eq!(scans[1].name, "scan002");
        assert!(scans[0].pose.is_none());
    }

    #[test]
    fn pose_files_are_paired_when_present() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cloud = PointCloud::new(vec![[0.0, 0.0, 0.0]], None, None);
        pcd::write_pcd_binary(&cloud, dir.path().join("scan000.pcd")).expect("write scan000");
        std::fs::write(dir.path().join("scan000.pose"), "1.0 2.0 0 0 0 90.0")
            .expect("write pose");

        let args = Args {
            data_dir: dir.path().to_path_buf(),
            start: 0,
            end: 0,
            output_dir: dir.path().join("out"),
            downsample: false,
            leaf_size: 0.05,
            max_correspondence_distance: 0.5,
        };

        let scans = load_scans(&args);
        assert_eq!(scans.len(), 1);
        let pose = scans[0].pose.expect("pose file read");
        assert_eq!((pose.x, pose.y), (1.0, 2.0));
        assert!((pose.heading - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
