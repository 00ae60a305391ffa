use std::path::Path;

use crate::pose::Pose2d;

/// Error types for the pose file module.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PoseError {
    /// Failed to read the pose file
    #[error("Failed to read pose file")]
    Io(#[from] std::io::Error),

    /// Malformed pose record
    #[error("Malformed pose record")]
    MalformedRecord,
}

/// Parse a pose record of the form `x y _ _ _ heading`.
///
/// The record carries six whitespace-separated numbers; the third through
/// fifth are ignored. The heading is returned exactly as stored (degrees in
/// the scan datasets this was written for); convert before seeding with it.
fn parse_pose_record(text: &str) -> Result<Pose2d, PoseError> {
    let values = text
        .split_whitespace()
        .map(|token| token.parse::<f64>().map_err(|_| PoseError::MalformedRecord))
        .collect::<Result<Vec<_>, _>>()?;

    if values.len() < 6 {
        return Err(PoseError::MalformedRecord);
    }

    Ok(Pose2d::new(values[0], values[1], values[5]))
}

/// Read a `.pose` file holding a single planar pose record.
pub fn read_pose_file(path: impl AsRef<Path>) -> Result<Pose2d, PoseError> {
    let text = std::fs::read_to_string(path)?;
    parse_pose_record(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_value_record() -> Result<(), PoseError> {
        let pose = parse_pose_record("1.5 -2.25 0.0 0.0 0.0 90.0")?;
        assert_eq!(pose.x, 1.5);
        assert_eq!(pose.y, -2.25);
        assert_eq!(pose.heading, 90.0);
        Ok(())
    }

    #[test]
    fn rejects_short_record() {
        assert!(parse_pose_record("1.0 2.0 3.0").is_err());
    }

    #[test]
    fn rejects_non_numeric_tokens() {
        assert!(parse_pose_record("a b c d e f").is_err());
    }
}
