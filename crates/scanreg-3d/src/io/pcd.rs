use std::io::{BufRead, Read, Write};
use std::path::Path;

use crate::pointcloud::PointCloud;

const MAX_POINT_STEP: usize = 1024;
const MAX_POINTS: usize = 50_000_000;

/// Error types for the PCD module.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PcdError {
    /// Failed to read or write a PCD file
    #[error("Failed to read or write PCD file")]
    Io(#[from] std::io::Error),

    /// Unsupported field layout
    #[error("Unsupported PCD field layout")]
    UnsupportedLayout,

    /// Malformed PCD header
    #[error("Malformed PCD header")]
    MalformedHeader,

    /// Invalid PCD file extension
    #[error("Invalid PCD file extension. Got: {0}")]
    InvalidFileExtension(String),
}

/// A single field in a PCD point record.
#[derive(Debug)]
struct PcdField {
    name: String,
    offset: usize, // byte offset within a point
    size: usize,
    count: usize,
    kind: char, // 'F' = float, 'U' = unsigned int, 'I' = signed int
}

#[derive(Debug)]
struct PcdHeader {
    fields: Vec<PcdField>,
    point_step: usize,
    num_points: usize,
}

impl PcdHeader {
    /// Byte offset of a scalar f32 field known under any of `names`.
    fn scalar_f32_offset(&self, names: &[&str]) -> Result<Option<usize>, PcdError> {
        for field in &self.fields {
            if names.contains(&field.name.as_str()) {
                if field.size != 4 || field.count != 1 || field.kind != 'F' {
                    return Err(PcdError::UnsupportedLayout);
                }
                return Ok(Some(field.offset));
            }
        }
        Ok(None)
    }
}

#[inline]
fn read_f32_le(buf: &[u8], offset: usize) -> Result<f32, PcdError> {
    let slice = buf
        .get(offset..offset + 4)
        .ok_or(PcdError::MalformedHeader)?;
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(slice);
    Ok(f32::from_le_bytes(bytes))
}

fn parse_pcd_header<R: BufRead>(reader: &mut R) -> Result<PcdHeader, PcdError> {
    let mut names: Vec<String> = Vec::new();
    let mut sizes: Vec<usize> = Vec::new();
    let mut kinds: Vec<char> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    let mut num_points = 0usize;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(PcdError::MalformedHeader);
        }
        let line = line.trim();

        if line.starts_with("DATA") {
            if line != "DATA binary" {
                return Err(PcdError::UnsupportedLayout);
            }
            break;
        }

        let mut it = line.split_whitespace();
        match it.next() {
            Some("FIELDS") => names = it.map(String::from).collect(),
            Some("SIZE") => {
                sizes = it
                    .map(|v| v.parse().map_err(|_| PcdError::MalformedHeader))
                    .collect::<Result<_, _>>()?;
            }
            Some("TYPE") => {
                kinds = it
                    .map(|v| v.chars().next().ok_or(PcdError::MalformedHeader))
                    .collect::<Result<_, _>>()?;
            }
            Some("COUNT") => {
                counts = it
                    .map(|v| v.parse().map_err(|_| PcdError::MalformedHeader))
                    .collect::<Result<_, _>>()?;
            }
            Some("POINTS") => {
                num_points = it
                    .next()
                    .ok_or(PcdError::MalformedHeader)?
                    .parse()
                    .map_err(|_| PcdError::MalformedHeader)?;
            }
            // VERSION, WIDTH, HEIGHT, VIEWPOINT, comments
            _ => {}
        }
    }

    if names.is_empty()
        || sizes.len() != names.len()
        || kinds.len() != names.len()
        || (!counts.is_empty() && counts.len() != names.len())
    {
        return Err(PcdError::MalformedHeader);
    }

    let mut fields = Vec::with_capacity(names.len());
    let mut offset = 0usize;
    for (i, name) in names.into_iter().enumerate() {
        // COUNT is optional; the PCD spec defines the default as 1
        let count = counts.get(i).copied().unwrap_or(1);
        let field_bytes = sizes[i].checked_mul(count).ok_or(PcdError::MalformedHeader)?;

        if fields.iter().any(|f: &PcdField| f.name == name) {
            return Err(PcdError::MalformedHeader);
        }
        fields.push(PcdField {
            name,
            offset,
            size: sizes[i],
            count,
            kind: kinds[i],
        });

        offset = offset.checked_add(field_bytes).ok_or(PcdError::MalformedHeader)?;
        if offset > MAX_POINT_STEP {
            return Err(PcdError::MalformedHeader);
        }
    }

    Ok(PcdHeader {
        fields,
        point_step: offset,
        num_points,
    })
}

fn check_extension(path: &Path) -> Result<(), PcdError> {
    match path.extension() {
        Some(ext) if ext == "pcd" => Ok(()),
        Some(ext) => Err(PcdError::InvalidFileExtension(
            ext.to_string_lossy().to_string(),
        )),
        None => Err(PcdError::InvalidFileExtension("".into())),
    }
}

/// Read a binary PCD file.
///
/// # Arguments
/// * `path` - Path to a `.pcd` file.
///
/// # Returns
/// A [`PointCloud`] with points, plus normals and curvatures when the file
/// carries them. Points with non-finite coordinates are dropped so they
/// never reach the registration core.
///
/// # Supported formats
/// - XYZ
/// - XYZ + normals
/// - XYZ + normals + curvature
pub fn read_pcd_binary(path: impl AsRef<Path>) -> Result<PointCloud, PcdError> {
    check_extension(path.as_ref())?;

    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);

    let header = parse_pcd_header(&mut reader)?;
    if header.num_points == 0 || header.num_points > MAX_POINTS {
        return Err(PcdError::MalformedHeader);
    }
    if header.point_step == 0 {
        return Err(PcdError::MalformedHeader);
    }

    let fx = header
        .scalar_f32_offset(&["x"])?
        .ok_or(PcdError::UnsupportedLayout)?;
    let fy = header
        .scalar_f32_offset(&["y"])?
        .ok_or(PcdError::UnsupportedLayout)?;
    let fz = header
        .scalar_f32_offset(&["z"])?
        .ok_or(PcdError::UnsupportedLayout)?;

    let fnx = header.scalar_f32_offset(&["normal_x", "nx"])?;
    let fny = header.scalar_f32_offset(&["normal_y", "ny"])?;
    let fnz = header.scalar_f32_offset(&["normal_z", "nz"])?;
    let fcurv = header.scalar_f32_offset(&["curvature"])?;

    let has_normals = fnx.is_some() && fny.is_some() && fnz.is_some();

    let mut buffer = vec![0u8; header.point_step];
    let mut points = Vec::with_capacity(header.num_points);
    let mut normals = Vec::new();
    let mut curvatures = Vec::new();

    for _ in 0..header.num_points {
        reader.read_exact(&mut buffer)?;

        let x = read_f32_le(&buffer, fx)?;
        let y = read_f32_le(&buffer, fy)?;
        let z = read_f32_le(&buffer, fz)?;
        points.push([x as f64, y as f64, z as f64]);

        if let (true, Some(ox), Some(oy), Some(oz)) = (has_normals, fnx, fny, fnz) {
            normals.push([
                read_f32_le(&buffer, ox)? as f64,
                read_f32_le(&buffer, oy)? as f64,
                read_f32_le(&buffer, oz)? as f64,
            ]);
        }
        if let Some(off) = fcurv {
            curvatures.push(read_f32_le(&buffer, off)? as f64);
        }
    }

    let cloud = PointCloud::new(
        points,
        (!normals.is_empty()).then_some(normals),
        (!curvatures.is_empty()).then_some(curvatures),
    );

    let filtered = cloud.without_non_finite();
    if filtered.len() < cloud.len() {
        log::warn!(
            "dropped {} non-finite points while reading PCD",
            cloud.len() - filtered.len()
        );
    }

    Ok(filtered)
}

/// Write a binary PCD file.
///
/// # Arguments
/// * `cloud` - The cloud to persist.
/// * `path` - Destination `.pcd` path.
///
/// Writes x/y/z, plus normal_x/y/z and curvature fields when the cloud
/// carries those channels, as little-endian f32 records.
pub fn write_pcd_binary(cloud: &PointCloud, path: impl AsRef<Path>) -> Result<(), PcdError> {
    check_extension(path.as_ref())?;

    let mut names = vec!["x", "y", "z"];
    if cloud.normals().is_some() {
        names.extend(["normal_x", "normal_y", "normal_z"]);
    }
    if cloud.curvatures().is_some() {
        names.push("curvature");
    }

    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);

    writeln!(writer, "VERSION 0.7")?;
    writeln!(writer, "FIELDS {}", names.join(" "))?;
    writeln!(writer, "SIZE {}", vec!["4"; names.len()].join(" "))?;
    writeln!(writer, "TYPE {}", vec!["F"; names.len()].join(" "))?;
    writeln!(writer, "COUNT {}", vec!["1"; names.len()].join(" "))?;
    writeln!(writer, "WIDTH {}", cloud.len())?;
    writeln!(writer, "HEIGHT 1")?;
    writeln!(writer, "VIEWPOINT 0 0 0 1 0 0 0")?;
    writeln!(writer, "POINTS {}", cloud.len())?;
    writeln!(writer, "DATA binary")?;

    for i in 0..cloud.len() {
        let p = cloud.points()[i];
        for v in p {
            writer.write_all(&(v as f32).to_le_bytes())?;
        }
        if let Some(normals) = cloud.normals() {
            for v in normals[i] {
                writer.write_all(&(v as f32).to_le_bytes())?;
            }
        }
        if let Some(curvatures) = cloud.curvatures() {
            writer.write_all(&(curvatures[i] as f32).to_le_bytes())?;
        }
    }

    writer.flush()?;
    Ok(())
}
