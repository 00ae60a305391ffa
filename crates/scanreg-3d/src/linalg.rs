/// Transform a set of points using a rotation and translation.
///
/// # Arguments
///
/// * `src_points` - A set of points to be transformed.
/// * `dst_r_src` - A rotation matrix.
/// * `dst_t_src` - A translation vector.
/// * `dst_points` - A pre-allocated slice to store the transformed points.
///
/// PRECONDITION: `dst_points` has the same length as `src_points`.
pub fn transform_points(
    src_points: &[[f64; 3]],
    dst_r_src: &[[f64; 3]; 3],
    dst_t_src: &[f64; 3],
    dst_points: &mut [[f64; 3]],
) {
    assert_eq!(src_points.len(), dst_points.len());

    let rotation = {
        let slice = unsafe {
            std::slice::from_raw_parts(dst_r_src.as_ptr() as *const f64, 9)
        };
        faer::mat::from_row_major_slice(slice, 3, 3)
    };

    // view of the source points as an Nx3 row-major matrix
    let points_in_src = {
        let slice = unsafe {
            std::slice::from_raw_parts(src_points.as_ptr() as *const f64, src_points.len() * 3)
        };
        faer::mat::from_row_major_slice(slice, src_points.len(), 3)
    };

    // mutable view of the destination points, one column per point
    let mut points_in_dst = {
        let slice = unsafe {
            std::slice::from_raw_parts_mut(
                dst_points.as_mut_ptr() as *mut f64,
                dst_points.len() * 3,
            )
        };
        faer::mat::from_column_major_slice_mut(slice, 3, dst_points.len())
    };

    faer::linalg::matmul::matmul(
        &mut points_in_dst,
        rotation,
        points_in_src.transpose(),
        None,
        1.0,
        faer::Parallelism::None,
    );

    for mut col in points_in_dst.col_iter_mut() {
        col.write(0, col.read(0) + dst_t_src[0]);
        col.write(1, col.read(1) + dst_t_src[1]);
        col.write(2, col.read(2) + dst_t_src[2]);
    }
}

/// Multiply two 3x3 matrices, `out = a * b`.
pub fn matmul33(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    out
}

/// Eigendecomposition of a symmetric 3x3 matrix by cyclic Jacobi rotations.
///
/// # Returns
///
/// Eigenvalues in ascending order together with their unit eigenvectors,
/// `vectors[k]` belonging to `values[k]`.
///
/// PRECONDITION: `m` is symmetric; only the upper triangle is trusted.
pub fn symmetric_eigen3(m: &[[f64; 3]; 3]) -> ([f64; 3], [[f64; 3]; 3]) {
    const MAX_SWEEPS: usize = 32;
    const PAIRS: [(usize, usize); 3] = [(0, 1), (0, 2), (1, 2)];

    let mut a = *m;
    let mut v = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    for _ in 0..MAX_SWEEPS {
        let off = a[0][1] * a[0][1] + a[0][2] * a[0][2] + a[1][2] * a[1][2];
        if off < 1e-30 {
            break;
        }

        for (p, q) in PAIRS {
            if a[p][q].abs() < 1e-300 {
                continue;
            }

            // classic Jacobi rotation that annihilates a[p][q]
            let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;

            let mut g = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
            g[p][p] = c;
            g[q][q] = c;
            g[p][q] = s;
            g[q][p] = -s;

            let gt = transpose33(&g);
            a = matmul33(&gt, &matmul33(&a, &g));
            v = matmul33(&v, &g);
        }
    }

    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| {
        a[i][i]
            .partial_cmp(&a[j][j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut values = [0.0; 3];
    let mut vectors = [[0.0; 3]; 3];
    for (k, &idx) in order.iter().enumerate() {
        values[k] = a[idx][idx];
        vectors[k] = [v[0][idx], v[1][idx], v[2][idx]];
    }

    (values, vectors)
}

fn transpose33(m: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = m[j][i];
        }
    }
    out
}
