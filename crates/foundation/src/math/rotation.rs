use super::Vec3;

/// Row-major 3x3 rotation matrix.
///
/// Rotations are built from plain degrees and composed explicitly with
/// [`Rotation::then`]; nothing is mutated in place, so the application order is
/// visible at every call site.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rotation {
    rows: [[f64; 3]; 3],
}

impl Rotation {
    pub fn identity() -> Self {
        Self {
            rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Right-handed rotation about the Y ("lateral") axis.
    pub fn about_y(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self {
            rows: [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]],
        }
    }

    /// Right-handed rotation about the Z ("vertical") axis.
    pub fn about_z(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self {
            rows: [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Compose: apply `self` first, then `next`.
    pub fn then(self, next: Rotation) -> Rotation {
        let mut rows = [[0.0; 3]; 3];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| next.rows[i][k] * self.rows[k][j]).sum();
            }
        }
        Rotation { rows }
    }

    pub fn apply(&self, v: Vec3) -> Vec3 {
        let [r0, r1, r2] = self.rows;
        Vec3::new(
            r0[0] * v.x + r0[1] * v.y + r0[2] * v.z,
            r1[0] * v.x + r1[1] * v.y + r1[2] * v.z,
            r2[0] * v.x + r2[1] * v.y + r2[2] * v.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Rotation;
    use crate::math::Vec3;

    fn assert_vec_close(a: Vec3, b: Vec3, eps: f64) {
        let diff = (a - b).length();
        assert!(diff <= eps, "expected {a:?} ~= {b:?} (diff {diff})");
    }

    #[test]
    fn quarter_turns() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        assert_vec_close(Rotation::about_z(90.0).apply(x), Vec3::new(0.0, 1.0, 0.0), 1e-12);
        assert_vec_close(Rotation::about_y(90.0).apply(x), Vec3::new(0.0, 0.0, -1.0), 1e-12);
    }

    #[test]
    fn composition_matches_sequential_application() {
        let v = Vec3::new(2.0, -1.0, 0.5);
        let first = Rotation::about_z(33.0);
        let second = Rotation::about_y(-71.0);
        let composed = first.then(second).apply(v);
        let sequential = second.apply(first.apply(v));
        assert_vec_close(composed, sequential, 1e-12);
    }

    #[test]
    fn identity_is_neutral() {
        let v = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(Rotation::identity().apply(v), v);
        let r = Rotation::about_y(12.0);
        assert_vec_close(r.then(Rotation::identity()).apply(v), r.apply(v), 1e-12);
    }
}
