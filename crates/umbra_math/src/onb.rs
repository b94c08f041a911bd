use crate::Vec3;

/// Orthonormal basis with `w` aligned to a given direction.
///
/// Used to turn local-frame samples (cosine lobes, cones toward a light)
/// into world-space directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Onb {
    axis: [Vec3; 3],
}

impl Onb {
    /// Build a basis whose `w` axis is `n` normalized.
    pub fn new(n: Vec3) -> Self {
        let w = n.normalize();
        let a = if w.x.abs() > 0.9 { Vec3::Y } else { Vec3::X };
        let v = w.cross(a).normalize();
        let u = w.cross(v);
        Self { axis: [u, v, w] }
    }

    #[inline]
    pub fn u(&self) -> Vec3 {
        self.axis[0]
    }

    #[inline]
    pub fn v(&self) -> Vec3 {
        self.axis[1]
    }

    #[inline]
    pub fn w(&self) -> Vec3 {
        self.axis[2]
    }

    /// Map local coordinates `(x, y, z)` to `x*u + y*v + z*w`.
    #[inline]
    pub fn transform(&self, local: Vec3) -> Vec3 {
        local.x * self.axis[0] + local.y * self.axis[1] + local.z * self.axis[2]
    }
}
