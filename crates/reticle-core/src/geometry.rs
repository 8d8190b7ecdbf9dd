use std::ops::{Add, Sub};

/// One of the three scene axes a layout or scroll can operate on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn scaled(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Rotation carried through transforms. The toolkit never interprets it; it
/// only snapshots and compares it for change detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

impl Default for Quat {
    fn default() -> Self {
        Quat::IDENTITY
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3 {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform3 {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }
}

impl Default for Transform3 {
    fn default() -> Self {
        Self::identity()
    }
}

/// Per-axis extents and offsets.
///
/// NaN and infinity are sentinels meaning "no constraint on this axis" —
/// callers test with [`AxisVec::is_nan`] / [`AxisVec::is_finite`] and clamp
/// instead of erroring.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisVec {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AxisVec {
    pub const ZERO: AxisVec = AxisVec {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// All axes unconstrained.
    pub const UNSET: AxisVec = AxisVec {
        x: f32::NAN,
        y: f32::NAN,
        z: f32::NAN,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    pub fn get(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn set(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }

    /// True if any axis carries the NaN sentinel.
    pub fn is_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }

    pub fn is_infinite(&self) -> bool {
        self.x.is_infinite() || self.y.is_infinite() || self.z.is_infinite()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for AxisVec {
    type Output = AxisVec;
    fn add(self, rhs: AxisVec) -> AxisVec {
        AxisVec::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for AxisVec {
    type Output = AxisVec;
    fn sub(self, rhs: AxisVec) -> AxisVec {
        AxisVec::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Axis-aligned bounds used by the reference scene's pick test.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn from_center_extent(center: Vec3, extent: AxisVec) -> Self {
        let half = Vec3::new(extent.x * 0.5, extent.y * 0.5, extent.z * 0.5);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Slab test; returns the entry distance when the ray hits.
    pub fn intersect_ray(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for (o, d, lo, hi) in [
            (origin.x, dir.x, self.min.x, self.max.x),
            (origin.y, dir.y, self.min.y, self.max.y),
            (origin.z, dir.z, self.min.z, self.max.z),
        ] {
            if d.abs() < f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (t0, t1) = ((lo - o) * inv, (hi - o) * inv);
            let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
            t_min = t_min.max(near);
            t_max = t_max.min(far);
            if t_min > t_max {
                return None;
            }
        }
        if t_max < 0.0 {
            return None;
        }
        Some(t_min.max(0.0))
    }
}

/// Float comparison with the tolerance the layout math uses throughout.
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}
