//! Implementation of bounding volumes

use glam::Vec3A;

/// An axis aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3A,
    pub max: Vec3A,
}

impl BoundingBox {
    /// Creates a new Axis aligned bounding box
    pub fn new(p0: Vec3A, p1: Vec3A) -> Self {
        Self {
            min: p0.min(p1),
            max: p0.max(p1),
        }
    }

    /// Returns a box with inverted infinite extents, the identity for [BoundingBox::union].
    pub fn empty() -> Self {
        Self {
            min: Vec3A::splat(f32::INFINITY),
            max: Vec3A::splat(f32::NEG_INFINITY),
        }
    }

    /// Returns a bounding box enclosing this and the other box.
    ///
    /// In other words, combines the two boxes by taking:
    /// * the minimums of the two boxes' min members
    /// * the maximums of the two boxes' max members
    pub fn union(&self, other: BoundingBox) -> BoundingBox {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn add_point(&self, point: Vec3A) -> BoundingBox {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    pub fn diagonal(&self) -> Vec3A {
        self.max - self.min
    }

    /// Widens every axis whose extent is below `epsilon` by `epsilon` on both sides.
    ///
    /// Flat geometry (a quad lying in a plane, a single triangle) would otherwise
    /// produce a box of zero thickness along one axis.
    pub fn inflate(&self, epsilon: f32) -> BoundingBox {
        let thin = self.diagonal().cmplt(Vec3A::splat(epsilon));
        let pad = Vec3A::select(thin, Vec3A::splat(epsilon), Vec3A::ZERO);
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    /// Returns the axis of greatest extent, preferring x over y over z on ties.
    pub fn longest_axis(&self) -> usize {
        let d = self.diagonal();
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    pub fn inside(&self, point: Vec3A) -> bool {
        self.max.cmpge(point).all() && self.min.cmple(point).all()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<Vec3A> for BoundingBox {
    fn from_iter<I: IntoIterator<Item = Vec3A>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |bbox, point| bbox.add_point(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_with_empty_is_identity() {
        let bbox = BoundingBox::new(Vec3A::new(1.0, -2.0, 3.0), Vec3A::new(-1.0, 2.0, 0.0));
        assert_eq!(BoundingBox::empty().union(bbox), bbox);
        assert_eq!(bbox.min, Vec3A::new(-1.0, -2.0, 0.0));
    }

    #[test]
    fn inflate_only_touches_thin_axes() {
        let bbox = BoundingBox::new(Vec3A::ZERO, Vec3A::new(1.0, 0.005, 0.0));
        let inflated = bbox.inflate(0.01);

        assert_eq!(inflated.min.x, 0.0);
        assert_eq!(inflated.max.x, 1.0);
        assert_eq!(inflated.min.y, -0.01);
        assert!((inflated.max.y - 0.015).abs() < 1e-6);
        assert_eq!(inflated.diagonal().z, 0.02);
    }

    #[test]
    fn longest_axis_tie_prefers_earlier_axis() {
        let cube = BoundingBox::new(Vec3A::ZERO, Vec3A::ONE);
        assert_eq!(cube.longest_axis(), 0);

        let yz = BoundingBox::new(Vec3A::ZERO, Vec3A::new(0.5, 1.0, 1.0));
        assert_eq!(yz.longest_axis(), 1);

        let z = BoundingBox::new(Vec3A::ZERO, Vec3A::new(0.5, 1.0, 2.0));
        assert_eq!(z.longest_axis(), 2);
    }

    #[test]
    fn collect_points() {
        let bbox: BoundingBox = [Vec3A::X, Vec3A::Y, -Vec3A::Z].into_iter().collect();
        assert_eq!(bbox.min, Vec3A::new(0.0, 0.0, -1.0));
        assert_eq!(bbox.max, Vec3A::new(1.0, 1.0, 0.0));
        assert!(bbox.inside(Vec3A::splat(0.25) * Vec3A::new(1.0, 1.0, -1.0)));
        assert!(!bbox.inside(Vec3A::splat(2.0)));
    }
}
