//! Placed instances of a loaded mesh

use glam::{Mat3, Mat4, Vec3};

use crate::{bvh::NodeIndex, utils::arena::ArenaIndex};

/// Index of a [Model] in the scene's model arena.
pub type ModelIndex = ArenaIndex;

/// A loaded mesh placed in the world.
///
/// The inverse and normal transforms are derived from the world transform and
/// only change through [Model::set_transform], so the three never disagree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Model {
    root: NodeIndex,
    transform: Mat4,
    inverse_transform: Mat4,
    normal_transform: Mat3,
}

impl Model {
    /// Creates a model at the origin whose geometry starts at BVH node `root`.
    pub fn new(root: NodeIndex) -> Self {
        Self {
            root,
            transform: Mat4::IDENTITY,
            inverse_transform: Mat4::IDENTITY,
            normal_transform: Mat3::IDENTITY,
        }
    }

    /// Rebuilds a model from already-derived matrices, as read back from a GPU buffer.
    pub(crate) fn from_raw_parts(
        root: NodeIndex,
        transform: Mat4,
        inverse_transform: Mat4,
        normal_transform: Mat3,
    ) -> Self {
        Self {
            root,
            transform,
            inverse_transform,
            normal_transform,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn inverse_transform(&self) -> Mat4 {
        self.inverse_transform
    }

    /// Inverse-transpose of the upper 3x3 block of the world transform.
    pub fn normal_transform(&self) -> Mat3 {
        self.normal_transform
    }

    /// Replaces the world transform and recomputes its inverse and normal transform.
    ///
    /// # Panics
    ///
    /// With debug assertions enabled, panics if `transform` is not invertible.
    pub fn set_transform(&mut self, transform: Mat4) -> &mut Self {
        let inverse_transform = transform.inverse();
        self.transform = transform;
        self.inverse_transform = inverse_transform;
        self.normal_transform = Mat3::from_mat4(inverse_transform).transpose();
        self
    }

    // builders

    /// Adds a scaling factor to the existing transform
    pub fn with_scale(&mut self, scale: Vec3) -> &mut Self {
        self.set_transform(Mat4::from_scale(scale) * self.transform)
    }

    /// Adds a rotation based on the axis and angle (in radians) to the existing transform
    pub fn with_axis_angle_radians(&mut self, axis: Vec3, radians: f32) -> &mut Self {
        self.set_transform(Mat4::from_axis_angle(axis.normalize(), radians) * self.transform)
    }

    /// Adds a rotation based on the axis and angle (in degrees) to the existing transform
    pub fn with_axis_angle_degrees(&mut self, axis: Vec3, degrees: f32) -> &mut Self {
        self.with_axis_angle_radians(axis, degrees.to_radians())
    }

    /// Adds a translation to the existing transform
    pub fn with_translation(&mut self, translation: Vec3) -> &mut Self {
        self.set_transform(Mat4::from_translation(translation) * self.transform)
    }
}
