//! Scene primitives: triangles and the materials they reference

use glam::{Vec2, Vec3A};

use crate::{bounds::BoundingBox, import::ImportedMaterial};

/// A single triangle with per-vertex normals and texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub positions: [Vec3A; 3],
    pub normals: [Vec3A; 3],
    pub uvs: [Vec2; 3],
    /// Global index into the scene's material arena
    pub material: u32,
}

impl Triangle {
    /// Returns the mean of the three vertex positions.
    pub fn centroid(&self) -> Vec3A {
        let [p0, p1, p2] = self.positions;
        (p0 + p1 + p2) / 3.0
    }

    /// Returns the tight box around the three vertex positions.
    pub fn bounds(&self) -> BoundingBox {
        self.positions.into_iter().collect()
    }
}

/// Surface description consumed by the shading program.
///
/// Texture slots hold [Material::NO_TEXTURE] unless a texture is bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub diffuse: Vec3A,
    pub diffuse_texture: i32,
    pub emission: Vec3A,
    pub emission_texture: i32,
    pub roughness: f32,
    pub metalness: f32,
    /// `1 - opacity`
    pub transparency: f32,
    /// Index of refraction
    pub ior: f32,
}

impl Material {
    pub const NO_TEXTURE: i32 = -1;

    pub const DEFAULT_ROUGHNESS: f32 = 0.9;
    pub const DEFAULT_METALNESS: f32 = 0.1;
    pub const DEFAULT_OPACITY: f32 = 0.0;
    pub const DEFAULT_IOR: f32 = 1.5;
}

impl Default for Material {
    fn default() -> Self {
        Self::from(ImportedMaterial::default())
    }
}

impl From<ImportedMaterial> for Material {
    /// Fills every property the source left out with the crate defaults.
    fn from(source: ImportedMaterial) -> Self {
        let opacity = source.opacity.unwrap_or(Self::DEFAULT_OPACITY);
        Self {
            diffuse: source.diffuse.unwrap_or(Vec3A::ZERO),
            diffuse_texture: Self::NO_TEXTURE,
            emission: source.emission.unwrap_or(Vec3A::ZERO),
            emission_texture: Self::NO_TEXTURE,
            roughness: source.roughness.unwrap_or(Self::DEFAULT_ROUGHNESS),
            metalness: source.metalness.unwrap_or(Self::DEFAULT_METALNESS),
            transparency: 1.0 - opacity,
            ior: source.ior.unwrap_or(Self::DEFAULT_IOR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_material() {
        let mat = Material::default();
        assert_eq!(mat.diffuse, Vec3A::ZERO);
        assert_eq!(mat.emission, Vec3A::ZERO);
        assert_eq!(mat.diffuse_texture, -1);
        assert_eq!(mat.emission_texture, -1);
        assert_eq!(mat.roughness, 0.9);
        assert_eq!(mat.metalness, 0.1);
        assert_eq!(mat.transparency, 1.0);
        assert_eq!(mat.ior, 1.5);
    }

    #[test]
    fn opacity_becomes_transparency() {
        let mat = Material::from(ImportedMaterial {
            diffuse: Some(Vec3A::new(1.0, 0.5, 0.25)),
            opacity: Some(1.0),
            ..Default::default()
        });
        assert_eq!(mat.transparency, 0.0);
        assert_eq!(mat.diffuse, Vec3A::new(1.0, 0.5, 0.25));
        assert_eq!(mat.roughness, Material::DEFAULT_ROUGHNESS);
    }

    #[test]
    fn triangle_centroid_and_bounds() {
        let tri = Triangle {
            positions: [Vec3A::ZERO, Vec3A::new(3.0, 0.0, 0.0), Vec3A::new(0.0, 3.0, -3.0)],
            normals: [Vec3A::Z; 3],
            uvs: [Vec2::ZERO; 3],
            material: 0,
        };
        assert_eq!(tri.centroid(), Vec3A::new(1.0, 1.0, -1.0));

        let bbox = tri.bounds();
        assert_eq!(bbox.min, Vec3A::new(0.0, 0.0, -3.0));
        assert_eq!(bbox.max, Vec3A::new(3.0, 3.0, 0.0));
    }
}
