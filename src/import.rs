//! Mesh ingestion
//!
//! An [Importer] turns a file on disk into an [ImportedMesh]: a flat list of
//! triangulated faces plus the materials they point at. Indices on both sides
//! are local to the file; the scene rebases them when it appends the mesh.

use std::path::{Path, PathBuf};

use bitflags::bitflags;
use glam::{Vec2, Vec3A};

mod faces;
mod gltf_loader;
mod obj_loader;

pub use gltf_loader::GltfImporter;
pub use obj_loader::ObjImporter;

bitflags! {
    /// Postprocessing steps requested from an [Importer].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PostProcess: u32 {
        /// Split strips and fans into independent triangles.
        const TRIANGULATE = 1 << 0;
        /// Treat vertices with identical positions as one when deriving normals.
        const JOIN_IDENTICAL_VERTICES = 1 << 1;
        /// Generate flat face normals where the source has none.
        ///
        /// Without this or [PostProcess::GEN_SMOOTH_NORMALS] such faces keep zero normals.
        const GEN_NORMALS = 1 << 2;
        /// Generate smooth vertex normals where the source has none.
        const GEN_SMOOTH_NORMALS = 1 << 3;
        /// Replace every texture coordinate `v` with `1 - v`.
        const FLIP_UVS = 1 << 4;
        /// Swap the second and third corner of every face.
        const FLIP_WINDING = 1 << 5;

        /// Steps the scene always requests on top of the caller's flags.
        const REQUIRED = Self::TRIANGULATE.bits() | Self::JOIN_IDENTICAL_VERTICES.bits();
    }
}

/// Failure to open or parse a mesh file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to load model from {}: {message}", .path.display())]
pub struct ImportError {
    pub path: PathBuf,
    /// Diagnostic from the underlying parser
    pub message: String,
}

impl ImportError {
    pub fn new(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Material properties as found in the source file; `None` where the source is silent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImportedMaterial {
    pub diffuse: Option<Vec3A>,
    pub emission: Option<Vec3A>,
    pub roughness: Option<f32>,
    pub metalness: Option<f32>,
    pub opacity: Option<f32>,
    pub ior: Option<f32>,
}

/// A triangle as read from the source, with a file-local material index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportedFace {
    pub positions: [Vec3A; 3],
    /// Zero when the source has none and no normal generation was requested
    pub normals: [Vec3A; 3],
    /// Zero when the source has no texture coordinates
    pub uvs: [Vec2; 3],
    pub material: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMesh {
    pub faces: Vec<ImportedFace>,
    pub materials: Vec<ImportedMaterial>,
}

impl ImportedMesh {
    /// Checks that every face references a material of this mesh.
    pub fn validate(&self, path: &Path) -> Result<(), ImportError> {
        let material_count = self.materials.len();
        match self
            .faces
            .iter()
            .position(|face| face.material as usize >= material_count)
        {
            Some(face) => Err(ImportError::new(
                path,
                format!(
                    "face {face} references material {} but only {material_count} exist",
                    self.faces[face].material
                ),
            )),
            None => Ok(()),
        }
    }
}

/// Source of triangle meshes.
pub trait Importer {
    /// Reads the mesh at `path`, applying the requested postprocessing.
    ///
    /// On failure nothing is returned; there are no partial results.
    fn import(&self, path: &Path, flags: PostProcess) -> Result<ImportedMesh, ImportError>;
}

/// Mesh file formats, recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    /// `.gltf` and `.glb`
    Gltf,
    /// `.obj` with optional `.mtl` libraries
    Obj,
}

impl MeshFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "gltf" | "glb" => Some(Self::Gltf),
            "obj" => Some(Self::Obj),
            _ => None,
        }
    }
}

impl Importer for MeshFormat {
    fn import(&self, path: &Path, flags: PostProcess) -> Result<ImportedMesh, ImportError> {
        match self {
            Self::Gltf => GltfImporter.import(path, flags),
            Self::Obj => ObjImporter.import(path, flags),
        }
    }
}
