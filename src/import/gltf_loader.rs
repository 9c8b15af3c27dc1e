//! glTF 2.0 (`.gltf` / `.glb`) ingestion through the [gltf] crate

use std::path::Path;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec3A};
use gltf::mesh::Mode;
use log::debug;

use super::{
    faces::IndexedPrimitive, ImportError, ImportedMaterial, ImportedMesh, Importer, PostProcess,
};

/// Reads glTF documents, flattening the default scene's node hierarchy into world space.
///
/// Only the document and its buffers are read. Images are never opened, so a
/// missing or undecodable texture does not fail the load.
///
/// Primitives without a material share one synthesized material whose
/// properties are all left unset, placed after the document's own materials.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfImporter;

impl Importer for GltfImporter {
    fn import(&self, path: &Path, flags: PostProcess) -> Result<ImportedMesh, ImportError> {
        let gltf::Gltf { document, blob } =
            gltf::Gltf::open(path).map_err(|e| ImportError::new(path, e))?;
        let buffers = gltf::import_buffers(&document, path.parent(), blob)
            .map_err(|e| ImportError::new(path, e))?;

        let mut loader = Loader {
            path,
            flags,
            buffers: &buffers,
            mesh: ImportedMesh {
                faces: Vec::new(),
                materials: document.materials().map(imported_material).collect(),
            },
            default_material: None,
        };

        match document.default_scene().or_else(|| document.scenes().next()) {
            Some(scene) => {
                for node in scene.nodes() {
                    loader.visit(&node, Mat4::IDENTITY)?;
                }
            }
            // a document without scenes still carries meshes worth loading
            None => {
                for mesh in document.meshes() {
                    loader.add_mesh(&mesh, Mat4::IDENTITY)?;
                }
            }
        }

        debug!(
            "read {} faces and {} materials from {}",
            loader.mesh.faces.len(),
            loader.mesh.materials.len(),
            path.display()
        );
        Ok(loader.mesh)
    }
}

fn imported_material(material: gltf::Material) -> ImportedMaterial {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, alpha] = pbr.base_color_factor();
    ImportedMaterial {
        diffuse: Some(Vec3A::new(r, g, b)),
        emission: Some(Vec3A::from(material.emissive_factor())),
        roughness: Some(pbr.roughness_factor()),
        metalness: Some(pbr.metallic_factor()),
        opacity: Some(alpha),
        ior: material.ior(),
    }
}

/// Accumulates faces while walking the node hierarchy
struct Loader<'a> {
    path: &'a Path,
    flags: PostProcess,
    buffers: &'a [gltf::buffer::Data],
    mesh: ImportedMesh,
    default_material: Option<u32>,
}

impl Loader<'_> {
    fn visit(&mut self, node: &gltf::Node, parent: Mat4) -> Result<(), ImportError> {
        let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
        if let Some(mesh) = node.mesh() {
            self.add_mesh(&mesh, world)?;
        }
        for child in node.children() {
            self.visit(&child, world)?;
        }
        Ok(())
    }

    fn default_material(&mut self) -> u32 {
        let materials = &mut self.mesh.materials;
        *self.default_material.get_or_insert_with(|| {
            materials.push(ImportedMaterial::default());
            (materials.len() - 1) as u32
        })
    }

    fn add_mesh(&mut self, mesh: &gltf::Mesh, world: Mat4) -> Result<(), ImportError> {
        let normal_matrix = normal_matrix(world);
        let buffers = self.buffers;

        for primitive in mesh.primitives() {
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
            let context = format!("mesh {} primitive {}", mesh.index(), primitive.index());

            let Some(positions) = reader.read_positions() else {
                debug!("skipping {context}: no POSITION attribute");
                continue;
            };
            let positions: Vec<Vec3A> = positions
                .map(|p| world.transform_point3a(Vec3A::from(p)))
                .collect();
            let vertex_count = positions.len();

            let normals: Option<Vec<Vec3A>> = reader.read_normals().map(|normals| {
                normals
                    .map(|n| Vec3A::from(normal_matrix * Vec3::from(n)).normalize_or_zero())
                    .collect()
            });
            let uvs: Vec<Vec2> = reader
                .read_tex_coords(0)
                .map(|coords| coords.into_f32().map(Vec2::from).collect())
                .unwrap_or_default();
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..vertex_count as u32).collect(),
            };

            if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(ImportError::new(
                    self.path,
                    format!("{context} references vertex {bad} but has {vertex_count}"),
                ));
            }
            if (!uvs.is_empty() && uvs.len() != vertex_count)
                || normals.as_ref().is_some_and(|n| n.len() != vertex_count)
            {
                return Err(ImportError::new(
                    self.path,
                    format!("{context} has attributes of differing lengths"),
                ));
            }

            let Some(corners) = triangulate(primitive.mode(), &indices) else {
                debug!("skipping {context}: {:?} is not a surface", primitive.mode());
                continue;
            };
            let material = match primitive.material().index() {
                Some(index) => index as u32,
                None => self.default_material(),
            };

            IndexedPrimitive {
                positions: &positions,
                normals: normals.as_deref(),
                uvs: &uvs,
                corners,
                material,
            }
            .push_faces(self.flags, &mut self.mesh.faces);
        }

        Ok(())
    }
}

/// Inverse-transpose of the upper 3x3 block, or the block itself when singular.
fn normal_matrix(world: Mat4) -> Mat3 {
    let linear = Mat3::from_mat4(world);
    if linear.determinant().abs() > f32::EPSILON {
        linear.inverse().transpose()
    } else {
        linear
    }
}

/// Splits an index stream into triangles according to its topology.
///
/// Returns `None` for point and line topologies.
fn triangulate(mode: Mode, indices: &[u32]) -> Option<Vec<[usize; 3]>> {
    let at = |i: usize| indices[i] as usize;
    let corners = match mode {
        Mode::Triangles => indices
            .chunks_exact(3)
            .map(|c| [c[0] as usize, c[1] as usize, c[2] as usize])
            .collect(),
        Mode::TriangleStrip => (0..indices.len().saturating_sub(2))
            .map(|i| {
                // every other triangle is reversed to keep a consistent winding
                if i % 2 == 0 {
                    [at(i), at(i + 1), at(i + 2)]
                } else {
                    [at(i + 1), at(i), at(i + 2)]
                }
            })
            // strips use repeated indices to restart
            .filter(|[a, b, c]| a != b && b != c && a != c)
            .collect(),
        Mode::TriangleFan => (1..indices.len().saturating_sub(1))
            .map(|i| [at(0), at(i), at(i + 1)])
            .collect(),
        Mode::Points | Mode::Lines | Mode::LineLoop | Mode::LineStrip => return None,
    };
    Some(corners)
}
