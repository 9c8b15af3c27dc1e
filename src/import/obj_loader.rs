//! Wavefront `.obj` / `.mtl` ingestion through the [tobj] crate

use std::path::Path;

use glam::{Vec2, Vec3A};
use log::{debug, warn};

use super::{
    faces::IndexedPrimitive, ImportError, ImportedMaterial, ImportedMesh, Importer, PostProcess,
};

/// Reads OBJ files and the MTL libraries they reference.
///
/// Polygons are fan-triangulated and every object is indexed with a single
/// index per vertex. Faces without a usable material share one synthesized
/// material placed after the library's own materials. A missing or broken
/// material library is logged and loading continues with that fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjImporter;

impl Importer for ObjImporter {
    fn import(&self, path: &Path, flags: PostProcess) -> Result<ImportedMesh, ImportError> {
        let options = tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        };
        let (models, materials) =
            tobj::load_obj(path, &options).map_err(|e| ImportError::new(path, e))?;

        let mut materials: Vec<ImportedMaterial> = match materials {
            Ok(materials) => materials.iter().map(imported_material).collect(),
            Err(why) => {
                warn!("{}: no materials loaded ({why})", path.display());
                Vec::new()
            }
        };
        let library_len = materials.len();
        let mut default_material = None;

        let mut faces = Vec::new();
        for model in &models {
            let mesh = &model.mesh;
            let positions: Vec<Vec3A> = mesh.positions.chunks_exact(3).map(Vec3A::from_slice).collect();
            let normals: Vec<Vec3A> = mesh.normals.chunks_exact(3).map(Vec3A::from_slice).collect();
            let uvs: Vec<Vec2> = mesh.texcoords.chunks_exact(2).map(Vec2::from_slice).collect();
            let vertex_count = positions.len();

            if (!normals.is_empty() && normals.len() != vertex_count)
                || (!uvs.is_empty() && uvs.len() != vertex_count)
            {
                return Err(ImportError::new(
                    path,
                    format!("object {:?} has attributes of differing lengths", model.name),
                ));
            }
            if let Some(bad) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(ImportError::new(
                    path,
                    format!("object {:?} references vertex {bad} but has {vertex_count}", model.name),
                ));
            }

            let material = match mesh.material_id.filter(|&id| id < library_len) {
                Some(id) => id as u32,
                None => *default_material.get_or_insert_with(|| {
                    materials.push(ImportedMaterial::default());
                    (materials.len() - 1) as u32
                }),
            };

            IndexedPrimitive {
                positions: &positions,
                normals: (!normals.is_empty()).then_some(normals.as_slice()),
                uvs: &uvs,
                corners: mesh
                    .indices
                    .chunks_exact(3)
                    .map(|c| [c[0] as usize, c[1] as usize, c[2] as usize])
                    .collect(),
                material,
            }
            .push_faces(flags, &mut faces);
        }

        debug!(
            "read {} faces and {} materials from {}",
            faces.len(),
            materials.len(),
            path.display()
        );
        Ok(ImportedMesh { faces, materials })
    }
}

/// Maps MTL statements onto material properties.
///
/// `Kd`, `d` and `Ni` are parsed by [tobj]; `Ke`, `Tr` and the PBR extension
/// statements `Pr` / `Pm` arrive as unknown parameters.
fn imported_material(material: &tobj::Material) -> ImportedMaterial {
    let param = |key: &str| material.unknown_param.get(key).map(String::as_str);
    let scalar = |key: &str| param(key).and_then(|v| v.trim().parse::<f32>().ok());

    let opacity = material
        .dissolve
        .or_else(|| scalar("Tr").map(|transparency| 1.0 - transparency));

    ImportedMaterial {
        diffuse: material.diffuse.map(Vec3A::from),
        emission: param("Ke").and_then(parse_color),
        roughness: scalar("Pr"),
        metalness: scalar("Pm"),
        opacity,
        ior: material.optical_density,
    }
}

/// Parses `r g b`, or a single value repeated on all channels.
fn parse_color(value: &str) -> Option<Vec3A> {
    let channels = value
        .split_whitespace()
        .map(str::parse::<f32>)
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    match channels.as_slice() {
        &[r, g, b] => Some(Vec3A::new(r, g, b)),
        &[v] => Some(Vec3A::splat(v)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mtl_colors() {
        assert_eq!(parse_color("1 0.5 0"), Some(Vec3A::new(1.0, 0.5, 0.0)));
        assert_eq!(parse_color(" 2 "), Some(Vec3A::splat(2.0)));
        assert_eq!(parse_color("1 2"), None);
        assert_eq!(parse_color("spectral file.rfl"), None);
    }

    #[test]
    fn mtl_statements_map_to_properties() {
        let mut material = tobj::Material {
            diffuse: Some([0.8, 0.1, 0.1]),
            optical_density: Some(1.33),
            ..Default::default()
        };
        for (key, value) in [("Ke", "0 0 4"), ("Pr", "0.25"), ("Pm", "1"), ("Tr", "0.4")] {
            material.unknown_param.insert(key.to_string(), value.to_string());
        }

        let imported = imported_material(&material);
        assert_eq!(imported.diffuse, Some(Vec3A::new(0.8, 0.1, 0.1)));
        assert_eq!(imported.emission, Some(Vec3A::new(0.0, 0.0, 4.0)));
        assert_eq!(imported.roughness, Some(0.25));
        assert_eq!(imported.metalness, Some(1.0));
        assert_eq!(imported.ior, Some(1.33));
        assert!((imported.opacity.unwrap() - 0.6).abs() < 1e-6);

        material.dissolve = Some(0.9);
        assert_eq!(imported_material(&material).opacity, Some(0.9));
    }

    #[test]
    fn silent_mtl_leaves_everything_unset() {
        let imported = imported_material(&tobj::Material::default());
        assert_eq!(imported, ImportedMaterial::default());
    }
}
