//! Face assembly shared by the file format readers

use std::collections::HashMap;

use glam::{Vec2, Vec3A};

use super::{ImportedFace, PostProcess};

/// One triangulated primitive, still indexing into its source vertex arrays.
pub(super) struct IndexedPrimitive<'a> {
    pub positions: &'a [Vec3A],
    /// `None` when the source stores no normals
    pub normals: Option<&'a [Vec3A]>,
    /// Empty when the source stores no texture coordinates
    pub uvs: &'a [Vec2],
    pub corners: Vec<[usize; 3]>,
    pub material: u32,
}

impl IndexedPrimitive<'_> {
    /// Appends one face per corner triple to `faces`, applying `flags`.
    ///
    /// Callers have checked every corner against the vertex arrays.
    pub fn push_faces(mut self, flags: PostProcess, faces: &mut Vec<ImportedFace>) {
        if flags.contains(PostProcess::FLIP_WINDING) {
            self.corners.iter_mut().for_each(|tri| tri.swap(1, 2));
        }

        let smooth = match self.normals {
            None if flags.contains(PostProcess::GEN_SMOOTH_NORMALS) => Some(smooth_normals(
                self.positions,
                &self.corners,
                flags.contains(PostProcess::JOIN_IDENTICAL_VERTICES),
            )),
            _ => None,
        };

        faces.reserve(self.corners.len());
        for tri in &self.corners {
            let positions = tri.map(|i| self.positions[i]);
            let normals = match (self.normals, &smooth) {
                (Some(source), _) => tri.map(|i| source[i]),
                (None, Some(smooth)) => tri.map(|i| smooth[i]),
                (None, None) if flags.contains(PostProcess::GEN_NORMALS) => {
                    [face_normal(positions); 3]
                }
                (None, None) => [Vec3A::ZERO; 3],
            };
            let mut uvs = match self.uvs {
                [] => [Vec2::ZERO; 3],
                uvs => tri.map(|i| uvs[i]),
            };
            if flags.contains(PostProcess::FLIP_UVS) {
                uvs.iter_mut().for_each(|uv| uv.y = 1.0 - uv.y);
            }

            faces.push(ImportedFace {
                positions,
                normals,
                uvs,
                material: self.material,
            });
        }
    }
}

fn face_normal([p0, p1, p2]: [Vec3A; 3]) -> Vec3A {
    (p1 - p0).cross(p2 - p0).normalize_or_zero()
}

/// Area-weighted vertex normals.
///
/// With `join` set, vertices sharing a position share a normal even when the
/// source stores them separately.
fn smooth_normals(positions: &[Vec3A], corners: &[[usize; 3]], join: bool) -> Vec<Vec3A> {
    let welded: Vec<usize> = if join {
        let mut first_seen = HashMap::new();
        positions
            .iter()
            .enumerate()
            .map(|(i, p)| *first_seen.entry(p.to_array().map(f32::to_bits)).or_insert(i))
            .collect()
    } else {
        (0..positions.len()).collect()
    };

    let mut sums = vec![Vec3A::ZERO; positions.len()];
    for tri in corners {
        let [p0, p1, p2] = tri.map(|i| positions[i]);
        let weighted = (p1 - p0).cross(p2 - p0);
        for &i in tri {
            sums[welded[i]] += weighted;
        }
    }

    welded.iter().map(|&w| sums[w].normalize_or_zero()).collect()
}
