//! Structural guarantees of BVH builds over random triangle soups

use std::path::Path;

use glam::{Vec2, Vec3, Vec3A};
use prism::{
    bvh::{self, BvhBuilder, BvhNode, NodeKind, DEFAULT_DEPTH_BUDGET},
    geometry::Triangle,
    import::{ImportError, ImportedFace, ImportedMaterial, ImportedMesh, Importer, PostProcess},
    scene::{BuildConfig, Scene},
    Arena,
};
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn random_point(rng: &mut impl Rng, spread: Vec3) -> Vec3A {
    Vec3A::from(rng.gen::<Vec3>() * spread)
}

fn soup(count: usize, spread: Vec3, rng: &mut impl Rng) -> Vec<ImportedFace> {
    (0..count)
        .map(|_| {
            let base = random_point(rng, spread);
            ImportedFace {
                positions: [
                    base,
                    base + random_point(rng, Vec3::splat(0.1)),
                    base + random_point(rng, Vec3::splat(0.1)),
                ],
                normals: [Vec3A::Y; 3],
                uvs: [Vec2::ZERO; 3],
                material: rng.gen_range(0..3),
            }
        })
        .collect()
}

/// Generates a fresh soup per path; the file name encodes the triangle count
struct SoupImporter;

impl Importer for SoupImporter {
    fn import(&self, path: &Path, _flags: PostProcess) -> Result<ImportedMesh, ImportError> {
        let count: usize = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ImportError::new(path, "not a soup"))?;
        let mut rng = SmallRng::seed_from_u64(count as u64);
        Ok(ImportedMesh {
            faces: soup(count, Vec3::new(10.0, 3.0, 1.0), &mut rng),
            materials: vec![ImportedMaterial::default(); 3],
        })
    }
}

fn ceil_log2(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}

fn subtree_len(nodes: &[BvhNode], root: usize) -> usize {
    bvh::walk(nodes, root).count()
}

fn check_partition(nodes: &[BvhNode], root: usize, range: std::ops::Range<usize>) {
    let mut next = range.start;
    for leaf in bvh::leaf_ranges(nodes, root) {
        assert!(!leaf.is_empty(), "empty leaf {leaf:?}");
        assert_eq!(leaf.start, next, "gap or overlap at {leaf:?}");
        next = leaf.end;
    }
    assert_eq!(next, range.end, "leaves do not cover {range:?}");
}

fn check_bounds(nodes: &[BvhNode], root: usize, triangles: &[Triangle]) {
    for (idx, _) in bvh::walk(nodes, root) {
        let node = &nodes[idx];
        for i in bvh::leaf_ranges(nodes, idx).into_iter().flatten() {
            for p in triangles[i].positions {
                assert!(node.bounds.inside(p), "triangle {i} escapes node {idx}");
            }
        }
        if let NodeKind::Interior { left, right } = node.kind {
            assert!(left > idx && right > idx, "child precedes parent at node {idx}");
        }
    }
}

#[test]
fn random_builds_hold_structural_guarantees() {
    let mut rng = SmallRng::seed_from_u64(7);
    for count in [1, 2, 3, 5, 16, 17, 100, 1000] {
        for budget in [0, 1, 4, DEFAULT_DEPTH_BUDGET] {
            let mut triangles: Vec<Triangle> = soup(count, Vec3::splat(5.0), &mut rng)
                .into_iter()
                .map(|f| Triangle {
                    positions: f.positions,
                    normals: f.normals,
                    uvs: f.uvs,
                    material: f.material,
                })
                .collect();
            let mut nodes = Arena::new();
            let root = BvhBuilder::new(&mut triangles, &mut nodes).build(0..count, budget);
            let nodes = nodes.as_slice();

            check_partition(nodes, root, 0..count);
            check_bounds(nodes, root, &triangles);

            let len = subtree_len(nodes, root);
            assert!((1..=2 * count - 1).contains(&len), "{len} nodes for {count} triangles");
            let depth = bvh::depth(nodes, root);
            assert!(
                depth <= (budget as usize).min(ceil_log2(count)),
                "depth {depth} for {count} triangles with budget {budget}"
            );
        }
    }
}

#[test]
fn scene_loads_are_append_only() {
    let mut scene = Scene::with_config(BuildConfig { depth_budget: 12 });
    let mut snapshots = Vec::new();

    for count in [40, 1, 300, 7] {
        let index = scene
            .load_model_with(&SoupImporter, format!("{count}.soup"), PostProcess::empty())
            .unwrap();
        snapshots.push(scene.clone());

        let root = scene.model(index).unwrap().root();
        let first = scene.triangles().len() - count;
        check_partition(scene.nodes(), root, first..scene.triangles().len());
        check_bounds(scene.nodes(), root, scene.triangles());
        assert!(subtree_len(scene.nodes(), root) <= 2 * count - 1);
    }

    // every earlier snapshot is a prefix of the final scene
    for earlier in &snapshots {
        let t = earlier.triangles().len();
        let n = earlier.nodes().len();
        let m = earlier.materials().len();
        assert_eq!(&scene.triangles()[..t], earlier.triangles());
        assert_eq!(&scene.nodes()[..n], earlier.nodes());
        assert_eq!(&scene.materials()[..m], earlier.materials());
        assert_eq!(&scene.models()[..earlier.models().len()], earlier.models());
    }

    // material references stay inside each model's own block of three
    for (model, range) in [(0, 0..40), (1, 40..41), (2, 41..341), (3, 341..348)] {
        let base = 3 * model as u32;
        assert!(scene.triangles()[range]
            .iter()
            .all(|t| (base..base + 3).contains(&t.material)));
    }
}

#[test]
fn encoded_scene_reads_back_bit_exact() {
    let mut scene = Scene::new();
    scene
        .load_model_with(&SoupImporter, "250.soup", PostProcess::empty())
        .unwrap();
    scene
        .load_model_with(&SoupImporter, "3.soup", PostProcess::empty())
        .unwrap();
    scene
        .last_model_mut()
        .unwrap()
        .with_scale(Vec3::splat(0.2))
        .with_axis_angle_degrees(Vec3::Y, -45.0)
        .with_translation(Vec3::new(0.5, -1.0, 0.0));

    let buffers = scene.encode();
    let bits = |v: Vec3A| v.to_array().map(f32::to_bits);

    for (read, original) in buffers.decode_triangles().iter().zip(scene.triangles()) {
        assert_eq!(read.positions.map(bits), original.positions.map(bits));
        assert_eq!(read.normals.map(bits), original.normals.map(bits));
        assert_eq!(read.material, original.material);
    }
    assert_eq!(buffers.decode_materials(), scene.materials());
    assert_eq!(buffers.decode_models(), scene.models());
    assert_eq!(buffers.decode_bvh_nodes(), scene.nodes());
    assert_eq!(buffers.triangles.len(), 253 * 128);
}
