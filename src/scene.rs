//! The scene: every triangle, material, model and BVH node, in append-only arenas

use std::path::Path;

use log::info;

use crate::{
    bvh::{self, BvhBuilder, BvhNode, DEFAULT_DEPTH_BUDGET},
    geometry::{Material, Triangle},
    gpu::{self, Binding, BufferTarget, GpuBvhNode, GpuMaterial, GpuModel, GpuTriangle, SceneBuffers},
    import::{ImportError, ImportedMesh, Importer, MeshFormat, PostProcess},
    model::{Model, ModelIndex},
    utils::arena::Arena,
};

/// Settings applied to every model load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildConfig {
    /// Maximum BVH recursion depth per model
    pub depth_budget: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            depth_budget: DEFAULT_DEPTH_BUDGET,
        }
    }
}

/// Summary of a scene's contents, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub triangles: usize,
    pub materials: usize,
    pub models: usize,
    pub nodes: usize,
    /// Largest number of triangles in a single leaf
    pub max_leaf_size: usize,
    /// Deepest leaf across all models
    pub max_depth: usize,
}

impl std::fmt::Display for SceneStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} models, {} triangles, {} materials, {} BVH nodes (depth {}, largest leaf {})",
            self.models, self.triangles, self.materials, self.nodes, self.max_depth, self.max_leaf_size
        )
    }
}

/// Owns the scene arrays and the rules for growing them.
///
/// Arrays only ever grow. Loading a model appends its materials, triangles and
/// BVH nodes and records a [Model] pointing at the new subtree; nothing already
/// committed changes value or index.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    triangles: Arena<Triangle>,
    materials: Arena<Material>,
    models: Arena<Model>,
    nodes: Arena<BvhNode>,
    config: BuildConfig,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BuildConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Loads a glTF or OBJ file as a new model at the origin.
    ///
    /// The format follows the file extension. See [Scene::load_model_with].
    pub fn load_model(
        &mut self,
        path: impl AsRef<Path>,
        flags: PostProcess,
    ) -> Result<ModelIndex, ImportError> {
        let path = path.as_ref();
        let format = MeshFormat::from_path(path).ok_or_else(|| {
            ImportError::new(path, "unsupported file type, expected .gltf, .glb or .obj")
        })?;
        self.load_model_with(&format, path, flags)
    }

    /// Loads a mesh through `importer` as a new model at the origin.
    ///
    /// [PostProcess::REQUIRED] is always added to `flags`. On error the scene is
    /// left exactly as it was, so it stays usable for further loads.
    pub fn load_model_with(
        &mut self,
        importer: &impl Importer,
        path: impl AsRef<Path>,
        flags: PostProcess,
    ) -> Result<ModelIndex, ImportError> {
        let path = path.as_ref();
        let mesh = importer.import(path, flags | PostProcess::REQUIRED)?;
        if mesh.faces.is_empty() {
            return Err(ImportError::new(path, "no triangles found"));
        }
        mesh.validate(path)?;

        let index = self.add_mesh(mesh);
        info!(
            "loaded model {index} from {}: {} triangles",
            path.display(),
            self.triangles_of(index).len()
        );
        Ok(index)
    }

    /// Appends a validated, non-empty mesh.
    fn add_mesh(&mut self, mesh: ImportedMesh) -> ModelIndex {
        let material_base = self.materials.len() as u32;
        self.materials
            .extend(mesh.materials.into_iter().map(Material::from));

        let range = self
            .triangles
            .extend(mesh.faces.into_iter().map(|face| Triangle {
                positions: face.positions,
                normals: face.normals,
                uvs: face.uvs,
                material: material_base + face.material,
            }));

        let root = BvhBuilder::new(self.triangles.as_mut_slice(), &mut self.nodes)
            .build(range, self.config.depth_budget);
        self.models.add(Model::new(root))
    }

    pub fn model(&self, index: ModelIndex) -> Option<&Model> {
        self.models.get(index)
    }

    /// Mutable access for repositioning a model after loading.
    pub fn model_mut(&mut self, index: ModelIndex) -> Option<&mut Model> {
        self.models.get_mut(index)
    }

    pub fn last_model_mut(&mut self) -> Option<&mut Model> {
        self.models.last_mut()
    }

    pub fn triangles(&self) -> &[Triangle] {
        self.triangles.as_slice()
    }

    pub fn materials(&self) -> &[Material] {
        self.materials.as_slice()
    }

    pub fn models(&self) -> &[Model] {
        self.models.as_slice()
    }

    pub fn nodes(&self) -> &[BvhNode] {
        self.nodes.as_slice()
    }

    /// Returns the triangles owned by a model, in BVH order.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a model of this scene.
    pub fn triangles_of(&self, index: ModelIndex) -> &[Triangle] {
        let ranges = bvh::leaf_ranges(self.nodes(), self.models[index].root());
        let start = ranges.first().map_or(0, |r| r.start);
        let end = ranges.last().map_or(0, |r| r.end);
        &self.triangles()[start..end]
    }

    pub fn stats(&self) -> SceneStats {
        let mut stats = SceneStats {
            triangles: self.triangles.len(),
            materials: self.materials.len(),
            models: self.models.len(),
            nodes: self.nodes.len(),
            ..SceneStats::default()
        };
        for model in self.models.iter() {
            for (idx, depth) in bvh::walk(self.nodes(), model.root()) {
                if let Some(range) = self.nodes[idx].triangles() {
                    stats.max_leaf_size = stats.max_leaf_size.max(range.len());
                    stats.max_depth = stats.max_depth.max(depth);
                }
            }
        }
        stats
    }

    /// Serializes the four arrays into their GPU layout.
    pub fn encode(&self) -> SceneBuffers {
        SceneBuffers {
            triangles: gpu::encode::<_, GpuTriangle>(self.triangles()),
            materials: gpu::encode::<_, GpuMaterial>(self.materials()),
            models: gpu::encode::<_, GpuModel>(self.models()),
            bvh_nodes: gpu::encode::<_, GpuBvhNode>(self.nodes()),
        }
    }

    /// Pushes a full snapshot of the scene to `target`, one binding at a time.
    pub fn upload(&self, target: &mut impl BufferTarget) {
        let buffers = self.encode();
        for binding in Binding::ALL {
            target.write(binding, buffers.get(binding));
        }
        info!("uploaded {} bytes of scene data", buffers.len());
    }
}
