//! Byte layout shared with the tracing shader
//!
//! Each scene array is serialized into its own storage buffer. The `Gpu*`
//! structs below mirror the shader's std430 declarations field for field:
//! three-component vectors occupy 16-byte slots, two-component vectors 8 bytes,
//! scalars 4 bytes. Any change here must be matched in the shader source.
//!
//! ```text
//! binding 0: Triangle[]  (128 bytes each)
//! binding 1: Material[]  ( 48 bytes each)
//! binding 2: Model[]     (192 bytes each)
//! binding 3: BvhNode[]   ( 48 bytes each)
//! ```

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec2, Vec3A};

use crate::{
    bounds::BoundingBox,
    bvh::{BvhNode, NodeKind},
    geometry::{Material, Triangle},
    model::Model,
};

mod target;
#[cfg(feature = "wgpu")]
mod wgpu_target;

pub use target::{BufferTarget, HostBuffers};
#[cfg(feature = "wgpu")]
pub use wgpu_target::{WgpuBuffers, WgpuUpload};

/// Fixed shader binding index of each scene array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Binding {
    Triangles = 0,
    Materials = 1,
    Models = 2,
    BvhNodes = 3,
}

impl Binding {
    /// Every binding, in upload order.
    pub const ALL: [Binding; 4] = [
        Binding::Triangles,
        Binding::Materials,
        Binding::Models,
        Binding::BvhNodes,
    ];

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn label(self) -> &'static str {
        match self {
            Binding::Triangles => "triangles",
            Binding::Materials => "materials",
            Binding::Models => "models",
            Binding::BvhNodes => "bvh_nodes",
        }
    }
}

fn vec3_slot(v: Vec3A) -> [f32; 3] {
    v.to_array()
}

fn gpu_index(index: usize) -> u32 {
    debug_assert!(index <= u32::MAX as usize, "index {index} does not fit the GPU layout");
    index as u32
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuTriangle {
    pub p0: [f32; 3],
    _pad0: u32,
    pub p1: [f32; 3],
    _pad1: u32,
    pub p2: [f32; 3],
    _pad2: u32,
    pub n0: [f32; 3],
    _pad3: u32,
    pub n1: [f32; 3],
    _pad4: u32,
    pub n2: [f32; 3],
    _pad5: u32,
    pub uv0: [f32; 2],
    pub uv1: [f32; 2],
    pub uv2: [f32; 2],
    pub material: u32,
    _pad6: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    pub diffuse: [f32; 3],
    pub diffuse_texture: i32,
    pub emission: [f32; 3],
    pub emission_texture: i32,
    pub roughness: f32,
    pub metalness: f32,
    pub transparency: f32,
    pub ior: f32,
}

/// Matrices are column-major; the normal transform's columns are padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuModel {
    pub root: u32,
    _pad0: [u32; 3],
    pub transform: [[f32; 4]; 4],
    pub inverse_transform: [[f32; 4]; 4],
    pub normal_transform: [[f32; 4]; 3],
}

/// Leaves store `left = right = 0` and `start < end`; interior nodes store
/// `start = end = 0` and child indices, which are never 0 since children
/// always follow their parent.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuBvhNode {
    pub min: [f32; 3],
    _pad0: u32,
    pub max: [f32; 3],
    pub left: u32,
    pub right: u32,
    pub start: u32,
    pub end: u32,
    _pad1: u32,
}

const _: () = assert!(std::mem::size_of::<GpuTriangle>() == 128);
const _: () = assert!(std::mem::size_of::<GpuMaterial>() == 48);
const _: () = assert!(std::mem::size_of::<GpuModel>() == 192);
const _: () = assert!(std::mem::size_of::<GpuBvhNode>() == 48);

impl From<&Triangle> for GpuTriangle {
    fn from(tri: &Triangle) -> Self {
        let [p0, p1, p2] = tri.positions.map(vec3_slot);
        let [n0, n1, n2] = tri.normals.map(vec3_slot);
        let [uv0, uv1, uv2] = tri.uvs.map(|uv| uv.to_array());
        Self {
            p0,
            p1,
            p2,
            n0,
            n1,
            n2,
            uv0,
            uv1,
            uv2,
            material: tri.material,
            ..Zeroable::zeroed()
        }
    }
}

impl From<&GpuTriangle> for Triangle {
    fn from(tri: &GpuTriangle) -> Self {
        Self {
            positions: [tri.p0, tri.p1, tri.p2].map(Vec3A::from),
            normals: [tri.n0, tri.n1, tri.n2].map(Vec3A::from),
            uvs: [tri.uv0, tri.uv1, tri.uv2].map(Vec2::from),
            material: tri.material,
        }
    }
}

impl From<&Material> for GpuMaterial {
    fn from(mat: &Material) -> Self {
        Self {
            diffuse: vec3_slot(mat.diffuse),
            diffuse_texture: mat.diffuse_texture,
            emission: vec3_slot(mat.emission),
            emission_texture: mat.emission_texture,
            roughness: mat.roughness,
            metalness: mat.metalness,
            transparency: mat.transparency,
            ior: mat.ior,
        }
    }
}

impl From<&GpuMaterial> for Material {
    fn from(mat: &GpuMaterial) -> Self {
        Self {
            diffuse: Vec3A::from(mat.diffuse),
            diffuse_texture: mat.diffuse_texture,
            emission: Vec3A::from(mat.emission),
            emission_texture: mat.emission_texture,
            roughness: mat.roughness,
            metalness: mat.metalness,
            transparency: mat.transparency,
            ior: mat.ior,
        }
    }
}

impl From<&Model> for GpuModel {
    fn from(model: &Model) -> Self {
        let [c0, c1, c2] = model.normal_transform().to_cols_array_2d();
        let pad = |[x, y, z]: [f32; 3]| [x, y, z, 0.0];
        Self {
            root: gpu_index(model.root()),
            transform: model.transform().to_cols_array_2d(),
            inverse_transform: model.inverse_transform().to_cols_array_2d(),
            normal_transform: [pad(c0), pad(c1), pad(c2)],
            ..Zeroable::zeroed()
        }
    }
}

impl From<&GpuModel> for Model {
    fn from(model: &GpuModel) -> Self {
        let [c0, c1, c2] = model
            .normal_transform
            .map(|[x, y, z, _]| [x, y, z]);
        Model::from_raw_parts(
            model.root as usize,
            Mat4::from_cols_array_2d(&model.transform),
            Mat4::from_cols_array_2d(&model.inverse_transform),
            Mat3::from_cols_array_2d(&[c0, c1, c2]),
        )
    }
}

impl From<&BvhNode> for GpuBvhNode {
    fn from(node: &BvhNode) -> Self {
        let (left, right, start, end) = match node.kind {
            NodeKind::Leaf { start, end } => (0, 0, gpu_index(start), gpu_index(end)),
            NodeKind::Interior { left, right } => (gpu_index(left), gpu_index(right), 0, 0),
        };
        Self {
            min: vec3_slot(node.bounds.min),
            max: vec3_slot(node.bounds.max),
            left,
            right,
            start,
            end,
            ..Zeroable::zeroed()
        }
    }
}

impl From<&GpuBvhNode> for BvhNode {
    fn from(node: &GpuBvhNode) -> Self {
        // leaves are never empty, so an empty range marks an interior node
        let kind = if node.start < node.end {
            NodeKind::Leaf {
                start: node.start as usize,
                end: node.end as usize,
            }
        } else {
            NodeKind::Interior {
                left: node.left as usize,
                right: node.right as usize,
            }
        };
        Self {
            bounds: BoundingBox {
                min: Vec3A::from(node.min),
                max: Vec3A::from(node.max),
            },
            kind,
        }
    }
}

/// Serializes `items` into their GPU representation.
pub fn encode<'a, T, G>(items: &'a [T]) -> Vec<u8>
where
    G: Pod + From<&'a T>,
{
    let gpu: Vec<G> = items.iter().map(G::from).collect();
    bytemuck::cast_slice(&gpu).to_vec()
}

/// Reads back records written by [encode].
///
/// A trailing partial record is zero-filled.
pub fn decode<T, G>(bytes: &[u8]) -> Vec<T>
where
    G: Pod,
    T: for<'g> From<&'g G>,
{
    let gpu: Vec<G> = bytemuck::pod_collect_to_vec(bytes);
    gpu.iter().map(T::from).collect()
}

/// The four scene arrays in their GPU byte layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneBuffers {
    pub triangles: Vec<u8>,
    pub materials: Vec<u8>,
    pub models: Vec<u8>,
    pub bvh_nodes: Vec<u8>,
}

impl SceneBuffers {
    pub fn get(&self, binding: Binding) -> &[u8] {
        match binding {
            Binding::Triangles => &self.triangles,
            Binding::Materials => &self.materials,
            Binding::Models => &self.models,
            Binding::BvhNodes => &self.bvh_nodes,
        }
    }

    pub fn decode_triangles(&self) -> Vec<Triangle> {
        decode::<_, GpuTriangle>(&self.triangles)
    }

    pub fn decode_materials(&self) -> Vec<Material> {
        decode::<_, GpuMaterial>(&self.materials)
    }

    pub fn decode_models(&self) -> Vec<Model> {
        decode::<_, GpuModel>(&self.models)
    }

    pub fn decode_bvh_nodes(&self) -> Vec<BvhNode> {
        decode::<_, GpuBvhNode>(&self.bvh_nodes)
    }

    /// Total size of all four buffers in bytes.
    pub fn len(&self) -> usize {
        Binding::ALL.iter().map(|&b| self.get(b).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
