//! Definition of command line arguments

use clap::Parser;
use glam::{Mat4, Quat, Vec3};

pub use clap_verbosity_flag::{InfoLevel, Verbosity};

use crate::import::PostProcess;

/// Parses the commandline arguments into an [Arguments] struct
pub fn parse_args() -> Arguments {
    Arguments::parse()
}

/// Argument definitions for [clap::Parser]
#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Arguments {
    /// glTF or OBJ files to load, in order; each becomes one model
    #[clap(required = true, value_name = "MESH")]
    pub models: Vec<std::path::PathBuf>,

    /// Directory receiving one `.bin` file per GPU buffer binding
    #[clap(short, long, default_value = "buffers", value_name = "DIR")]
    pub output: std::path::PathBuf,

    /// Maximum BVH depth per model
    ///
    /// Ranges still holding several triangles at this depth become a single leaf
    #[clap(
        short,
        long = "depth",
        value_parser = valid_count::<u32>,
        default_value_t = crate::bvh::DEFAULT_DEPTH_BUDGET,
        value_name = "NUM"
    )]
    pub depth_budget: u32,

    /// Generate smooth instead of flat normals for meshes without normals
    #[clap(long)]
    pub smooth_normals: bool,

    /// Flip the v texture coordinate
    #[clap(long)]
    pub flip_uvs: bool,

    /// Place a loaded model: INDEX:TX,TY,TZ[:SCALE[:YAW_DEGREES]]
    ///
    /// May be repeated. INDEX counts successfully loaded models from 0
    #[clap(long = "transform", value_parser = parse_transform, value_name = "SPEC")]
    pub transforms: Vec<TransformSpec>,

    /// Log and skip meshes that fail to load instead of aborting
    #[clap(long)]
    pub skip_failed: bool,

    #[clap(flatten)]
    pub verbosity: Verbosity<InfoLevel>,
}

impl Arguments {
    /// Postprocessing requested for every mesh
    pub fn post_process(&self) -> PostProcess {
        let mut flags = PostProcess::GEN_NORMALS;
        if self.smooth_normals {
            flags |= PostProcess::GEN_SMOOTH_NORMALS;
        }
        if self.flip_uvs {
            flags |= PostProcess::FLIP_UVS;
        }
        flags
    }
}

/// Placement of one model, applied as scale, then yaw, then translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformSpec {
    pub model: usize,
    pub translation: Vec3,
    pub scale: f32,
    pub yaw_degrees: f32,
}

impl TransformSpec {
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_rotation_y(self.yaw_degrees.to_radians()),
            self.translation,
        )
    }
}

/// Parses `INDEX:TX,TY,TZ[:SCALE[:YAW_DEGREES]]`
fn parse_transform(s: &str) -> Result<TransformSpec, String> {
    let mut parts = s.split(':');
    let model = parts
        .next()
        .unwrap_or_default()
        .parse::<usize>()
        .map_err(|e| format!("invalid model index: {e}"))?;

    let coords = parts
        .next()
        .ok_or_else(|| "missing translation".to_string())?
        .split(',')
        .map(|c| c.trim().parse::<f32>().map_err(|e| format!("invalid translation: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    let translation = match coords.as_slice() {
        &[x, y, z] => Vec3::new(x, y, z),
        _ => return Err(format!("translation needs 3 components, found {}", coords.len())),
    };

    let scale = match parts.next() {
        Some(scale) => scale.parse::<f32>().map_err(|e| format!("invalid scale: {e}"))?,
        None => 1.0,
    };
    if !scale.is_normal() {
        return Err("scale must be finite and non-zero".to_string());
    }

    let yaw_degrees = match parts.next() {
        Some(yaw) => yaw.parse::<f32>().map_err(|e| format!("invalid yaw: {e}"))?,
        None => 0.0,
    };

    if parts.next().is_some() {
        return Err("too many ':'-separated fields".to_string());
    }

    Ok(TransformSpec {
        model,
        translation,
        scale,
        yaw_degrees,
    })
}

/// Checks whether the given integer value is greater than 0
fn valid_count<T>(s: &str) -> Result<T, String>
where
    T: num_traits::PrimInt + std::str::FromStr,
    <T as std::str::FromStr>::Err: std::fmt::Display,
{
    match s.parse::<T>() {
        Ok(count) => {
            if count > T::zero() {
                Ok(count)
            } else {
                Err("count must be greater than 0".to_string())
            }
        }
        Err(e) => Err(e.to_string()),
    }
}
