mod utils;

// public: bounding boxes
pub mod bounds;
// public: BVH construction over the scene's triangle array
pub mod bvh;
// public: commandline parser
pub mod cli;
// public: commandline errors
pub mod error;
// public: triangles and materials
pub mod geometry;
// public: GPU buffer layout and upload targets
pub mod gpu;
// public: mesh ingestion
pub mod import;
// public: placed models
pub mod model;
// public: scene arrays and model loading
pub mod scene;

pub use utils::arena::{Arena, ArenaIndex};
pub use utils::progress::get_progressbar;
