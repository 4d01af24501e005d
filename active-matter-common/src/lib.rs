pub mod config;
pub mod sim_params;
pub mod snapshot;
pub mod trajectory;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{ModelConfig, ModelKind, OutputConfig, RunConfig, SimulationConfig};
pub use sim_params::{BoidsParams, ModelParams, SimParams};
pub use snapshot::Snapshot;
pub use trajectory::{frame_len, read_frame, read_frames, Frame, FrameReader, FrameWriter};
pub use vecmath::{Heading, Vec1, Vec2, Vec3, Vector};
