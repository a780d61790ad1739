pub mod buffer;
pub mod overlay;
pub mod skeleton;

#[cfg(feature = "desktop")]
pub mod mat;
#[cfg(feature = "desktop")]
pub mod window;

pub use buffer::{draw_trajectory, FrameBuffer};
pub use overlay::{annotate, Canvas};
pub use skeleton::SKELETON_CONNECTIONS;

#[cfg(feature = "desktop")]
pub use window::{PlotWindow, VideoWindow};
