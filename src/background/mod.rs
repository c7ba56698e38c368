//! Background descriptions, gradient rasterization, and materialization into canvases.

pub mod gradient;
pub mod materialize;
pub mod spec;

pub use gradient::{lerp_color, multi_stop_color, rasterize};
pub use materialize::materialize;
pub use spec::{BackgroundSpec, GradientDirection, Rgb, parse, parse_strict};
