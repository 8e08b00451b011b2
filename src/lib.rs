pub mod brush;
pub mod colors;
pub mod config;
pub mod controller;
pub mod error;
pub mod ld;
pub mod markers;
pub mod matrix;
pub mod mini_map;
pub mod parse;
pub mod render_svg;
pub mod scales;
pub mod zoom_map;

pub use config::BubbleMapConfig;
pub use controller::EqtlController;
pub use error::EqtlMapError;
pub use matrix::MatrixModel;
