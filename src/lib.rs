mod annotation;
mod color_map;
mod convert;
mod rasterize;

pub mod cli;

pub use annotation::{AnnotationError, AnnotationRecord, Shape};
pub use color_map::{ClassColorMap, ColorMapError};
pub use convert::{convert_file, resolve_output_path, ConvertError};
pub use rasterize::{rasterize, RasterizeError};
