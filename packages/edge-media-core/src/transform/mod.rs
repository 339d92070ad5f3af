pub mod decode;
pub mod dimensions;
pub mod encode;
pub mod orientation;
pub mod params;
pub mod pipeline;
pub mod resize;
pub mod service;

pub use decode::decode_image;
pub use dimensions::{CropRect, ResizePlan, plan_resize};
pub use encode::encode_image;
pub use orientation::{Orientation, apply_orientation, read_orientation};
pub use params::{Fit, OutputFormat, TargetFormat, TransformOptions};
pub use pipeline::{TransformedImage, transform_image};
pub use resize::{apply_plan, resize_image};
pub use service::{ImageTransformer, LocalTransformer};
