//! Format converter adapters.

mod image_ops;
mod office;

pub use office::{ConverterSettings, StandardConverter};
