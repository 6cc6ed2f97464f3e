pub mod caption;
pub mod image_source;
