pub mod caption_types;
