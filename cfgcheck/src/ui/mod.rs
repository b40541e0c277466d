pub mod output_format;
pub mod tables;
pub mod theme;
