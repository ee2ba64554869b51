pub mod dir;

pub use dir::{write_export, ExportReport};
