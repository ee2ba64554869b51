pub mod json_dir;
pub mod plan_file;

pub use json_dir::JsonDirArtifactRepository;
pub use plan_file::{load_plan, plan_path, save_plan, PLAN_FILE_NAME};
