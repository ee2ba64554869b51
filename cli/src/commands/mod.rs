pub mod artifacts;
pub mod cli;
pub mod edit;
pub mod plan;
pub mod run;
pub mod status;
