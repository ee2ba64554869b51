pub mod backend;
pub mod export;
pub mod factory;
pub mod storage;
