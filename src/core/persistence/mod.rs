pub mod local;
pub mod storage_path;
