pub mod ops_upload;
pub mod pool;
pub mod scan;
