pub mod batch;
pub mod scan_result;
pub mod signature;
