pub mod instance;
pub mod profile;
pub mod timing;
pub mod utilization;
