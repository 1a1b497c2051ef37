pub mod commands;
pub mod compare;
pub mod config;
pub mod fetch;
pub mod fixture;
pub mod k8s;
pub mod normalize;
pub mod reconcile;
pub mod report;
pub mod source;
pub mod telemetry;
#[cfg(test)]
pub mod test_utils;
