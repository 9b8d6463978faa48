//! Data module - CSV loading, joining and aggregation

mod loader;
mod processor;

pub use loader::DataLoader;
pub use processor::{
    DataProcessor, EmploymentSummary, NationalDistribution, ProvinceBreakdown, YearTotal,
};
