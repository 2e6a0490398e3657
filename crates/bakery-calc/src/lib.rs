//! # Bakery Calculation Engine
//!
//! 配方展開、成本彙總與可用量檢查。全部為純計算，可跨工單並行執行。

pub mod availability;
pub mod conversion;
pub mod costing;
pub mod explosion;

// Re-export 主要類型
pub use availability::{AvailabilityChecker, AvailabilityReport};
pub use conversion::UnitConverter;
pub use costing::{CostAggregator, CostLine, CostReport};
pub use explosion::{
    merge_requirements, NodeId, RecipeResolver, Requirements, ResolvedNode, ResolvedTree,
};
