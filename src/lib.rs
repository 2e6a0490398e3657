//! # Bakery Production ERP
//!
//! 烘焙生產核心：單位換算、配方展開、成本彙總、可用量檢查、
//! 庫存預留與生產工單狀態機。
//!
//! ```
//! use bakery::prelude::*;
//! use rust_decimal::Decimal;
//!
//! let units = UnitCatalog::from_units(vec![
//!     MeasurementUnit::reference("kg", "weight"),
//!     MeasurementUnit::reference("pc", "count"),
//! ])
//! .unwrap();
//!
//! let recipe = Recipe::new("R-BUN", "BUN", Decimal::from(10), "pc")
//!     .with_ingredient("FLOUR", Decimal::ONE, "kg");
//! let catalog = Catalog::new(units)
//!     .with_article(Article::ingredient("FLOUR", "kg", Decimal::from(80)).with_stock(Decimal::from(3)))
//!     .with_article(Article::product("BUN", "pc", Some(recipe)));
//!
//! let engine = ProductionEngine::new(catalog, ProductionConfig::default()).unwrap();
//! let tree = engine.explode("BUN", Decimal::from(20)).unwrap();
//!
//! assert_eq!(engine.cost(&tree).unwrap(), Decimal::from(160));
//! assert!(engine.check_availability(&tree).unwrap().feasible);
//! ```

pub use bakery_calc as calc;
pub use bakery_core as model;
pub use bakery_production as production;

/// 常用類型
pub mod prelude {
    pub use bakery_calc::{
        AvailabilityChecker, AvailabilityReport, CostAggregator, CostReport, RecipeResolver,
        ResolvedNode, ResolvedTree, UnitConverter,
    };
    pub use bakery_core::{
        Article, ArticleKind, BakeryError, Catalog, MeasurementUnit, OperationItem, OperationKind,
        OperationStatus, ProductionConfig, ProductionOperation, Recipe, Reservation,
        ReservationPolicy, Result, Shortage, StockAlert, UnitCatalog, UnitCategory,
    };
    pub use bakery_production::{
        Consumption, OperationEvent, ProductionEngine, ReservationLedger, TransitionOutcome,
    };
}

/// 初始化日誌輸出（可用 `RUST_LOG` 調整層級，預設 info）
///
/// 重複呼叫不會報錯。
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
