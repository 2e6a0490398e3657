//! # Bakery Core
//!
//! 烘焙生產核心資料模型與類型定義

pub mod article;
pub mod catalog;
pub mod config;
pub mod operation;
pub mod recipe;
pub mod reservation;
pub mod stock;
pub mod unit;

// Re-export 主要類型
pub use article::{Article, ArticleKind};
pub use catalog::Catalog;
pub use config::{ProductionConfig, ReservationPolicy};
pub use operation::{OperationItem, OperationKind, OperationStatus, ProductionOperation};
pub use recipe::{Recipe, RecipeIngredient, RecipeOperation};
pub use reservation::Reservation;
pub use stock::{Shortage, StockAlert};
pub use unit::{MeasurementUnit, UnitCatalog, UnitCategory};

use uuid::Uuid;

/// 生產引擎錯誤類型
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BakeryError {
    #[error("單位不相容: {from} → {to}")]
    IncompatibleUnit { from: String, to: String },

    #[error("找不到計量單位: {0}")]
    UnknownUnit(String),

    #[error("找不到物料: {0}")]
    ArticleNotFound(String),

    #[error("物料沒有配方: {0}")]
    RecipeNotFound(String),

    #[error("配方展開超過最大層級 {max_depth}: {article_id}")]
    DepthLimitExceeded { article_id: String, max_depth: usize },

    #[error("配方循環引用: {}", .path.join(" → "))]
    CyclicRecipe { path: Vec<String> },

    #[error("庫存不足: {}", format_shortages(.0))]
    InsufficientStock(Vec<Shortage>),

    #[error("無效的狀態轉換: {from} 不接受 {event}")]
    InvalidTransition { from: OperationStatus, event: String },

    #[error("衝突: {0}")]
    Conflict(String),

    #[error("驗證失敗: {0}")]
    Validation(String),

    #[error("找不到生產工單: {0}")]
    OperationNotFound(Uuid),

    #[error("配置錯誤: {0}")]
    Config(String),
}

impl BakeryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// 數值運算溢位
    pub fn overflow(context: impl std::fmt::Display) -> Self {
        Self::Validation(format!("數值溢位: {}", context))
    }

    pub fn incompatible_unit(from: &str, to: &str) -> Self {
        Self::IncompatibleUnit {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// 庫存不足時的短缺清單
    pub fn shortages(&self) -> &[Shortage] {
        match self {
            Self::InsufficientStock(shortages) => shortages,
            _ => &[],
        }
    }
}

fn format_shortages(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(|s| format!("{} 缺 {}", s.article_id, s.shortfall))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, BakeryError>;
