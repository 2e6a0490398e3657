//! 庫存短缺與警示

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 庫存短缺
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortage {
    /// 物料ID
    pub article_id: String,

    /// 短缺數量（庫存單位）
    pub shortfall: Decimal,
}

impl Shortage {
    pub fn new(article_id: String, shortfall: Decimal) -> Self {
        Self {
            article_id,
            shortfall,
        }
    }
}

/// 低庫存警示（消耗後低於最低庫存）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAlert {
    pub article_id: String,

    /// 消耗後庫存
    pub current_stock: Decimal,

    pub min_stock: Decimal,

    /// 建議補貨量（補至最高庫存）
    pub replenishment: Decimal,
}
