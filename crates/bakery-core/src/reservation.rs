//! 庫存預留模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 工單對某物料的預留
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// 工單ID
    pub operation_id: Uuid,

    /// 物料ID
    pub article_id: String,

    /// 預留數量（庫存單位）
    pub reserved_quantity: Decimal,
}

impl Reservation {
    pub fn new(operation_id: Uuid, article_id: String, reserved_quantity: Decimal) -> Self {
        Self {
            operation_id,
            article_id,
            reserved_quantity,
        }
    }
}
