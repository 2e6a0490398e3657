//! 配方模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 配方（生產 base_quantity 個成品所需的原料與工序）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// 配方ID
    pub id: String,

    /// 成品物料ID
    pub produced_article_id: String,

    /// 基準產量
    pub base_quantity: Decimal,

    /// 基準產量單位
    pub base_unit: String,

    /// 原料（有序）
    pub ingredients: Vec<RecipeIngredient>,

    /// 工序（有序，僅傳遞不計算）
    pub operations: Vec<RecipeOperation>,
}

impl Recipe {
    /// 創建新的配方
    pub fn new(
        id: &str,
        produced_article_id: &str,
        base_quantity: Decimal,
        base_unit: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            produced_article_id: produced_article_id.to_string(),
            base_quantity,
            base_unit: base_unit.to_string(),
            ingredients: Vec::new(),
            operations: Vec::new(),
        }
    }

    /// 建構器模式：添加原料
    pub fn with_ingredient(
        mut self,
        component_article_id: &str,
        quantity: Decimal,
        unit: &str,
    ) -> Self {
        self.ingredients.push(RecipeIngredient {
            recipe_id: self.id.clone(),
            component_article_id: component_article_id.to_string(),
            quantity,
            unit: unit.to_string(),
        });
        self
    }

    /// 建構器模式：添加工序
    pub fn with_operation(mut self, description: &str, duration_minutes: Option<u32>) -> Self {
        let sequence = (self.operations.len() as u32 + 1) * 10;
        self.operations.push(RecipeOperation {
            sequence,
            description: description.to_string(),
            duration_minutes,
        });
        self
    }

    /// 檢查配方是否直接使用某物料
    pub fn uses(&self, article_id: &str) -> bool {
        self.ingredients
            .iter()
            .any(|i| i.component_article_id == article_id)
    }

    /// 總工時（分鐘）
    pub fn total_duration_minutes(&self) -> u32 {
        self.operations
            .iter()
            .filter_map(|op| op.duration_minutes)
            .sum()
    }
}

/// 配方原料行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub recipe_id: String,

    /// 原料物料ID
    pub component_article_id: String,

    /// 生產 base_quantity 個成品所需數量
    pub quantity: Decimal,

    /// 數量單位（必須可換算為原料的庫存單位）
    pub unit: String,
}

/// 配方工序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeOperation {
    /// 工序序號
    pub sequence: u32,

    /// 說明（揉麵、發酵、烘烤...）
    pub description: String,

    /// 預計工時（分鐘）
    pub duration_minutes: Option<u32>,
}
