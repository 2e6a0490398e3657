//! 物料模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Recipe;

/// 物料類型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArticleKind {
    /// 原料（採購）
    Ingredient,
    /// 成品/半成品，可能有配方
    Product(Option<Recipe>),
}

/// 物料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// 物料ID
    pub id: String,

    /// 名稱
    pub name: String,

    /// 類型
    pub kind: ArticleKind,

    /// 庫存單位
    pub native_unit: String,

    /// 加權平均成本（每庫存單位）
    pub cost_per_unit: Decimal,

    /// 現有庫存（庫存單位）
    pub current_stock: Decimal,

    /// 最低庫存
    pub min_stock: Decimal,

    /// 最高庫存
    pub max_stock: Decimal,
}

impl Article {
    /// 創建原料
    pub fn ingredient(id: &str, native_unit: &str, cost_per_unit: Decimal) -> Self {
        Self::new(id, ArticleKind::Ingredient, native_unit, cost_per_unit)
    }

    /// 創建成品
    pub fn product(id: &str, native_unit: &str, recipe: Option<Recipe>) -> Self {
        Self::new(id, ArticleKind::Product(recipe), native_unit, Decimal::ZERO)
    }

    fn new(id: &str, kind: ArticleKind, native_unit: &str, cost_per_unit: Decimal) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            kind,
            native_unit: native_unit.to_string(),
            cost_per_unit,
            current_stock: Decimal::ZERO,
            min_stock: Decimal::ZERO,
            max_stock: Decimal::ZERO,
        }
    }

    /// 建構器模式：設置名稱
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// 建構器模式：設置現有庫存
    pub fn with_stock(mut self, current_stock: Decimal) -> Self {
        self.current_stock = current_stock;
        self
    }

    /// 建構器模式：設置最低/最高庫存
    pub fn with_stock_limits(mut self, min_stock: Decimal, max_stock: Decimal) -> Self {
        self.min_stock = min_stock;
        self.max_stock = max_stock;
        self
    }

    /// 建構器模式：設置加權平均成本
    pub fn with_cost(mut self, cost_per_unit: Decimal) -> Self {
        self.cost_per_unit = cost_per_unit;
        self
    }

    /// 配方（僅限有配方的成品）
    pub fn recipe(&self) -> Option<&Recipe> {
        match &self.kind {
            ArticleKind::Product(Some(recipe)) => Some(recipe),
            _ => None,
        }
    }

    pub fn is_ingredient(&self) -> bool {
        matches!(self.kind, ArticleKind::Ingredient)
    }

    /// 檢查庫存是否低於最低庫存
    pub fn is_below_min_stock(&self) -> bool {
        self.current_stock < self.min_stock
    }

    /// 獲取補充至最高庫存所需數量
    pub fn replenishment_needed(&self) -> Decimal {
        if self.is_below_min_stock() {
            (self.max_stock - self.current_stock).max(self.min_stock - self.current_stock)
        } else {
            Decimal::ZERO
        }
    }
}
