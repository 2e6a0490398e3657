//! 計量單位模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::{BakeryError, Result};

/// 單位類別（相對於同族的基準單位）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitCategory {
    /// 基準單位（factor = 1）
    Reference,
    /// 較小單位：factor = 一個基準單位等於多少本單位（kg → g: 1000）
    Smaller,
    /// 較大單位：factor = 一個本單位等於多少基準單位（t → kg: 1000）
    Larger,
}

/// 計量單位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementUnit {
    /// 單位ID
    pub id: String,

    /// 縮寫（如 kg、g、pc）
    pub abbreviation: String,

    /// 單位族（weight、volume、count...）
    pub family: String,

    /// 類別
    pub category: UnitCategory,

    /// 換算係數（> 0）
    pub factor: Decimal,
}

impl MeasurementUnit {
    /// 創建基準單位
    pub fn reference(id: &str, family: &str) -> Self {
        Self {
            id: id.to_string(),
            abbreviation: id.to_string(),
            family: family.to_string(),
            category: UnitCategory::Reference,
            factor: Decimal::ONE,
        }
    }

    /// 創建較小單位
    pub fn smaller(id: &str, family: &str, factor: Decimal) -> Self {
        Self {
            id: id.to_string(),
            abbreviation: id.to_string(),
            family: family.to_string(),
            category: UnitCategory::Smaller,
            factor,
        }
    }

    /// 創建較大單位
    pub fn larger(id: &str, family: &str, factor: Decimal) -> Self {
        Self {
            id: id.to_string(),
            abbreviation: id.to_string(),
            family: family.to_string(),
            category: UnitCategory::Larger,
            factor,
        }
    }

    /// 建構器模式：設置縮寫
    pub fn with_abbreviation(mut self, abbreviation: &str) -> Self {
        self.abbreviation = abbreviation.to_string();
        self
    }

    pub fn is_reference(&self) -> bool {
        self.category == UnitCategory::Reference
    }
}

/// 計量單位目錄
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitCatalog {
    units: HashMap<String, MeasurementUnit>,
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 從單位清單建立目錄並驗證
    pub fn from_units(units: Vec<MeasurementUnit>) -> Result<Self> {
        let mut catalog = Self::new();
        for unit in units {
            catalog.insert(unit);
        }
        catalog.validate()?;
        Ok(catalog)
    }

    /// 新增或取代單位（不驗證，呼叫端須再呼叫 `validate`）
    pub fn insert(&mut self, unit: MeasurementUnit) {
        self.units.insert(unit.id.clone(), unit);
    }

    /// 查詢單位
    pub fn get(&self, unit_id: &str) -> Result<&MeasurementUnit> {
        self.units
            .get(unit_id)
            .ok_or_else(|| BakeryError::UnknownUnit(unit_id.to_string()))
    }

    pub fn contains(&self, unit_id: &str) -> bool {
        self.units.contains_key(unit_id)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// 驗證目錄：factor > 0，每個單位族恰好一個基準單位且其 factor = 1
    pub fn validate(&self) -> Result<()> {
        let mut references: BTreeMap<&str, usize> = BTreeMap::new();

        for unit in self.units.values() {
            if unit.factor <= Decimal::ZERO {
                return Err(BakeryError::validation(format!(
                    "單位 {} 的換算係數必須大於 0",
                    unit.id
                )));
            }

            let count = references.entry(unit.family.as_str()).or_insert(0);
            if unit.is_reference() {
                if unit.factor != Decimal::ONE {
                    return Err(BakeryError::validation(format!(
                        "基準單位 {} 的換算係數必須為 1",
                        unit.id
                    )));
                }
                *count += 1;
            }
        }

        for (family, count) in references {
            if count != 1 {
                return Err(BakeryError::validation(format!(
                    "單位族 {} 必須恰好有一個基準單位（目前 {} 個）",
                    family, count
                )));
            }
        }

        Ok(())
    }
}
