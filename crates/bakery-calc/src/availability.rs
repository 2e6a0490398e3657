//! 庫存可用量檢查
//!
//! 可用量 = 現有庫存 − 未結預留。半成品與原料一樣以自身庫存檢查，
//! 不假設半成品可以臨時生產。

use bakery_core::{Catalog, Result, Shortage};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::{merge_requirements, Requirements, ResolvedTree};

/// 可用量檢查結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityReport {
    /// 是否可生產
    pub feasible: bool,

    /// 短缺清單（依物料ID排序）
    pub shortages: Vec<Shortage>,
}

impl AvailabilityReport {
    /// 短缺物料ID
    pub fn short_articles(&self) -> Vec<&str> {
        self.shortages.iter().map(|s| s.article_id.as_str()).collect()
    }
}

/// 可用量檢查器
pub struct AvailabilityChecker<'a> {
    catalog: &'a Catalog,
    reserved: &'a HashMap<String, Decimal>,
}

impl<'a> AvailabilityChecker<'a> {
    /// 創建新的檢查器
    ///
    /// `reserved`：物料ID → 未結預留總量（庫存單位）
    pub fn new(catalog: &'a Catalog, reserved: &'a HashMap<String, Decimal>) -> Self {
        Self { catalog, reserved }
    }

    /// 檢查單棵需求樹
    pub fn check(&self, tree: &ResolvedTree) -> Result<AvailabilityReport> {
        self.check_requirements(&tree.requirements())
    }

    /// 檢查多棵需求樹（需求合併後檢查）
    pub fn check_all(&self, trees: &[ResolvedTree]) -> Result<AvailabilityReport> {
        self.check_requirements(&merge_requirements(trees))
    }

    /// 檢查彙總需求
    pub fn check_requirements(&self, requirements: &Requirements) -> Result<AvailabilityReport> {
        let mut shortages = Vec::new();

        for (article_id, required) in requirements {
            let available = self.available(article_id)?;
            let shortfall = *required - available;

            if shortfall > Decimal::ZERO {
                tracing::debug!(
                    "庫存不足: {} 需要 {}, 可用 {}",
                    article_id,
                    required,
                    available
                );
                shortages.push(Shortage::new(article_id.clone(), shortfall));
            }
        }

        Ok(AvailabilityReport {
            feasible: shortages.is_empty(),
            shortages,
        })
    }

    /// 可用量 = 現有庫存 − 預留
    pub fn available(&self, article_id: &str) -> Result<Decimal> {
        let stock = self.catalog.stock(article_id)?;
        let reserved = self
            .reserved
            .get(article_id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        Ok(stock - reserved)
    }
}
