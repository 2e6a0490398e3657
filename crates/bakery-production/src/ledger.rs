//! 庫存預留帳
//!
//! 每張工單對每個物料最多一筆預留。預留以需求樹彙總後寫入，
//! 重複呼叫 `reserve` 會取代同一工單先前的預留。

use bakery_calc::{merge_requirements, ResolvedTree};
use bakery_core::{BakeryError, Catalog, Reservation, Result, StockAlert};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// 庫存異動
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockMovement {
    pub article_id: String,

    /// 異動數量（庫存單位，正數）
    pub quantity: Decimal,

    pub before: Decimal,

    pub after: Decimal,
}

/// 完工消耗結果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Consumption {
    /// 被刪除的預留
    pub released: Vec<Reservation>,

    /// 原料/半成品扣庫
    pub debited: Vec<StockMovement>,

    /// 成品入庫（與需求樹順序一致）
    pub produced: Vec<StockMovement>,

    /// 扣庫後低於最低庫存的物料
    pub alerts: Vec<StockAlert>,
}

/// 預留帳
#[derive(Debug, Clone, Default)]
pub struct ReservationLedger {
    rows: BTreeMap<Uuid, Vec<Reservation>>,
}

impl ReservationLedger {
    /// 創建空的預留帳
    pub fn new() -> Self {
        Self::default()
    }

    /// 預留工單所需物料（冪等：取代該工單既有預留）
    pub fn reserve(&mut self, operation_id: Uuid, trees: &[ResolvedTree]) -> Vec<Reservation> {
        let rows: Vec<Reservation> = merge_requirements(trees)
            .into_iter()
            .filter(|(_, quantity)| *quantity > Decimal::ZERO)
            .map(|(article_id, quantity)| Reservation::new(operation_id, article_id, quantity))
            .collect();

        tracing::debug!("工單 {} 預留 {} 筆物料", operation_id, rows.len());

        self.rows.insert(operation_id, rows.clone());
        rows
    }

    /// 釋放工單的全部預留
    pub fn release(&mut self, operation_id: Uuid) -> Vec<Reservation> {
        let released = self.rows.remove(&operation_id).unwrap_or_default();
        if !released.is_empty() {
            tracing::debug!("工單 {} 釋放 {} 筆預留", operation_id, released.len());
        }
        released
    }

    /// 完工消耗：刪除預留、扣減原料庫存、成品入庫
    ///
    /// 扣減數量為需求樹的計劃需求；成品入庫為合格數量，
    /// 多個生產項目時依計劃數量比例分配。
    pub fn consume(
        &mut self,
        catalog: &mut Catalog,
        operation_id: Uuid,
        trees: &[ResolvedTree],
        conform_quantity: Decimal,
        allow_negative_stock: bool,
    ) -> Result<Consumption> {
        if conform_quantity < Decimal::ZERO {
            return Err(BakeryError::validation("合格數量不可為負數"));
        }

        let requirements = merge_requirements(trees);
        let credits = Self::distribute(trees, conform_quantity);

        // 先確認所有物料存在，之後的異動不會失敗
        for article_id in requirements.keys() {
            catalog.article(article_id)?;
        }
        for tree in trees {
            catalog.article(&tree.root().article_id)?;
        }

        let mut consumption = Consumption {
            released: self.rows.remove(&operation_id).unwrap_or_default(),
            ..Consumption::default()
        };

        for (article_id, quantity) in requirements {
            let before = catalog.stock(&article_id)?;
            let after = catalog.adjust_stock(&article_id, -quantity, allow_negative_stock)?;

            let article = catalog.article(&article_id)?;
            if article.is_below_min_stock() {
                tracing::warn!(
                    "物料 {} 庫存 {} 低於最低庫存 {}",
                    article_id,
                    after,
                    article.min_stock
                );
                consumption.alerts.push(StockAlert {
                    article_id: article_id.clone(),
                    current_stock: after,
                    min_stock: article.min_stock,
                    replenishment: article.replenishment_needed(),
                });
            }

            consumption.debited.push(StockMovement {
                article_id,
                quantity,
                before,
                after,
            });
        }

        for (tree, credit) in trees.iter().zip(credits) {
            let root = tree.root();
            let before = catalog.stock(&root.article_id)?;
            let after = catalog.adjust_stock(&root.article_id, credit, allow_negative_stock)?;

            consumption.produced.push(StockMovement {
                article_id: root.article_id.clone(),
                quantity: credit,
                before,
                after,
            });
        }

        tracing::debug!(
            "工單 {} 消耗 {} 筆物料，入庫 {}",
            operation_id,
            consumption.debited.len(),
            conform_quantity
        );

        Ok(consumption)
    }

    /// 依計劃數量比例分配合格數量，換算為成品庫存單位
    fn distribute(trees: &[ResolvedTree], conform_quantity: Decimal) -> Vec<Decimal> {
        let planned: Decimal = trees.iter().map(|t| t.root().required_quantity).sum();
        if planned <= Decimal::ZERO {
            return vec![Decimal::ZERO; trees.len()];
        }

        let mut allocated = Decimal::ZERO;
        let mut credits = Vec::with_capacity(trees.len());

        for (index, tree) in trees.iter().enumerate() {
            let root = tree.root();
            let share = if index + 1 == trees.len() {
                conform_quantity - allocated
            } else {
                conform_quantity * root.required_quantity / planned
            };
            allocated += share;

            let to_native = if root.required_quantity > Decimal::ZERO {
                root.native_quantity / root.required_quantity
            } else {
                Decimal::ONE
            };
            credits.push(share * to_native);
        }

        credits
    }

    /// 工單的預留
    pub fn reservations_for(&self, operation_id: Uuid) -> &[Reservation] {
        self.rows
            .get(&operation_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// 物料的預留總量
    pub fn reserved_total(&self, article_id: &str) -> Decimal {
        self.rows
            .values()
            .flatten()
            .filter(|r| r.article_id == article_id)
            .map(|r| r.reserved_quantity)
            .sum()
    }

    /// 各物料預留總量（可排除某張工單）
    pub fn reserved_totals(&self, excluding: Option<Uuid>) -> HashMap<String, Decimal> {
        let mut totals = HashMap::new();
        for (operation_id, rows) in &self.rows {
            if Some(*operation_id) == excluding {
                continue;
            }
            for row in rows {
                *totals
                    .entry(row.article_id.clone())
                    .or_insert(Decimal::ZERO) += row.reserved_quantity;
            }
        }
        totals
    }

    /// 持有預留的工單數
    pub fn operation_count(&self) -> usize {
        self.rows.len()
    }
}
