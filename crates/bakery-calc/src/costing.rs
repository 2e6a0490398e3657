//! 成本彙總
//!
//! 由下而上累加原料成本。半成品節點的成本為其子節點成本總和，
//! 不使用半成品自身的加權平均成本。

use bakery_core::{BakeryError, Catalog, Result};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{NodeId, ResolvedNode, ResolvedTree, UnitConverter};

/// 成本明細行（葉節點）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostLine {
    pub article_id: String,
    pub quantity: Decimal,
    pub unit: String,
    /// 每 unit 的單價
    pub unit_price: Decimal,
    pub cost: Decimal,
    pub depth: usize,
}

/// 成本報表
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostReport {
    pub article_id: String,
    pub quantity: Decimal,
    pub total: Decimal,
    /// 每單位成品成本
    pub unit_cost: Decimal,
    pub lines: Vec<CostLine>,
}

/// 成本彙總器
pub struct CostAggregator<'a> {
    catalog: &'a Catalog,
    converter: UnitConverter<'a>,
}

impl<'a> CostAggregator<'a> {
    /// 創建新的成本彙總器
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            converter: UnitConverter::new(catalog.units()),
        }
    }

    /// 整棵樹的總成本
    pub fn cost(&self, tree: &ResolvedTree) -> Result<Decimal> {
        self.node_cost(tree, tree.root_id())
    }

    /// 單一節點（含子樹）的成本
    pub fn node_cost(&self, tree: &ResolvedTree, id: NodeId) -> Result<Decimal> {
        let Some(node) = tree.node(id) else {
            return Ok(Decimal::ZERO);
        };

        if node.is_leaf() {
            return Ok(self.leaf_line(node)?.cost);
        }

        tree.children(id).try_fold(Decimal::ZERO, |total, (child, _)| {
            checked_add(total, self.node_cost(tree, child)?)
        })
    }

    /// 成本明細
    pub fn breakdown(&self, tree: &ResolvedTree) -> Result<CostReport> {
        let mut lines = Vec::new();
        for node in tree.leaves() {
            lines.push(self.leaf_line(node)?);
        }

        let total = lines
            .iter()
            .try_fold(Decimal::ZERO, |total, line| checked_add(total, line.cost))?;
        let root = tree.root();
        let unit_cost = if root.required_quantity > Decimal::ZERO {
            total / root.required_quantity
        } else {
            Decimal::ZERO
        };

        Ok(CostReport {
            article_id: root.article_id.clone(),
            quantity: root.required_quantity,
            total,
            unit_cost,
            lines,
        })
    }

    fn leaf_line(&self, node: &ResolvedNode) -> Result<CostLine> {
        let article = self.catalog.article(&node.article_id)?;
        let unit_price = self.converter.convert_price(
            article.cost_per_unit,
            &article.native_unit,
            &node.required_unit,
        )?;

        let cost = unit_price.checked_mul(node.required_quantity).ok_or_else(|| {
            BakeryError::overflow(format!(
                "{} {} × {}",
                node.article_id, node.required_quantity, unit_price
            ))
        })?;

        Ok(CostLine {
            article_id: node.article_id.clone(),
            quantity: node.required_quantity,
            unit: node.required_unit.clone(),
            unit_price,
            cost,
            depth: node.depth,
        })
    }
}

fn checked_add(total: Decimal, cost: Decimal) -> Result<Decimal> {
    total
        .checked_add(cost)
        .ok_or_else(|| BakeryError::overflow(format!("成本 {} + {}", total, cost)))
}
