//! 配方展開（BOM explosion）
//!
//! 每次展開建立一棵新的、不可變的需求樹（arena + 子節點索引）。
//! 數量變更時重新展開，不修改既有的樹。

use bakery_core::{ArticleKind, BakeryError, Catalog, Recipe, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::UnitConverter;

/// 節點索引
pub type NodeId = usize;

/// 物料需求彙總（物料ID → 庫存單位數量）
pub type Requirements = BTreeMap<String, Decimal>;

/// 展開後的需求節點
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedNode {
    /// 物料ID
    pub article_id: String,

    /// 需求數量（required_unit）
    pub required_quantity: Decimal,

    /// 需求單位（配方行上的單位）
    pub required_unit: String,

    /// 需求數量（物料庫存單位）
    pub native_quantity: Decimal,

    /// 子配方（半成品/成品節點）
    pub recipe_id: Option<String>,

    /// 層級（根節點 = 0）
    pub depth: usize,

    /// 子節點
    pub children: Vec<NodeId>,
}

impl ResolvedNode {
    pub fn is_leaf(&self) -> bool {
        self.recipe_id.is_none()
    }
}

/// 需求樹
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTree {
    nodes: Vec<ResolvedNode>,
}

impl ResolvedTree {
    /// 根節點
    pub fn root(&self) -> &ResolvedNode {
        &self.nodes[0]
    }

    pub fn root_id(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> Option<&ResolvedNode> {
        self.nodes.get(id)
    }

    /// 子節點
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &ResolvedNode)> {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&child| (child, &self.nodes[child]))
    }

    /// 先序遍歷所有節點
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedNode> {
        self.nodes.iter()
    }

    /// 所有葉節點（原料）
    pub fn leaves(&self) -> impl Iterator<Item = &ResolvedNode> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 樹的最大層級
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// 彙總需求（排除根節點，同一物料累加）
    pub fn requirements(&self) -> Requirements {
        let mut totals = Requirements::new();
        for node in self.nodes.iter().skip(1) {
            *totals.entry(node.article_id.clone()).or_insert(Decimal::ZERO) += node.native_quantity;
        }
        totals
    }
}

/// 合併多棵樹的需求
pub fn merge_requirements<'t>(trees: impl IntoIterator<Item = &'t ResolvedTree>) -> Requirements {
    let mut totals = Requirements::new();
    for tree in trees {
        for (article_id, quantity) in tree.requirements() {
            *totals.entry(article_id).or_insert(Decimal::ZERO) += quantity;
        }
    }
    totals
}

/// 配方展開器
pub struct RecipeResolver<'a> {
    catalog: &'a Catalog,
    converter: UnitConverter<'a>,
}

impl<'a> RecipeResolver<'a> {
    /// 創建新的展開器
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            converter: UnitConverter::new(catalog.units()),
        }
    }

    /// 展開物料配方
    ///
    /// `desired_quantity` 以根配方的基準單位表示。
    pub fn explode(
        &self,
        root_article_id: &str,
        desired_quantity: Decimal,
        max_depth: usize,
    ) -> Result<ResolvedTree> {
        if desired_quantity <= Decimal::ZERO {
            return Err(BakeryError::validation(format!(
                "{} 的需求數量必須大於 0（目前 {}）",
                root_article_id, desired_quantity
            )));
        }

        let article = self.catalog.article(root_article_id)?;
        let recipe = self.catalog.recipe_for(root_article_id)?;

        let native_quantity =
            self.convert_or_keep(desired_quantity, &recipe.base_unit, &article.native_unit)?;

        let mut nodes = vec![ResolvedNode {
            article_id: article.id.clone(),
            required_quantity: desired_quantity,
            required_unit: recipe.base_unit.clone(),
            native_quantity,
            recipe_id: Some(recipe.id.clone()),
            depth: 0,
            children: Vec::new(),
        }];

        let mut path = vec![article.id.clone()];
        self.expand(&mut nodes, 0, recipe, desired_quantity, 1, max_depth, &mut path)?;

        tracing::debug!(
            "配方展開完成: {} x {} → {} 個節點",
            root_article_id,
            desired_quantity,
            nodes.len()
        );

        Ok(ResolvedTree { nodes })
    }

    #[allow(clippy::too_many_arguments)]
    fn expand(
        &self,
        nodes: &mut Vec<ResolvedNode>,
        parent: NodeId,
        recipe: &Recipe,
        desired_quantity: Decimal,
        level: usize,
        max_depth: usize,
        path: &mut Vec<String>,
    ) -> Result<()> {
        if level > max_depth {
            return Err(BakeryError::DepthLimitExceeded {
                article_id: recipe.produced_article_id.clone(),
                max_depth,
            });
        }
        if recipe.base_quantity <= Decimal::ZERO {
            return Err(BakeryError::validation(format!(
                "配方 {} 的基準產量必須大於 0",
                recipe.id
            )));
        }

        let ratio = desired_quantity
            .checked_div(recipe.base_quantity)
            .ok_or_else(|| {
                BakeryError::overflow(format!("{} / {}", desired_quantity, recipe.base_quantity))
            })?;
        let mut children = Vec::with_capacity(recipe.ingredients.len());

        for ingredient in &recipe.ingredients {
            let article = self.catalog.article(&ingredient.component_article_id)?;
            let required_quantity = ingredient.quantity.checked_mul(ratio).ok_or_else(|| {
                BakeryError::overflow(format!(
                    "{} {} × {}",
                    ingredient.component_article_id, ingredient.quantity, ratio
                ))
            })?;
            let native_quantity =
                self.converter
                    .convert(required_quantity, &ingredient.unit, &article.native_unit)?;

            let id = nodes.len();
            children.push(id);

            match &article.kind {
                ArticleKind::Product(Some(sub_recipe)) => {
                    if path.contains(&article.id) {
                        let mut cycle = path.clone();
                        cycle.push(article.id.clone());
                        return Err(BakeryError::CyclicRecipe { path: cycle });
                    }

                    nodes.push(ResolvedNode {
                        article_id: article.id.clone(),
                        required_quantity,
                        required_unit: ingredient.unit.clone(),
                        native_quantity,
                        recipe_id: Some(sub_recipe.id.clone()),
                        depth: level,
                        children: Vec::new(),
                    });

                    // 同族單位先換算為子配方基準單位；不同族（如「1 份」對「5 kg」）直接沿用數值
                    let sub_desired = self.convert_or_keep(
                        required_quantity,
                        &ingredient.unit,
                        &sub_recipe.base_unit,
                    )?;

                    tracing::debug!(
                        "子配方展開: {} → {} (數量: {}, 層級: {})",
                        recipe.produced_article_id,
                        article.id,
                        sub_desired,
                        level
                    );

                    path.push(article.id.clone());
                    self.expand(nodes, id, sub_recipe, sub_desired, level + 1, max_depth, path)?;
                    path.pop();
                }
                ArticleKind::Product(None) | ArticleKind::Ingredient => {
                    nodes.push(ResolvedNode {
                        article_id: article.id.clone(),
                        required_quantity,
                        required_unit: ingredient.unit.clone(),
                        native_quantity,
                        recipe_id: None,
                        depth: level,
                        children: Vec::new(),
                    });
                }
            }
        }

        nodes[parent].children = children;
        Ok(())
    }

    /// 換算數量；不同族單位沿用原數值，其他錯誤照常返回
    fn convert_or_keep(&self, quantity: Decimal, from: &str, to: &str) -> Result<Decimal> {
        match self.converter.convert(quantity, from, to) {
            Err(BakeryError::IncompatibleUnit { .. }) => Ok(quantity),
            other => other,
        }
    }
}
