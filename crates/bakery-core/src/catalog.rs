//! 主檔快照（計量單位 + 物料 + 配方）
//!
//! 一次計算（展開、成本、可用量檢查）只讀取同一份快照，
//! 遞迴過程中看到的庫存與單位保持一致。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Article, BakeryError, Recipe, Result, UnitCatalog};

/// 主檔快照
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    units: UnitCatalog,
    articles: BTreeMap<String, Article>,
}

impl Catalog {
    /// 創建新的快照
    pub fn new(units: UnitCatalog) -> Self {
        Self {
            units,
            articles: BTreeMap::new(),
        }
    }

    /// 建構器模式：添加物料
    pub fn with_article(mut self, article: Article) -> Self {
        self.insert_article(article);
        self
    }

    /// 新增或取代物料
    pub fn insert_article(&mut self, article: Article) {
        self.articles.insert(article.id.clone(), article);
    }

    pub fn units(&self) -> &UnitCatalog {
        &self.units
    }

    /// 查詢物料
    pub fn article(&self, article_id: &str) -> Result<&Article> {
        self.articles
            .get(article_id)
            .ok_or_else(|| BakeryError::ArticleNotFound(article_id.to_string()))
    }

    /// 查詢物料的配方
    pub fn recipe_for(&self, article_id: &str) -> Result<&Recipe> {
        self.article(article_id)?
            .recipe()
            .ok_or_else(|| BakeryError::RecipeNotFound(article_id.to_string()))
    }

    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.articles.values()
    }

    /// 現有庫存
    pub fn stock(&self, article_id: &str) -> Result<Decimal> {
        Ok(self.article(article_id)?.current_stock)
    }

    /// 調整庫存，返回調整後庫存
    ///
    /// 不允許負庫存時，扣減結果截斷為 0。
    pub fn adjust_stock(
        &mut self,
        article_id: &str,
        delta: Decimal,
        allow_negative: bool,
    ) -> Result<Decimal> {
        let article = self
            .articles
            .get_mut(article_id)
            .ok_or_else(|| BakeryError::ArticleNotFound(article_id.to_string()))?;

        let mut next = article.current_stock + delta;
        if !allow_negative && next < Decimal::ZERO {
            next = Decimal::ZERO;
        }
        article.current_stock = next;
        Ok(next)
    }

    /// 驗證主檔：單位目錄、物料單位、配方引用
    pub fn validate(&self) -> Result<()> {
        self.units.validate()?;

        for article in self.articles.values() {
            self.units.get(&article.native_unit)?;

            let Some(recipe) = article.recipe() else {
                continue;
            };

            if recipe.produced_article_id != article.id {
                return Err(BakeryError::validation(format!(
                    "配方 {} 的成品為 {}，但掛在物料 {} 上",
                    recipe.id, recipe.produced_article_id, article.id
                )));
            }
            if recipe.base_quantity <= Decimal::ZERO {
                return Err(BakeryError::validation(format!(
                    "配方 {} 的基準產量必須大於 0",
                    recipe.id
                )));
            }
            self.units.get(&recipe.base_unit)?;

            for ingredient in &recipe.ingredients {
                self.article(&ingredient.component_article_id)?;
                self.units.get(&ingredient.unit)?;
            }
        }

        Ok(())
    }
}
