//! 測試用主檔

use bakery_core::{Article, Catalog, MeasurementUnit, Recipe, UnitCatalog};
use rust_decimal_macros::dec;

pub(crate) fn units() -> UnitCatalog {
    UnitCatalog::from_units(vec![
        MeasurementUnit::reference("kg", "weight"),
        MeasurementUnit::smaller("g", "weight", dec!(1000)),
        MeasurementUnit::reference("pc", "count"),
        MeasurementUnit::reference("u", "portion"),
    ])
    .unwrap()
}

/// 可頌 = 0.5 kg 麵粉 + 1 份發酵麵團（每 10 個）；發酵麵團 = 5 kg 麵粉 + 0.1 kg 酵母（每 5 kg）
pub(crate) fn croissant_catalog() -> Catalog {
    let pate = Recipe::new("R-PATE", "PATE-LEVEE", dec!(5), "kg")
        .with_ingredient("FLOUR", dec!(5), "kg")
        .with_ingredient("YEAST", dec!(0.1), "kg");
    let croissant = Recipe::new("R-CROISSANT", "CROISSANT", dec!(10), "pc")
        .with_ingredient("FLOUR", dec!(0.5), "kg")
        .with_ingredient("PATE-LEVEE", dec!(1), "u");

    Catalog::new(units())
        .with_article(
            Article::ingredient("FLOUR", "kg", dec!(80))
                .with_stock(dec!(10))
                .with_stock_limits(dec!(5), dec!(20)),
        )
        .with_article(Article::ingredient("YEAST", "kg", dec!(500)).with_stock(dec!(1)))
        .with_article(Article::product("PATE-LEVEE", "u", Some(pate)).with_stock(dec!(5)))
        .with_article(Article::product("CROISSANT", "pc", Some(croissant)))
}
