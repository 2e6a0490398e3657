//! 集成測試

use bakery::prelude::*;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::thread;
use uuid::Uuid;

/// 可頌與發酵麵團主檔
fn bakery_catalog(flour: Decimal, pate: Decimal) -> Catalog {
    let units = UnitCatalog::from_units(vec![
        MeasurementUnit::reference("kg", "weight"),
        MeasurementUnit::smaller("g", "weight", dec!(1000)),
        MeasurementUnit::reference("pc", "count"),
        MeasurementUnit::larger("dozen", "count", dec!(12)),
        MeasurementUnit::reference("u", "portion"),
    ])
    .unwrap();

    let pate_levee = Recipe::new("R-PATE", "PATE-LEVEE", dec!(5), "kg")
        .with_ingredient("FLOUR", dec!(5), "kg")
        .with_ingredient("YEAST", dec!(0.1), "kg")
        .with_operation("pétrissage", Some(20))
        .with_operation("pointage", Some(90));
    let croissant = Recipe::new("R-CROISSANT", "CROISSANT", dec!(10), "pc")
        .with_ingredient("FLOUR", dec!(0.5), "kg")
        .with_ingredient("PATE-LEVEE", dec!(1), "u");

    Catalog::new(units)
        .with_article(
            Article::ingredient("FLOUR", "kg", dec!(80))
                .with_name("Farine T45")
                .with_stock(flour)
                .with_stock_limits(dec!(2), dec!(25)),
        )
        .with_article(Article::ingredient("YEAST", "kg", dec!(500)).with_stock(dec!(1)))
        .with_article(Article::product("PATE-LEVEE", "u", Some(pate_levee)).with_stock(pate))
        .with_article(Article::product("CROISSANT", "pc", Some(croissant)).with_name("Croissant"))
}

fn engine_with(config: ProductionConfig) -> ProductionEngine {
    ProductionEngine::new(bakery_catalog(dec!(20), dec!(10)), config).unwrap()
}

fn scheduled_operation(engine: &ProductionEngine, quantity: Decimal) -> Uuid {
    let op = ProductionOperation::new_preparation()
        .with_scheduled_date(NaiveDate::from_ymd_opt(2025, 11, 20).unwrap())
        .with_item(OperationItem::new("CROISSANT", quantity));
    let id = engine.create_operation(op).unwrap().id;
    engine
        .transition(id, OperationEvent::Schedule { scheduled_date: None })
        .unwrap();
    id
}

#[test]
fn test_croissant_explosion_and_cost() {
    // 20 個可頌：比例 2 → 麵粉 1 kg、半成品 2 份 → 比例 0.4 → 麵粉 2 kg、酵母 0.04 kg
    let catalog = bakery_catalog(dec!(20), dec!(10));
    let tree = RecipeResolver::new(&catalog)
        .explode("CROISSANT", dec!(20), 5)
        .unwrap();

    let root = tree.root();
    assert_eq!(root.required_quantity, dec!(20));
    assert_eq!(tree.children(tree.root_id()).count(), 2);
    assert_eq!(tree.depth(), 2);

    let requirements = tree.requirements();
    assert_eq!(requirements["FLOUR"], dec!(3));
    assert_eq!(requirements["PATE-LEVEE"], dec!(2));
    assert_eq!(requirements["YEAST"], dec!(0.04));

    // 80 + (160 + 20)
    let cost = CostAggregator::new(&catalog).cost(&tree).unwrap();
    assert_eq!(cost, dec!(260));

    let report = CostAggregator::new(&catalog).breakdown(&tree).unwrap();
    assert_eq!(report.total, dec!(260));
    assert_eq!(report.unit_cost, dec!(13));
    assert_eq!(report.lines.len(), 3);
}

#[test]
fn test_cost_through_engine_matches_snapshot() {
    let engine = engine_with(ProductionConfig::default());
    let tree = engine.explode("CROISSANT", dec!(40)).unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(
        engine.cost(&tree).unwrap(),
        CostAggregator::new(&snapshot).cost(&tree).unwrap()
    );
    assert_eq!(engine.cost(&tree).unwrap(), dec!(520));
}

#[test]
fn test_waste_reason_required_for_partial_completion() {
    let engine = engine_with(ProductionConfig::default());
    let id = scheduled_operation(&engine, dec!(50));
    engine.transition(id, OperationEvent::Launch).unwrap();

    let err = engine
        .transition(
            id,
            OperationEvent::Complete {
                conform_quantity: dec!(40),
                waste_reason: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, BakeryError::Validation(_)));
    assert_eq!(engine.operation(id).unwrap().status, OperationStatus::InProgress);

    let outcome = engine
        .transition(
            id,
            OperationEvent::Complete {
                conform_quantity: dec!(40),
                waste_reason: Some("feuilletage raté".to_string()),
            },
        )
        .unwrap();
    assert_eq!(outcome.operation.status, OperationStatus::Completed);
    assert_eq!(engine.stock("CROISSANT").unwrap(), dec!(40));

    // 50 個可頌：麵粉 2.5 + 5，酵母 0.1，半成品 5
    assert_eq!(engine.stock("FLOUR").unwrap(), dec!(12.5));
    assert_eq!(engine.stock("YEAST").unwrap(), dec!(0.9));
    assert_eq!(engine.stock("PATE-LEVEE").unwrap(), dec!(5));
}

#[test]
fn test_reliquat_larger_than_parent_rejected_on_schedule() {
    let engine = engine_with(ProductionConfig::default());
    let parent = scheduled_operation(&engine, dec!(50));

    let child = engine.create_reliquat(parent, dec!(60)).unwrap();
    assert_eq!(child.kind, OperationKind::PreparationReliquat);
    assert_eq!(child.status, OperationStatus::Draft);

    let err = engine
        .transition(child.id, OperationEvent::Schedule { scheduled_date: None })
        .unwrap_err();
    assert!(matches!(err, BakeryError::Validation(_)));
    assert_eq!(engine.operation(child.id).unwrap().status, OperationStatus::Draft);
    assert!(engine.reservations(child.id).is_empty());

    let smaller = engine.create_reliquat(parent, dec!(10)).unwrap();
    let outcome = engine
        .transition(smaller.id, OperationEvent::Schedule { scheduled_date: None })
        .unwrap();
    assert_eq!(outcome.operation.status, OperationStatus::Programmed);
}

#[test]
fn test_launch_with_shortfall_lists_article() {
    let engine = engine_with(ProductionConfig::default());
    let id = scheduled_operation(&engine, dec!(20));

    // 酵母被其他用途領走
    engine.adjust_stock("YEAST", dec!(-0.99)).unwrap();

    let err = engine.transition(id, OperationEvent::Launch).unwrap_err();
    let short: Vec<&str> = err.shortages().iter().map(|s| s.article_id.as_str()).collect();
    assert_eq!(short, vec!["YEAST"]);
    assert_eq!(err.shortages()[0].shortfall, dec!(0.03));
    assert!(err.to_string().contains("YEAST"));

    // 狀態與預留保持不變
    assert_eq!(engine.operation(id).unwrap().status, OperationStatus::Programmed);
    assert_eq!(engine.reserved_total("YEAST"), dec!(0.04));
}

#[test]
fn test_sub_unit_ingredient_scales() {
    let units = UnitCatalog::from_units(vec![
        MeasurementUnit::reference("kg", "weight"),
        MeasurementUnit::smaller("g", "weight", dec!(1000)),
        MeasurementUnit::reference("pc", "count"),
        MeasurementUnit::larger("dozen", "count", dec!(12)),
    ])
    .unwrap();
    let recipe = Recipe::new("R-MADELEINE", "MADELEINE", dec!(1), "dozen")
        .with_ingredient("BUTTER", dec!(150), "g")
        .with_ingredient("EGG", dec!(3), "pc");
    let catalog = Catalog::new(units)
        .with_article(Article::ingredient("BUTTER", "kg", dec!(900)).with_stock(dec!(1)))
        .with_article(Article::ingredient("EGG", "pc", dec!(25)).with_stock(dec!(30)))
        .with_article(Article::product("MADELEINE", "pc", Some(recipe)));

    let tree = RecipeResolver::new(&catalog)
        .explode("MADELEINE", dec!(4), 5)
        .unwrap();
    assert_eq!(tree.root().native_quantity, dec!(48));

    let requirements = tree.requirements();
    assert_eq!(requirements["BUTTER"], dec!(0.6));
    assert_eq!(requirements["EGG"], dec!(12));

    // 600 g × 0.9 + 12 × 25
    assert_eq!(CostAggregator::new(&catalog).cost(&tree).unwrap(), dec!(840));
}

#[test]
fn test_cyclic_recipe_detected() {
    let units = UnitCatalog::from_units(vec![MeasurementUnit::reference("kg", "weight")]).unwrap();
    let a = Recipe::new("R-A", "A", dec!(1), "kg").with_ingredient("B", dec!(1), "kg");
    let b = Recipe::new("R-B", "B", dec!(1), "kg").with_ingredient("A", dec!(1), "kg");
    let catalog = Catalog::new(units)
        .with_article(Article::product("A", "kg", Some(a)))
        .with_article(Article::product("B", "kg", Some(b)));

    let err = RecipeResolver::new(&catalog).explode("A", dec!(1), 5).unwrap_err();
    assert!(matches!(err, BakeryError::CyclicRecipe { .. }));
}

#[test]
fn test_release_on_launch_frees_stock_for_others() {
    let config =
        ProductionConfig::from_json(r#"{ "reservation_policy": "ReleaseOnLaunch" }"#).unwrap();
    let engine = engine_with(config);

    let first = scheduled_operation(&engine, dec!(60));
    let second = scheduled_operation(&engine, dec!(40));
    assert_eq!(engine.reserved_total("PATE-LEVEE"), dec!(10));

    let launched = engine.transition(first, OperationEvent::Launch).unwrap();
    assert_eq!(launched.released.len(), 3);
    assert_eq!(engine.reserved_total("PATE-LEVEE"), dec!(4));

    // 第一張已釋放預留，但庫存尚未扣減
    let tree = engine.explode("CROISSANT", dec!(40)).unwrap();
    assert!(engine.check_availability(&tree).unwrap().feasible);
    engine.transition(second, OperationEvent::Launch).unwrap();
}

#[test]
fn test_completion_alerts_low_stock() {
    let engine =
        ProductionEngine::new(bakery_catalog(dec!(5), dec!(10)), ProductionConfig::default())
            .unwrap();
    let id = scheduled_operation(&engine, dec!(20));
    engine.transition(id, OperationEvent::Launch).unwrap();

    let outcome = engine
        .transition(
            id,
            OperationEvent::Complete {
                conform_quantity: dec!(20),
                waste_reason: None,
            },
        )
        .unwrap();

    // 麵粉 5 − 3 = 2，等於最低庫存不告警；再做一次就告警
    let consumption = outcome.consumption.unwrap();
    assert!(consumption.alerts.is_empty());

    let id = scheduled_operation(&engine, dec!(10));
    engine.transition(id, OperationEvent::Launch).unwrap();
    let outcome = engine
        .transition(
            id,
            OperationEvent::Complete {
                conform_quantity: dec!(10),
                waste_reason: None,
            },
        )
        .unwrap();
    let alerts = outcome.consumption.unwrap().alerts;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].article_id, "FLOUR");
    assert_eq!(alerts[0].current_stock, dec!(0.5));
    assert_eq!(alerts[0].replenishment, dec!(24.5));
}

#[test]
fn test_concurrent_scheduling_never_over_reserves() {
    bakery::init_tracing();

    let config = ProductionConfig::default().with_check_stock_on_schedule(true);
    let engine = Arc::new(engine_with(config));

    // 每張需要 6 kg 麵粉、4 份半成品；半成品庫存 10 只夠兩張
    let ids: Vec<Uuid> = (0..8)
        .map(|_| {
            let op = ProductionOperation::new_preparation()
                .with_scheduled_date(NaiveDate::from_ymd_opt(2025, 11, 21).unwrap())
                .with_item(OperationItem::new("CROISSANT", dec!(40)));
            engine.create_operation(op).unwrap().id
        })
        .collect();

    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine
                    .transition(id, OperationEvent::Schedule { scheduled_date: None })
                    .is_ok()
            })
        })
        .collect();

    let scheduled = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(scheduled, 2);
    assert_eq!(engine.reserved_total("PATE-LEVEE"), dec!(8));
    assert_eq!(engine.reserved_total("FLOUR"), dec!(12));

    let programmed = engine
        .operations()
        .into_iter()
        .filter(|op| op.status == OperationStatus::Programmed)
        .count();
    assert_eq!(programmed, 2);
}
