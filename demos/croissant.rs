//! # 可頌生產範例
//!
//! 展示完整的生產流程：
//! - 配方展開與成本
//! - 排程預留、開工檢查
//! - 完工消耗與低庫存告警
//! - 餘量工單

use bakery::prelude::*;
use chrono::NaiveDate;
use rust_decimal::Decimal;

fn main() -> Result<()> {
    bakery::init_tracing();

    println!("🥐 ===== 可頌生產範例 =====");
    println!();

    // ========== 1. 建立主檔 ==========
    println!("📦 步驟 1: 建立單位與物料主檔");
    let catalog = create_catalog()?;
    println!("   ✓ 單位數: {}", catalog.units().len());
    println!("   ✓ 物料數: {}", catalog.articles().count());
    println!();

    let config = ProductionConfig::default();
    let engine = ProductionEngine::new(catalog, config)?;

    // ========== 2. 配方展開 ==========
    println!("🔧 步驟 2: 展開 20 個可頌");
    let tree = engine.explode("CROISSANT", Decimal::from(20))?;
    for node in tree.iter() {
        println!(
            "   {}{} {} {}",
            "  ".repeat(node.depth),
            node.article_id,
            node.required_quantity,
            node.required_unit
        );
    }
    println!();

    // ========== 3. 成本 ==========
    println!("💰 步驟 3: 成本彙總");
    let report = engine.cost_report(&tree)?;
    for line in &report.lines {
        println!(
            "   {:<10} {:>8} {:<3} × {:>8} = {:>8}",
            line.article_id, line.quantity, line.unit, line.unit_price, line.cost
        );
    }
    println!("   總成本: {} DA（每個 {} DA）", report.total, report.unit_cost.round_dp(2));
    println!();

    // ========== 4. 排程與開工 ==========
    println!("📅 步驟 4: 建立工單並排程");
    let date = NaiveDate::from_ymd_opt(2025, 11, 20)
        .ok_or_else(|| BakeryError::validation("無效的排程日期"))?;
    let operation = ProductionOperation::new_preparation()
        .with_scheduled_date(date)
        .with_item(
            OperationItem::new("CROISSANT", Decimal::from(20))
                .with_source_ref("SO-42:1".to_string()),
        );
    let operation = engine.create_operation(operation)?;

    let outcome = engine.transition(
        operation.id,
        OperationEvent::Schedule {
            scheduled_date: None,
        },
    )?;
    for reservation in &outcome.reservations {
        println!("   ✓ 預留 {} {}", reservation.article_id, reservation.reserved_quantity);
    }

    // ========== 5. 餘量工單 ==========
    let reliquat = engine.create_reliquat(operation.id, Decimal::from(5))?;
    println!("   ✓ 餘量工單 {} ({})", reliquat.id, reliquat.total_planned());
    println!();

    println!("🚀 步驟 5: 開工");
    engine.transition(operation.id, OperationEvent::Launch)?;
    println!("   ✓ 開工成功");
    println!();

    // ========== 6. 完工 ==========
    println!("✅ 步驟 6: 完工（18 個合格）");
    let outcome = engine.transition(
        operation.id,
        OperationEvent::Complete {
            conform_quantity: Decimal::from(18),
            waste_reason: Some("烤焦 2 個".to_string()),
        },
    )?;

    if let Some(consumption) = &outcome.consumption {
        for movement in &consumption.debited {
            println!(
                "   - {} {}: {} → {}",
                movement.article_id, movement.quantity, movement.before, movement.after
            );
        }
        for movement in &consumption.produced {
            println!(
                "   + {} {}: {} → {}",
                movement.article_id, movement.quantity, movement.before, movement.after
            );
        }
        for alert in &consumption.alerts {
            println!(
                "   ⚠ {} 低於最低庫存 {}，建議補貨 {}",
                alert.article_id, alert.min_stock, alert.replenishment
            );
        }
    }

    Ok(())
}

fn create_catalog() -> Result<Catalog> {
    let units = UnitCatalog::from_units(vec![
        MeasurementUnit::reference("kg", "weight").with_abbreviation("kg"),
        MeasurementUnit::smaller("g", "weight", Decimal::from(1000)).with_abbreviation("g"),
        MeasurementUnit::reference("pc", "count").with_abbreviation("pc"),
        MeasurementUnit::reference("u", "portion").with_abbreviation("u"),
    ])?;

    let pate_levee = Recipe::new("R-PATE", "PATE-LEVEE", Decimal::from(5), "kg")
        .with_ingredient("FLOUR", Decimal::from(5), "kg")
        .with_ingredient("YEAST", Decimal::new(100, 0), "g")
        .with_operation("pétrissage", Some(20))
        .with_operation("pointage", Some(90));

    let croissant = Recipe::new("R-CROISSANT", "CROISSANT", Decimal::from(10), "pc")
        .with_ingredient("FLOUR", Decimal::new(5, 1), "kg")
        .with_ingredient("PATE-LEVEE", Decimal::ONE, "u")
        .with_operation("tourage", Some(45))
        .with_operation("cuisson", Some(18));

    Ok(Catalog::new(units)
        .with_article(
            Article::ingredient("FLOUR", "kg", Decimal::from(80))
                .with_name("Farine T45")
                .with_stock(Decimal::from(5))
                .with_stock_limits(Decimal::from(3), Decimal::from(25)),
        )
        .with_article(
            Article::ingredient("YEAST", "kg", Decimal::from(500))
                .with_name("Levure")
                .with_stock(Decimal::ONE),
        )
        .with_article(
            Article::product("PATE-LEVEE", "u", Some(pate_levee))
                .with_name("Pâte levée")
                .with_stock(Decimal::from(4)),
        )
        .with_article(Article::product("CROISSANT", "pc", Some(croissant)).with_name("Croissant")))
}
