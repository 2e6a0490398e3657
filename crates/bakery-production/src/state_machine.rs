//! 生產工單狀態機
//!
//! ```text
//! draft ──schedule──▶ programmed ──hold──▶ pending
//!                        │  ╲                │
//!                        │   mark_ready ─────┤──▶ ready
//!                        ╰──────launch───────┴──────┴──▶ in_progress ──complete──▶ completed
//! (任何非終態) ──cancel──▶ cancelled
//! ```
//!
//! 所有轉換都在同一把鎖內依「驗證 → 計算 → 套用」執行，
//! 任何一步失敗都不會留下部分寫入。

use bakery_calc::{
    AvailabilityChecker, AvailabilityReport, CostAggregator, CostReport, RecipeResolver,
    ResolvedTree,
};
use bakery_core::{
    BakeryError, Catalog, OperationItem, OperationStatus, ProductionConfig, ProductionOperation,
    Reservation, ReservationPolicy, Result,
};
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::ledger::{Consumption, ReservationLedger};

/// 工單事件
#[derive(Debug, Clone, PartialEq)]
pub enum OperationEvent {
    /// draft → programmed；未提供日期時沿用工單上的排程日期
    Schedule { scheduled_date: Option<NaiveDate> },
    /// programmed → pending
    Hold,
    /// programmed | pending → ready
    MarkReady,
    /// programmed | pending | ready → in_progress
    Launch,
    /// in_progress → completed
    Complete {
        conform_quantity: Decimal,
        waste_reason: Option<String>,
    },
    /// 任何非終態 → cancelled
    Cancel,
}

impl OperationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Schedule { .. } => "schedule",
            Self::Hold => "hold",
            Self::MarkReady => "mark_ready",
            Self::Launch => "launch",
            Self::Complete { .. } => "complete",
            Self::Cancel => "cancel",
        }
    }
}

/// 轉換結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionOutcome {
    /// 轉換後的工單
    pub operation: ProductionOperation,

    /// 轉換後工單仍持有的預留
    pub reservations: Vec<Reservation>,

    /// 轉換時釋放的預留
    pub released: Vec<Reservation>,

    /// 完工消耗（僅 complete）
    pub consumption: Option<Consumption>,
}

impl TransitionOutcome {
    fn new(operation: ProductionOperation, reservations: Vec<Reservation>) -> Self {
        Self {
            operation,
            reservations,
            released: Vec::new(),
            consumption: None,
        }
    }

    fn with_released(mut self, released: Vec<Reservation>) -> Self {
        self.released = released;
        self
    }
}

/// 受鎖保護的狀態
#[derive(Debug)]
struct EngineState {
    catalog: Catalog,
    ledger: ReservationLedger,
    operations: BTreeMap<Uuid, ProductionOperation>,
}

impl EngineState {
    fn operation(&self, id: Uuid) -> Result<&ProductionOperation> {
        self.operations
            .get(&id)
            .ok_or(BakeryError::OperationNotFound(id))
    }

    /// 並行展開每個生產項目，結果順序與項目一致
    fn explode_items(
        &self,
        items: &[OperationItem],
        max_depth: usize,
    ) -> Result<Vec<ResolvedTree>> {
        let resolver = RecipeResolver::new(&self.catalog);
        items
            .par_iter()
            .map(|item| resolver.explode(&item.article_id, item.quantity, max_depth))
            .collect()
    }

    /// 以「庫存 − 其他工單預留」檢查
    fn check(&self, trees: &[ResolvedTree], excluding: Option<Uuid>) -> Result<AvailabilityReport> {
        let reserved = self.ledger.reserved_totals(excluding);
        AvailabilityChecker::new(&self.catalog, &reserved).check_all(trees)
    }

    fn store(&mut self, operation: &ProductionOperation) {
        self.operations.insert(operation.id, operation.clone());
    }
}

fn invalid(from: OperationStatus, event: &str) -> BakeryError {
    BakeryError::InvalidTransition {
        from,
        event: event.to_string(),
    }
}

/// 生產引擎
///
/// 持有物料主檔、預留帳與工單，可在多執行緒間共享（`Arc<ProductionEngine>`）。
#[derive(Debug)]
pub struct ProductionEngine {
    config: ProductionConfig,
    state: Mutex<EngineState>,
}

impl ProductionEngine {
    /// 創建生產引擎（驗證配置與主檔）
    pub fn new(catalog: Catalog, config: ProductionConfig) -> Result<Self> {
        config.validate()?;
        catalog.validate()?;

        tracing::info!(
            "生產引擎啟動: 最大展開層級 {}, 預留策略 {:?}",
            config.max_depth,
            config.reservation_policy
        );

        Ok(Self {
            config,
            state: Mutex::new(EngineState {
                catalog,
                ledger: ReservationLedger::new(),
                operations: BTreeMap::new(),
            }),
        })
    }

    pub fn config(&self) -> &ProductionConfig {
        &self.config
    }

    /// 主檔快照
    pub fn snapshot(&self) -> Catalog {
        self.state.lock().catalog.clone()
    }

    /// 展開配方
    pub fn explode(&self, article_id: &str, quantity: Decimal) -> Result<ResolvedTree> {
        let state = self.state.lock();
        RecipeResolver::new(&state.catalog).explode(article_id, quantity, self.config.max_depth)
    }

    /// 需求樹總成本
    pub fn cost(&self, tree: &ResolvedTree) -> Result<Decimal> {
        let state = self.state.lock();
        CostAggregator::new(&state.catalog).cost(tree)
    }

    /// 需求樹成本明細
    pub fn cost_report(&self, tree: &ResolvedTree) -> Result<CostReport> {
        let state = self.state.lock();
        CostAggregator::new(&state.catalog).breakdown(tree)
    }

    /// 以目前庫存與全部未結預留檢查需求樹
    pub fn check_availability(&self, tree: &ResolvedTree) -> Result<AvailabilityReport> {
        let state = self.state.lock();
        state.check(std::slice::from_ref(tree), None)
    }

    /// 現有庫存
    pub fn stock(&self, article_id: &str) -> Result<Decimal> {
        self.state.lock().catalog.stock(article_id)
    }

    /// 庫存調整（入庫為正、出庫為負），返回調整後庫存
    pub fn adjust_stock(&self, article_id: &str, delta: Decimal) -> Result<Decimal> {
        let mut state = self.state.lock();
        let after = state
            .catalog
            .adjust_stock(article_id, delta, self.config.allow_negative_stock)?;
        tracing::debug!("物料 {} 庫存調整 {} → {}", article_id, delta, after);
        Ok(after)
    }

    /// 物料的未結預留總量
    pub fn reserved_total(&self, article_id: &str) -> Decimal {
        self.state.lock().ledger.reserved_total(article_id)
    }

    /// 工單的預留
    pub fn reservations(&self, operation_id: Uuid) -> Vec<Reservation> {
        self.state.lock().ledger.reservations_for(operation_id).to_vec()
    }

    /// 查詢工單
    pub fn operation(&self, operation_id: Uuid) -> Result<ProductionOperation> {
        self.state.lock().operation(operation_id).cloned()
    }

    /// 全部工單
    pub fn operations(&self) -> Vec<ProductionOperation> {
        self.state.lock().operations.values().cloned().collect()
    }

    /// 登記新工單（必須為 draft）
    pub fn create_operation(&self, operation: ProductionOperation) -> Result<ProductionOperation> {
        let mut state = self.state.lock();

        if operation.status != OperationStatus::Draft {
            return Err(BakeryError::validation(format!(
                "新工單必須為 draft 狀態（目前 {}）",
                operation.status
            )));
        }
        if state.operations.contains_key(&operation.id) {
            return Err(BakeryError::conflict(format!("工單 {} 已存在", operation.id)));
        }
        if let Some(parent_id) = operation.parent_operation_id {
            state.operation(parent_id)?;
        }
        for item in &operation.items {
            state.catalog.recipe_for(&item.article_id)?;
        }

        let mut operation = operation;
        let items = std::mem::take(&mut operation.items);
        operation.replace_items(items);

        state.store(&operation);
        tracing::info!("建立工單 {} ({} 個生產項目)", operation.id, operation.items.len());

        Ok(operation)
    }

    /// 修改生產項目
    ///
    /// draft：僅檢查配方存在。programmed：重新展開並取代預留。
    pub fn update_items(
        &self,
        operation_id: Uuid,
        items: Vec<OperationItem>,
    ) -> Result<TransitionOutcome> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut operation = state.operation(operation_id)?.clone();

        if operation.status.is_terminal() {
            return Err(BakeryError::conflict(format!(
                "工單 {} 已結束（{}），不可修改",
                operation_id, operation.status
            )));
        }

        match operation.status {
            OperationStatus::Draft => {
                for item in &items {
                    state.catalog.recipe_for(&item.article_id)?;
                }
                operation.replace_items(items);
                state.store(&operation);
                Ok(TransitionOutcome::new(operation, Vec::new()))
            }
            OperationStatus::Programmed => {
                Self::validate_items(&items)?;
                operation.replace_items(items);
                if operation.is_reliquat() {
                    Self::validate_reliquat(state, &operation)?;
                }

                let trees = state.explode_items(&operation.items, self.config.max_depth)?;
                let report = state.check(&trees, Some(operation_id))?;
                self.enforce_on_schedule(operation_id, report)?;

                let reservations = state.ledger.reserve(operation_id, &trees);
                state.store(&operation);
                tracing::info!(
                    "工單 {} 修改生產項目，重新預留 {} 筆",
                    operation_id,
                    reservations.len()
                );

                Ok(TransitionOutcome::new(operation, reservations))
            }
            other => Err(invalid(other, "update_items")),
        }
    }

    /// 執行狀態轉換
    pub fn transition(
        &self,
        operation_id: Uuid,
        event: OperationEvent,
    ) -> Result<TransitionOutcome> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let operation = state.operation(operation_id)?.clone();
        let from = operation.status;

        if from.is_terminal() {
            return Err(BakeryError::conflict(format!(
                "工單 {} 已結束（{}），不接受 {}",
                operation_id,
                from,
                event.name()
            )));
        }

        let outcome = match event {
            OperationEvent::Schedule { scheduled_date } => {
                self.schedule(state, operation, scheduled_date)
            }
            OperationEvent::Hold => Self::hold(state, operation),
            OperationEvent::MarkReady => self.mark_ready(state, operation),
            OperationEvent::Launch => self.launch(state, operation),
            OperationEvent::Complete {
                conform_quantity,
                waste_reason,
            } => self.complete(state, operation, conform_quantity, waste_reason),
            OperationEvent::Cancel => Self::cancel(state, operation),
        }?;

        tracing::info!(
            "工單 {} 狀態轉換: {} → {}",
            operation_id,
            from,
            outcome.operation.status
        );

        Ok(outcome)
    }

    /// 由 programmed 母工單建立餘量工單（draft）
    ///
    /// 沿用母工單第一個生產項目的物料、需求來源與排程日期。
    /// 數量在排程（draft → programmed）時才檢查。
    pub fn create_reliquat(
        &self,
        parent_id: Uuid,
        quantity: Decimal,
    ) -> Result<ProductionOperation> {
        let mut state = self.state.lock();
        let parent = state.operation(parent_id)?;

        if parent.status.is_terminal() {
            return Err(BakeryError::conflict(format!(
                "母工單 {} 已結束（{}），不可建立餘量工單",
                parent_id, parent.status
            )));
        }
        if parent.status != OperationStatus::Programmed {
            return Err(invalid(parent.status, "create_reliquat"));
        }

        let seed = parent
            .items
            .first()
            .ok_or_else(|| {
                BakeryError::validation(format!("母工單 {} 沒有生產項目", parent_id))
            })?;

        let mut item = OperationItem::new(&seed.article_id, quantity);
        item.source_ref = seed.source_ref.clone();

        let mut child = ProductionOperation::new_reliquat(parent_id).with_item(item);
        child.scheduled_date = parent.scheduled_date;

        state.store(&child);
        tracing::info!("母工單 {} 建立餘量工單 {}: {}", parent_id, child.id, quantity);

        Ok(child)
    }

    // ========================================================================
    // 轉換
    // ========================================================================

    fn schedule(
        &self,
        state: &mut EngineState,
        mut operation: ProductionOperation,
        scheduled_date: Option<NaiveDate>,
    ) -> Result<TransitionOutcome> {
        if operation.status != OperationStatus::Draft {
            return Err(invalid(operation.status, "schedule"));
        }

        let scheduled_date = scheduled_date
            .or(operation.scheduled_date)
            .ok_or_else(|| {
                BakeryError::validation(format!("工單 {} 缺少排程日期", operation.id))
            })?;
        Self::validate_items(&operation.items)?;
        if operation.is_reliquat() {
            Self::validate_reliquat(state, &operation)?;
        }

        let trees = state.explode_items(&operation.items, self.config.max_depth)?;
        let report = state.check(&trees, Some(operation.id))?;
        self.enforce_on_schedule(operation.id, report)?;

        operation.scheduled_date = Some(scheduled_date);
        operation.status = OperationStatus::Programmed;
        let reservations = state.ledger.reserve(operation.id, &trees);
        state.store(&operation);

        Ok(TransitionOutcome::new(operation, reservations))
    }

    fn hold(
        state: &mut EngineState,
        mut operation: ProductionOperation,
    ) -> Result<TransitionOutcome> {
        if operation.status != OperationStatus::Programmed {
            return Err(invalid(operation.status, "hold"));
        }

        operation.status = OperationStatus::Pending;
        state.store(&operation);

        let reservations = state.ledger.reservations_for(operation.id).to_vec();
        Ok(TransitionOutcome::new(operation, reservations))
    }

    fn mark_ready(
        &self,
        state: &mut EngineState,
        mut operation: ProductionOperation,
    ) -> Result<TransitionOutcome> {
        if !matches!(
            operation.status,
            OperationStatus::Programmed | OperationStatus::Pending
        ) {
            return Err(invalid(operation.status, "mark_ready"));
        }

        let trees = state.explode_items(&operation.items, self.config.max_depth)?;
        let report = state.check(&trees, Some(operation.id))?;
        if !report.feasible {
            return Err(BakeryError::InsufficientStock(report.shortages));
        }

        operation.status = OperationStatus::Ready;
        state.store(&operation);

        let reservations = state.ledger.reservations_for(operation.id).to_vec();
        Ok(TransitionOutcome::new(operation, reservations))
    }

    fn launch(
        &self,
        state: &mut EngineState,
        mut operation: ProductionOperation,
    ) -> Result<TransitionOutcome> {
        if !matches!(
            operation.status,
            OperationStatus::Programmed | OperationStatus::Pending | OperationStatus::Ready
        ) {
            return Err(invalid(operation.status, "launch"));
        }

        // 自身預留不視為佔用
        let trees = state.explode_items(&operation.items, self.config.max_depth)?;
        let report = state.check(&trees, Some(operation.id))?;
        if !report.feasible {
            tracing::warn!(
                "工單 {} 開工失敗，短缺物料: {:?}",
                operation.id,
                report.short_articles()
            );
            return Err(BakeryError::InsufficientStock(report.shortages));
        }

        operation.status = OperationStatus::InProgress;
        operation.started_at = Some(Utc::now());

        let released = match self.config.reservation_policy {
            ReservationPolicy::HoldUntilCompletion => Vec::new(),
            ReservationPolicy::ReleaseOnLaunch => state.ledger.release(operation.id),
        };
        state.store(&operation);

        let reservations = state.ledger.reservations_for(operation.id).to_vec();
        Ok(TransitionOutcome::new(operation, reservations).with_released(released))
    }

    fn complete(
        &self,
        state: &mut EngineState,
        mut operation: ProductionOperation,
        conform_quantity: Decimal,
        waste_reason: Option<String>,
    ) -> Result<TransitionOutcome> {
        if operation.status != OperationStatus::InProgress {
            return Err(invalid(operation.status, "complete"));
        }

        let planned = operation.total_planned();
        if conform_quantity < Decimal::ZERO || conform_quantity > planned {
            return Err(BakeryError::validation(format!(
                "合格數量 {} 必須介於 0 與計劃數量 {} 之間",
                conform_quantity, planned
            )));
        }

        let waste_reason = waste_reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());
        if conform_quantity < planned && waste_reason.is_none() {
            return Err(BakeryError::validation(format!(
                "合格數量 {} 小於計劃數量 {}，必須填寫報廢原因",
                conform_quantity, planned
            )));
        }

        let trees = state.explode_items(&operation.items, self.config.max_depth)?;
        let consumption = state.ledger.consume(
            &mut state.catalog,
            operation.id,
            &trees,
            conform_quantity,
            self.config.allow_negative_stock,
        )?;

        for (item, movement) in operation.items.iter_mut().zip(&consumption.produced) {
            item.quantity_before = Some(movement.before);
            item.quantity_after = Some(movement.after);
        }
        operation.conform_quantity = Some(conform_quantity);
        operation.waste_reason = waste_reason;
        operation.completed_at = Some(Utc::now());
        operation.status = OperationStatus::Completed;
        state.store(&operation);

        if !consumption.alerts.is_empty() {
            tracing::warn!(
                "工單 {} 完工後 {} 個物料低於最低庫存",
                operation.id,
                consumption.alerts.len()
            );
        }

        let released = consumption.released.clone();
        Ok(TransitionOutcome {
            operation,
            reservations: Vec::new(),
            released,
            consumption: Some(consumption),
        })
    }

    fn cancel(
        state: &mut EngineState,
        mut operation: ProductionOperation,
    ) -> Result<TransitionOutcome> {
        let released = state.ledger.release(operation.id);

        operation.status = OperationStatus::Cancelled;
        state.store(&operation);

        Ok(TransitionOutcome::new(operation, Vec::new()).with_released(released))
    }

    // ========================================================================
    // 驗證
    // ========================================================================

    fn validate_items(items: &[OperationItem]) -> Result<()> {
        if items.is_empty() {
            return Err(BakeryError::validation("工單沒有生產項目"));
        }
        if let Some(item) = items.iter().find(|i| i.quantity <= Decimal::ZERO) {
            return Err(BakeryError::validation(format!(
                "生產項目 {} 的數量必須大於 0（目前 {}）",
                item.article_id, item.quantity
            )));
        }
        Ok(())
    }

    /// 餘量工單的數量必須小於母工單計劃數量
    fn validate_reliquat(state: &EngineState, operation: &ProductionOperation) -> Result<()> {
        let parent_id = operation.parent_operation_id.ok_or_else(|| {
            BakeryError::validation(format!("餘量工單 {} 缺少母工單", operation.id))
        })?;
        let parent = state.operation(parent_id)?;

        let quantity = operation.total_planned();
        let parent_quantity = parent.total_planned();
        if quantity >= parent_quantity {
            return Err(BakeryError::validation(format!(
                "餘量工單數量 {} 必須小於母工單計劃數量 {}",
                quantity, parent_quantity
            )));
        }
        Ok(())
    }

    /// 排程時的庫存檢查：依配置拒絕或僅警告
    fn enforce_on_schedule(&self, operation_id: Uuid, report: AvailabilityReport) -> Result<()> {
        if report.feasible {
            return Ok(());
        }
        if self.config.check_stock_on_schedule {
            return Err(BakeryError::InsufficientStock(report.shortages));
        }
        tracing::warn!(
            "工單 {} 排程時庫存不足，仍保留預留: {:?}",
            operation_id,
            report.short_articles()
        );
        Ok(())
    }
}
