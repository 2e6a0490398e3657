//! 生產工單模型

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 工單類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// 一般備料生產
    Preparation,
    /// 餘量（reliquat）工單：補足母工單剩餘部分
    PreparationReliquat,
}

/// 工單狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Draft,
    Programmed,
    Pending,
    Ready,
    InProgress,
    Completed,
    Cancelled,
}

impl OperationStatus {
    /// 終態（completed / cancelled）不接受任何轉換
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Programmed => "programmed",
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 生產工單
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOperation {
    /// 工單ID
    pub id: Uuid,

    pub kind: OperationKind,

    pub status: OperationStatus,

    /// 母工單（僅 reliquat）
    pub parent_operation_id: Option<Uuid>,

    /// 排程日期
    pub scheduled_date: Option<NaiveDate>,

    /// 開工時間
    pub started_at: Option<DateTime<Utc>>,

    /// 完工時間
    pub completed_at: Option<DateTime<Utc>>,

    /// 合格數量（完工時填寫）
    pub conform_quantity: Option<Decimal>,

    /// 報廢原因（合格數量小於計劃數量時必填）
    pub waste_reason: Option<String>,

    /// 生產項目
    pub items: Vec<OperationItem>,
}

impl ProductionOperation {
    /// 創建新的備料工單（draft）
    pub fn new_preparation() -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: OperationKind::Preparation,
            status: OperationStatus::Draft,
            parent_operation_id: None,
            scheduled_date: None,
            started_at: None,
            completed_at: None,
            conform_quantity: None,
            waste_reason: None,
            items: Vec::new(),
        }
    }

    /// 創建餘量工單（draft）
    pub fn new_reliquat(parent_operation_id: Uuid) -> Self {
        Self {
            kind: OperationKind::PreparationReliquat,
            parent_operation_id: Some(parent_operation_id),
            ..Self::new_preparation()
        }
    }

    /// 建構器模式：設置排程日期
    pub fn with_scheduled_date(mut self, date: NaiveDate) -> Self {
        self.scheduled_date = Some(date);
        self
    }

    /// 建構器模式：添加生產項目
    pub fn with_item(mut self, item: OperationItem) -> Self {
        self.add_item(item);
        self
    }

    /// 添加生產項目
    pub fn add_item(&mut self, mut item: OperationItem) {
        item.operation_id = self.id;
        self.items.push(item);
    }

    /// 取代全部生產項目
    pub fn replace_items(&mut self, items: Vec<OperationItem>) {
        self.items.clear();
        for item in items {
            self.add_item(item);
        }
    }

    /// 計劃總量
    pub fn total_planned(&self) -> Decimal {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_reliquat(&self) -> bool {
        self.kind == OperationKind::PreparationReliquat
    }
}

/// 工單生產項目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationItem {
    pub operation_id: Uuid,

    /// 成品物料ID（必須有配方）
    pub article_id: String,

    /// 計劃數量
    pub quantity: Decimal,

    /// 完工入庫前庫存
    pub quantity_before: Option<Decimal>,

    /// 完工入庫後庫存
    pub quantity_after: Option<Decimal>,

    /// 需求來源（如銷售訂單行）
    pub source_ref: Option<String>,
}

impl OperationItem {
    /// 創建新的生產項目
    pub fn new(article_id: &str, quantity: Decimal) -> Self {
        Self {
            operation_id: Uuid::nil(),
            article_id: article_id.to_string(),
            quantity,
            quantity_before: None,
            quantity_after: None,
            source_ref: None,
        }
    }

    /// 建構器模式：設置需求來源
    pub fn with_source_ref(mut self, source_ref: String) -> Self {
        self.source_ref = Some(source_ref);
        self
    }
}
