//! 生產引擎配置

use serde::{Deserialize, Serialize};

use crate::{BakeryError, Result};

/// 預設最大展開層級
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// 生產引擎配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    /// 配方最大展開層級
    pub max_depth: usize,

    /// 工單開工後的預留策略
    pub reservation_policy: ReservationPolicy,

    /// 是否允許負庫存
    /// - true: 消耗後庫存可為負值
    /// - false: 消耗後庫存截斷為 0（預設）
    pub allow_negative_stock: bool,

    /// 排程（draft → programmed）時是否要求庫存充足
    pub check_stock_on_schedule: bool,
}

impl ProductionConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            reservation_policy: ReservationPolicy::HoldUntilCompletion,
            allow_negative_stock: false,
            check_stock_on_schedule: false,
        }
    }

    /// 從 JSON 載入配置（缺少的欄位使用預設值）
    ///
    /// ```
    /// use bakery_core::{ProductionConfig, ReservationPolicy};
    ///
    /// let config = ProductionConfig::from_json(
    ///     r#"{ "max_depth": 3, "reservation_policy": "ReleaseOnLaunch" }"#,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(config.max_depth, 3);
    /// assert_eq!(config.reservation_policy, ReservationPolicy::ReleaseOnLaunch);
    /// assert!(!config.allow_negative_stock);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BakeryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 驗證配置
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(BakeryError::Config("max_depth 必須大於 0".to_string()));
        }
        Ok(())
    }

    /// 建構器模式：設置最大展開層級
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 建構器模式：設置預留策略
    pub fn with_reservation_policy(mut self, policy: ReservationPolicy) -> Self {
        self.reservation_policy = policy;
        self
    }

    /// 建構器模式：設置是否允許負庫存
    pub fn with_allow_negative_stock(mut self, allow: bool) -> Self {
        self.allow_negative_stock = allow;
        self
    }

    /// 建構器模式：設置排程時是否檢查庫存
    pub fn with_check_stock_on_schedule(mut self, check: bool) -> Self {
        self.check_stock_on_schedule = check;
        self
    }
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 預留策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationPolicy {
    /// 預留保留至完工時消耗（預設）
    HoldUntilCompletion,

    /// 開工時釋放預留，完工時直接扣庫存
    ReleaseOnLaunch,
}
