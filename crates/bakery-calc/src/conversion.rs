//! 單位換算

use bakery_core::{BakeryError, Result, UnitCatalog, UnitCategory};
use rust_decimal::Decimal;

/// 單位換算器
#[derive(Debug, Clone, Copy)]
pub struct UnitConverter<'a> {
    units: &'a UnitCatalog,
}

impl<'a> UnitConverter<'a> {
    /// 創建新的換算器
    pub fn new(units: &'a UnitCatalog) -> Self {
        Self { units }
    }

    /// 換算數量
    pub fn convert(&self, value: Decimal, from: &str, to: &str) -> Result<Decimal> {
        value
            .checked_mul(self.ratio(from, to)?)
            .ok_or_else(|| BakeryError::overflow(format!("{} {} → {}", value, from, to)))
    }

    /// 換算單價（每 from 單位的價格 → 每 to 單位的價格）
    ///
    /// 與數量換算方向相反：80/kg 換算為 g 得到 0.08/g。
    pub fn convert_price(&self, price: Decimal, from: &str, to: &str) -> Result<Decimal> {
        price
            .checked_mul(self.ratio(to, from)?)
            .ok_or_else(|| BakeryError::overflow(format!("單價 {}/{} → {}", price, from, to)))
    }

    /// 檢查兩個單位是否可互相換算
    pub fn is_compatible(&self, from: &str, to: &str) -> bool {
        self.ratio(from, to).is_ok()
    }

    /// 換算比率：1 個 from 單位等於多少 to 單位
    pub fn ratio(&self, from: &str, to: &str) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }

        let from_unit = self.units.get(from)?;
        let to_unit = self.units.get(to)?;

        if from_unit.family != to_unit.family {
            return Err(BakeryError::incompatible_unit(from, to));
        }

        let f = from_unit.factor;
        let t = to_unit.factor;

        let ratio = match (from_unit.category, to_unit.category) {
            (UnitCategory::Reference, UnitCategory::Reference) => Decimal::ONE,
            (UnitCategory::Reference, UnitCategory::Smaller) => t,
            (UnitCategory::Smaller, UnitCategory::Reference) => Decimal::ONE / f,
            (UnitCategory::Reference, UnitCategory::Larger) => Decimal::ONE / t,
            (UnitCategory::Larger, UnitCategory::Reference) => f,
            (UnitCategory::Smaller, UnitCategory::Larger) => Decimal::ONE / (f * t),
            (UnitCategory::Larger, UnitCategory::Smaller) => f * t,
            (UnitCategory::Smaller, UnitCategory::Smaller) => t / f,
            (UnitCategory::Larger, UnitCategory::Larger) => f / t,
        };

        Ok(ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bakery_core::MeasurementUnit;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn units() -> UnitCatalog {
        UnitCatalog::from_units(vec![
            MeasurementUnit::reference("kg", "weight"),
            MeasurementUnit::smaller("g", "weight", dec!(1000)),
            MeasurementUnit::smaller("mg", "weight", dec!(1000000)),
            MeasurementUnit::larger("t", "weight", dec!(1000)),
            MeasurementUnit::larger("sac", "weight", dec!(25)),
            MeasurementUnit::reference("l", "volume"),
            MeasurementUnit::smaller("ml", "volume", dec!(1000)),
        ])
        .unwrap()
    }

    #[rstest]
    #[case(dec!(2), "kg", "g", dec!(2000))]
    #[case(dec!(500), "g", "kg", dec!(0.5))]
    #[case(dec!(3), "kg", "t", dec!(0.003))]
    #[case(dec!(2), "t", "kg", dec!(2000))]
    #[case(dec!(1), "t", "g", dec!(1000000))]
    #[case(dec!(250000), "g", "t", dec!(0.25))]
    #[case(dec!(3), "g", "mg", dec!(3000))]
    #[case(dec!(2), "sac", "t", dec!(0.05))]
    #[case(dec!(1), "t", "sac", dec!(40))]
    #[case(dec!(3000), "mg", "g", dec!(3))]
    #[case(dec!(7), "kg", "kg", dec!(7))]
    fn test_convert(
        #[case] value: Decimal,
        #[case] from: &str,
        #[case] to: &str,
        #[case] expected: Decimal,
    ) {
        let units = units();
        let converter = UnitConverter::new(&units);

        assert_eq!(converter.convert(value, from, to).unwrap(), expected);
    }

    #[test]
    fn test_incompatible_families() {
        let units = units();
        let converter = UnitConverter::new(&units);

        assert_eq!(
            converter.convert(dec!(1), "kg", "l").unwrap_err(),
            BakeryError::incompatible_unit("kg", "l")
        );
        assert!(!converter.is_compatible("ml", "g"));
        assert!(converter.is_compatible("ml", "l"));
    }

    #[test]
    fn test_unknown_unit() {
        let units = units();
        let converter = UnitConverter::new(&units);

        assert!(matches!(
            converter.convert(dec!(1), "kg", "lb"),
            Err(BakeryError::UnknownUnit(_))
        ));
    }

    #[test]
    fn test_convert_price() {
        let units = units();
        let converter = UnitConverter::new(&units);

        // 80 / kg → 0.08 / g
        assert_eq!(converter.convert_price(dec!(80), "kg", "g").unwrap(), dec!(0.08));
        // 0.5 / g → 500 / kg
        assert_eq!(converter.convert_price(dec!(0.5), "g", "kg").unwrap(), dec!(500));
    }
}
