use rust_decimal::Decimal;

use super::domain::Unit;

/// How a quantity written in one unit maps onto a stock item kept in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Same unit; the amount is used as written.
    Identity,
    /// Mass or volume pair with a fixed factor.
    Scaled(Decimal),
    /// Units of different dimensions (mass, volume, pieces). The amount is used as written.
    PassThrough,
}

impl Conversion {
    /// Factor table keyed by `(from, to)`. Every pair is listed so that adding a unit forces a
    /// decision here.
    pub fn between(from: Unit, to: Unit) -> Self {
        let thousand = Decimal::from(1000);
        let thousandth = Decimal::new(1, 3);
        match (from, to) {
            (Unit::Kg, Unit::Kg)
            | (Unit::G, Unit::G)
            | (Unit::L, Unit::L)
            | (Unit::Ml, Unit::Ml)
            | (Unit::Pcs, Unit::Pcs) => Conversion::Identity,
            (Unit::G, Unit::Kg) | (Unit::Ml, Unit::L) => Conversion::Scaled(thousandth),
            (Unit::Kg, Unit::G) | (Unit::L, Unit::Ml) => Conversion::Scaled(thousand),
            (Unit::Kg | Unit::G, Unit::L | Unit::Ml | Unit::Pcs)
            | (Unit::L | Unit::Ml, Unit::Kg | Unit::G | Unit::Pcs)
            | (Unit::Pcs, Unit::Kg | Unit::G | Unit::L | Unit::Ml) => Conversion::PassThrough,
        }
    }

    /// `None` when the scaled amount does not fit in a `Decimal`.
    pub fn apply(self, amount: Decimal) -> Option<Decimal> {
        match self {
            Conversion::Identity | Conversion::PassThrough => Some(amount),
            Conversion::Scaled(factor) => amount
                .checked_mul(factor)
                .map(|scaled| scaled.normalize()),
        }
    }
}

/// Expresses `amount` (written in `from`) in the stock unit `to`.
pub fn convert(amount: Decimal, from: Unit, to: Unit) -> Option<Decimal> {
    Conversion::between(from, to).apply(amount)
}
