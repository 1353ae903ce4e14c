use alloy::primitives::U256;
use fastnum::{
    UD256, bint,
    decimal::{Context, RoundingMode},
};

/// Native currency and ERC-20 amounts are 18-decimal fixed point.
pub const ETHER: Converter = Converter::new(18);

/// Gas prices are displayed in gwei.
pub const GWEI: Converter = Converter::new(9);

/// Fixed-point to decimal converter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub const fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    pub fn from_unsigned(&self, value: U256) -> UD256 {
        let unscaled = bint::UInt::<4>::from_le_slice(value.as_le_slice())
            .expect("Converter: U256 -> UInt::<4>");
        UD256::from_parts(
            unscaled,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }

    pub fn from_u128(&self, value: u128) -> UD256 {
        self.from_unsigned(U256::from(value))
    }
}
