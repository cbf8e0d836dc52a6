/// Decimal normalization for purchase settlement
///
/// Payment tokens carry their own decimal precision; the sale token has
/// another. Conversion widens to `Uint256` so intermediate products cannot
/// wrap, divides once so the result is floored exactly once, and narrows
/// back to `Uint128` at the end.
use cosmwasm_std::{Uint128, Uint256};

use crate::error::Error;
use crate::rates::ExchangeRate;

/// Denominator for basis-point calculations.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Convert a payment amount into sale-token smallest units.
///
/// `sale = payment * rate.output / rate.input * 10^(sale_decimals - payment_decimals)`,
/// truncating any fractional remainder. Fails with `ArithmeticOverflow` when
/// the result does not fit the 128-bit amount range.
pub fn to_sale_amount(
    payment_amount: Uint128,
    rate: &ExchangeRate,
    sale_decimals: u8,
) -> Result<Uint128, Error> {
    if rate.input.is_zero() {
        return Err(Error::InvalidArguments(
            "exchange rate input units must be positive".to_string(),
        ));
    }

    let scaled = payment_amount.full_mul(rate.output);

    // Fold the decimal shift into the numerator or the divisor so the
    // flooring division happens exactly once.
    let (numerator, divisor) = if sale_decimals >= rate.payment_decimals {
        let shift = pow10((sale_decimals - rate.payment_decimals) as u32)?;
        let numerator = scaled
            .checked_mul(shift)
            .map_err(|_| Error::ArithmeticOverflow)?;
        (numerator, Uint256::from(rate.input))
    } else {
        let shift = pow10((rate.payment_decimals - sale_decimals) as u32)?;
        let divisor = Uint256::from(rate.input)
            .checked_mul(shift)
            .map_err(|_| Error::ArithmeticOverflow)?;
        (scaled, divisor)
    };

    let sale = numerator
        .checked_div(divisor)
        .map_err(|_| Error::ArithmeticOverflow)?;
    Uint128::try_from(sale).map_err(|_| Error::ArithmeticOverflow)
}

/// Compute a referral bonus as `floor(sale_amount * bips / 10_000)`.
pub fn referral_bonus(sale_amount: Uint128, bips: u16) -> Result<Uint128, Error> {
    let bonus = sale_amount
        .full_mul(Uint128::from(bips))
        .checked_div(Uint256::from(BPS_DENOMINATOR))
        .map_err(|_| Error::ArithmeticOverflow)?;
    Uint128::try_from(bonus).map_err(|_| Error::ArithmeticOverflow)
}

fn pow10(exp: u32) -> Result<Uint256, Error> {
    Uint256::from(10u64)
        .checked_pow(exp)
        .map_err(|_| Error::ArithmeticOverflow)
}
