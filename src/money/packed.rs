// ============================================================================
// Packed Money Value
// Amount, currency and rounding context in the footprint of one Decimal
// ============================================================================
//
// `rust_decimal::Decimal` is four 32-bit words: flags, lo, mid, hi. The
// 96-bit coefficient lives in lo/mid/hi. The flags word only uses the scale
// (bits 16..23) and the sign (bit 31); the remaining 23 bits are always zero
// in a valid Decimal, so they can carry our own fields:
//
//   31  30      24 23     16 15                    0
//  +---+----------+---------+-----------------------+
//  | S |  context |  scale  |     currency code     |
//  +---+----------+---------+-----------------------+
//
// The decimal is rebuilt from the coefficient, scale and sign only; the
// currency and context bits are masked off first.

use crate::currency::CurrencyCode;
use crate::numeric::{MoneyError, MoneyResult, MAX_SCALE};
use rust_decimal::Decimal;
use std::fmt;

const SIGN_MASK: u32 = 0x8000_0000;
const SCALE_MASK: u32 = 0x00FF_0000;
const SCALE_SHIFT: u32 = 16;
const CURRENCY_MASK: u32 = 0x0000_FFFF;
const CONTEXT_SHIFT: u32 = 24;
const CONTEXT_MASK: u32 = 0x7F << CONTEXT_SHIFT;

/// Largest rounding context index that fits in the packed layout.
pub const MAX_CONTEXT_INDEX: u8 = 0x7F;

/// A decimal amount, a currency code and a rounding context index in 128 bits.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct PackedMoney {
    flags: u32,
    lo: u32,
    mid: u32,
    hi: u32,
}

impl PackedMoney {
    /// Pack `value` together with `currency` and `context_index`.
    ///
    /// # Errors
    /// Returns `OutOfRange` if `context_index` does not fit in 7 bits.
    pub fn pack(value: Decimal, currency: CurrencyCode, context_index: u8) -> MoneyResult<Self> {
        if context_index > MAX_CONTEXT_INDEX {
            return Err(MoneyError::out_of_range(
                "context_index",
                context_index.into(),
                0,
                MAX_CONTEXT_INDEX.into(),
            ));
        }
        Ok(Self::pack_unchecked(value, currency, context_index))
    }

    /// Pack with an index already known to fit (e.g. one issued by a registry).
    #[inline]
    pub(crate) fn pack_unchecked(
        value: Decimal,
        currency: CurrencyCode,
        context_index: u8,
    ) -> Self {
        let [flags, lo, mid, hi] = decimal_words(value);
        let flags = (flags & (SIGN_MASK | SCALE_MASK))
            | u32::from(currency.raw())
            | ((u32::from(context_index) << CONTEXT_SHIFT) & CONTEXT_MASK);
        Self { flags, lo, mid, hi }
    }

    /// Split back into the decimal value, currency code and context index.
    #[inline]
    pub fn unpack(self) -> (Decimal, CurrencyCode, u8) {
        (self.amount(), self.currency(), self.context_index())
    }

    /// The decimal value, independent of the currency and context bits.
    #[inline]
    pub fn amount(self) -> Decimal {
        let negative = self.flags & SIGN_MASK != 0;
        Decimal::from_parts(self.lo, self.mid, self.hi, negative, self.scale())
    }

    #[inline]
    pub fn currency(self) -> CurrencyCode {
        CurrencyCode::from_raw((self.flags & CURRENCY_MASK) as u16)
    }

    #[inline]
    pub fn context_index(self) -> u8 {
        ((self.flags & CONTEXT_MASK) >> CONTEXT_SHIFT) as u8
    }

    #[inline]
    pub fn scale(self) -> u32 {
        (self.flags & SCALE_MASK) >> SCALE_SHIFT
    }

    #[inline]
    pub fn is_sign_negative(self) -> bool {
        self.flags & SIGN_MASK != 0
    }

    /// Raw words in `[flags, lo, mid, hi]` order.
    #[inline]
    pub fn to_words(self) -> [u32; 4] {
        [self.flags, self.lo, self.mid, self.hi]
    }

    /// Rebuild from words produced by [`to_words`](Self::to_words).
    ///
    /// # Errors
    /// Returns `OutOfRange` if the scale field exceeds the decimal's maximum scale.
    pub fn from_words(words: [u32; 4]) -> MoneyResult<Self> {
        let [flags, lo, mid, hi] = words;
        let scale = (flags & SCALE_MASK) >> SCALE_SHIFT;
        if scale > MAX_SCALE {
            return Err(MoneyError::out_of_range(
                "scale",
                scale.into(),
                0,
                MAX_SCALE.into(),
            ));
        }
        Ok(Self { flags, lo, mid, hi })
    }
}

/// `[flags, lo, mid, hi]` of a decimal, read from its stable 16-byte serialization.
#[inline]
fn decimal_words(value: Decimal) -> [u32; 4] {
    let bytes = value.serialize();
    let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
    [word(0), word(4), word(8), word(12)]
}

impl fmt::Debug for PackedMoney {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedMoney")
            .field("amount", &self.amount())
            .field("currency", &self.currency())
            .field("context_index", &self.context_index())
            .field("flags", &format_args!("{:#010x}", self.flags))
            .finish()
    }
}
