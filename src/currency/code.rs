// ============================================================================
// Compact Currency Code
// Three-letter currency codes packed into 16 bits
// ============================================================================

use crate::numeric::{MoneyError, MoneyResult};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A currency identifier packed into a `u16`.
///
/// # Bit Layout
/// ```text
///  15   14    10 9      5 4      0
/// +---+--------+--------+--------+
/// | C | letter0| letter1| letter2|
/// +---+--------+--------+--------+
/// ```
/// Each letter `'A'..='Z'` is stored as `1..=26`, so no letter encodes to zero.
/// `C` is set for codes from the custom (non-ISO) namespace.
///
/// The all-zero value is the "no currency" code `XXX`. Encoding `XXX` in either
/// namespace yields zero, so `CurrencyCode::default()` and
/// `CurrencyCode::NO_CURRENCY` are the same value.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "u16", into = "u16")
)]
#[repr(transparent)]
pub struct CurrencyCode(u16);

const CUSTOM_NAMESPACE_BIT: u16 = 1 << 15;
const LETTER_BITS: u32 = 5;
const LETTER_MASK: u16 = (1 << LETTER_BITS) - 1;
const CODE_MASK: u16 = !CUSTOM_NAMESPACE_BIT;

/// `XXX` packed without the namespace bit.
const NO_CURRENCY_LETTERS: u16 = pack_letters(*b"XXX");

const fn pack_letters(letters: [u8; 3]) -> u16 {
    let l0 = (letters[0] - b'A' + 1) as u16;
    let l1 = (letters[1] - b'A' + 1) as u16;
    let l2 = (letters[2] - b'A' + 1) as u16;
    (l0 << (2 * LETTER_BITS)) | (l1 << LETTER_BITS) | l2
}

impl CurrencyCode {
    /// "No currency" (`XXX`), the zero value.
    pub const NO_CURRENCY: Self = Self(0);

    /// Encode an ISO-namespace code such as `"USD"`.
    ///
    /// # Errors
    /// Returns `InvalidFormat` unless `code` is exactly three letters `'A'..='Z'`.
    pub fn new(code: &str) -> MoneyResult<Self> {
        Self::encode(code, true)
    }

    /// Encode a code from the custom (non-ISO) namespace.
    pub fn custom(code: &str) -> MoneyResult<Self> {
        Self::encode(code, false)
    }

    /// Encode `code` into its 16-bit identifier.
    ///
    /// # Errors
    /// Returns `InvalidFormat` unless `code` is exactly three letters `'A'..='Z'`.
    pub fn encode(code: &str, is_iso: bool) -> MoneyResult<Self> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 {
            return Err(MoneyError::InvalidFormat {
                input: code.to_string(),
                reason: "expected exactly three characters",
            });
        }
        if !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(MoneyError::InvalidFormat {
                input: code.to_string(),
                reason: "expected letters 'A'..='Z'",
            });
        }

        let letters = pack_letters([bytes[0], bytes[1], bytes[2]]);
        if letters == NO_CURRENCY_LETTERS {
            return Ok(Self::NO_CURRENCY);
        }

        let namespace = if is_iso { 0 } else { CUSTOM_NAMESPACE_BIT };
        Ok(Self(letters | namespace))
    }

    /// Decode into the three code letters and the ISO-namespace flag.
    ///
    /// Zero decodes to `("XXX", true)`.
    pub const fn decode(self) -> ([u8; 3], bool) {
        if self.0 == 0 {
            return (*b"XXX", true);
        }
        let letters = self.0 & CODE_MASK;
        (
            [
                letter_to_ascii((letters >> (2 * LETTER_BITS)) & LETTER_MASK),
                letter_to_ascii((letters >> LETTER_BITS) & LETTER_MASK),
                letter_to_ascii(letters & LETTER_MASK),
            ],
            self.0 & CUSTOM_NAMESPACE_BIT == 0,
        )
    }

    /// Rebuild from a raw identifier (e.g. one extracted from a packed money value).
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// The raw 16-bit identifier.
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// The three code letters.
    #[inline]
    pub const fn letters(self) -> [u8; 3] {
        self.decode().0
    }

    /// Whether the code belongs to the ISO-4217 namespace.
    #[inline]
    pub const fn is_iso(self) -> bool {
        self.0 & CUSTOM_NAMESPACE_BIT == 0
    }

    #[inline]
    pub const fn is_no_currency(self) -> bool {
        self.0 == 0
    }
}

/// Letters outside `1..=26` only appear in raw values that were never encoded.
const fn letter_to_ascii(value: u16) -> u8 {
    if value >= 1 && value <= 26 {
        b'A' + (value as u8) - 1
    } else {
        b'?'
    }
}

// ============================================================================
// Trait Implementations
// ============================================================================

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.letters();
        write!(f, "{}{}{}", a as char, b as char, c as char)
    }
}

impl fmt::Debug for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_iso() {
            write!(f, "CurrencyCode({self})")
        } else {
            write!(f, "CurrencyCode({self}, custom)")
        }
    }
}

impl FromStr for CurrencyCode {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.to_string()
    }
}

/// Serialized form: the raw identifier, which keeps the namespace bit.
impl From<u16> for CurrencyCode {
    fn from(raw: u16) -> Self {
        Self::from_raw(raw)
    }
}

impl From<CurrencyCode> for u16 {
    fn from(code: CurrencyCode) -> Self {
        code.raw()
    }
}
