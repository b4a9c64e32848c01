//! Train line designator type.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::FormatError;

/// Train tokens: optional product letters, optional whitespace, optional digits.
static TRAIN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\p{L}*)\s*(\d*)$").unwrap());

/// A train, identified by its line designator.
///
/// The source prints designators as a single token such as `"ICE 293"` or
/// `"RE 123"`. The token is split into a product type code (letters) and a
/// numeric designator (digits). Either part may be empty.
///
/// The canonical rendering always joins the two parts with exactly one
/// space, so a train without a type code renders with a leading space.
///
/// # Examples
///
/// ```
/// use itinerary_server::domain::Train;
///
/// let ice = Train::from_raw("ICE 293").unwrap();
/// assert_eq!(ice.kind(), "ICE");
/// assert_eq!(ice.number(), "293");
/// assert_eq!(ice.to_string(), "ICE 293");
///
/// // Spacing is normalized
/// assert_eq!(Train::from_raw("RE   4711").unwrap().to_string(), "RE 4711");
/// assert_eq!(Train::from_raw("S5").unwrap().to_string(), "S 5");
///
/// // Tokens that are neither letters nor digits are rejected
/// assert!(Train::from_raw("ICE-293").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Train {
    kind: String,
    number: String,
}

impl Train {
    /// Parse a train from a raw designator token.
    pub fn from_raw(token: &str) -> Result<Self, FormatError> {
        let captures = TRAIN_PATTERN
            .captures(token)
            .ok_or_else(|| FormatError::new("train", token, "expected <TYPE> <digits>"))?;

        Ok(Self {
            kind: captures[1].to_string(),
            number: captures[2].to_string(),
        })
    }

    /// Returns the product type code (e.g. "ICE"), possibly empty.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the numeric designator, possibly empty.
    pub fn number(&self) -> &str {
        &self.number
    }
}

impl fmt::Debug for Train {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Train({} {})", self.kind, self.number)
    }
}

impl fmt::Display for Train {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.number)
    }
}
