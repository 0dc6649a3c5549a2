//! Comparison values and the single comparison dispatcher.
//!
//! Checks and mock expectations both funnel through [`compare`]: one
//! observed [`Value`], one [`Comparator`], one [`Expected`] shape. The
//! dispatcher replaces a combinatorial per-type API with exhaustive
//! matching over the three axes.

use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A tagged comparison value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed integer.
    Sint(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Floating point.
    Float(f64),
    /// Character string.
    Str(String),
    /// Raw pointer, compared by address.
    Ptr(usize),
    /// Byte buffer, compared by length and content.
    Bytes(Vec<u8>),
}

/// Discriminant of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Sint,
    Uint,
    Float,
    Str,
    Ptr,
    Bytes,
}

impl ValueKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ValueKind::Sint => "sint",
            ValueKind::Uint => "uint",
            ValueKind::Float => "float",
            ValueKind::Str => "str",
            ValueKind::Ptr => "ptr",
            ValueKind::Bytes => "bytes",
        }
    }
}

impl Value {
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Value::Sint(_) => ValueKind::Sint,
            Value::Uint(_) => ValueKind::Uint,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::Ptr(_) => ValueKind::Ptr,
            Value::Bytes(_) => ValueKind::Bytes,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Sint(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "\"{v}\""),
            Value::Ptr(v) => write!(f, "{v:#x}"),
            Value::Bytes(v) => {
                f.write_str("[")?;
                for (i, byte) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("]")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Expected shapes
// ---------------------------------------------------------------------------

/// What an observed value is compared against.
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    /// A single reference value.
    Scalar(Value),
    /// A closed interval; both ends must share the observed value's kind.
    Range { min: Value, max: Value },
    /// An unordered collection of reference values.
    Set(Vec<Value>),
}

impl Expected {
    /// Shorthand constructors for the common scalar kinds.
    #[must_use]
    pub fn sint(v: i64) -> Self {
        Expected::Scalar(Value::Sint(v))
    }

    #[must_use]
    pub fn uint(v: u64) -> Self {
        Expected::Scalar(Value::Uint(v))
    }

    #[must_use]
    pub fn float(v: f64) -> Self {
        Expected::Scalar(Value::Float(v))
    }

    #[must_use]
    pub fn str(v: impl Into<String>) -> Self {
        Expected::Scalar(Value::Str(v.into()))
    }

    #[must_use]
    pub fn ptr(v: usize) -> Self {
        Expected::Scalar(Value::Ptr(v))
    }

    #[must_use]
    pub fn bytes(v: impl Into<Vec<u8>>) -> Self {
        Expected::Scalar(Value::Bytes(v.into()))
    }

    #[must_use]
    pub fn sint_range(min: i64, max: i64) -> Self {
        Expected::Range {
            min: Value::Sint(min),
            max: Value::Sint(max),
        }
    }

    #[must_use]
    pub fn uint_range(min: u64, max: u64) -> Self {
        Expected::Range {
            min: Value::Uint(min),
            max: Value::Uint(max),
        }
    }

    #[must_use]
    pub fn float_range(min: f64, max: f64) -> Self {
        Expected::Range {
            min: Value::Float(min),
            max: Value::Float(max),
        }
    }

    #[must_use]
    pub fn sint_set(values: impl IntoIterator<Item = i64>) -> Self {
        Expected::Set(values.into_iter().map(Value::Sint).collect())
    }

    #[must_use]
    pub fn uint_set(values: impl IntoIterator<Item = u64>) -> Self {
        Expected::Set(values.into_iter().map(Value::Uint).collect())
    }

    #[must_use]
    pub fn str_set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expected::Set(
            values
                .into_iter()
                .map(|s| Value::Str(s.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Scalar(v) => write!(f, "{v}"),
            Expected::Range { min, max } => write!(f, "{{{min} ... {max}}}"),
            Expected::Set(values) => {
                f.write_str("{")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Comparators
// ---------------------------------------------------------------------------

/// Comparison predicate applied between the observed value and the
/// expected shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equal,
    Unequal,
    Greater,
    GreaterOrEqual,
    Lower,
    LowerOrEqual,
    InRange,
    NotInRange,
    InSet,
    NotInSet,
    /// String starts with the expected string.
    Begins,
    NotBegins,
    /// String ends with the expected string.
    Ends,
    NotEnds,
    /// String contains the expected string.
    Contains,
    NotContains,
}

impl Comparator {
    /// Human phrase used when rendering a check ("wanted: lhs PHRASE rhs").
    #[must_use]
    pub const fn phrase(self) -> &'static str {
        match self {
            Comparator::Equal => "equal to",
            Comparator::Unequal => "unequal to",
            Comparator::Greater => "greater than",
            Comparator::GreaterOrEqual => "greater than or equal to",
            Comparator::Lower => "lower than",
            Comparator::LowerOrEqual => "lower than or equal to",
            Comparator::InRange => "in range",
            Comparator::NotInRange => "not in range",
            Comparator::InSet => "in set",
            Comparator::NotInSet => "not in set",
            Comparator::Begins => "beginning with",
            Comparator::NotBegins => "not beginning with",
            Comparator::Ends => "ending with",
            Comparator::NotEnds => "not ending with",
            Comparator::Contains => "containing",
            Comparator::NotContains => "not containing",
        }
    }

    /// The opposite predicate; a failed check renders the observed value
    /// with the negated phrase ("found: [5] in range {0 ... 10}").
    #[must_use]
    pub const fn negated(self) -> Comparator {
        match self {
            Comparator::Equal => Comparator::Unequal,
            Comparator::Unequal => Comparator::Equal,
            Comparator::Greater => Comparator::LowerOrEqual,
            Comparator::GreaterOrEqual => Comparator::Lower,
            Comparator::Lower => Comparator::GreaterOrEqual,
            Comparator::LowerOrEqual => Comparator::Greater,
            Comparator::InRange => Comparator::NotInRange,
            Comparator::NotInRange => Comparator::InRange,
            Comparator::InSet => Comparator::NotInSet,
            Comparator::NotInSet => Comparator::InSet,
            Comparator::Begins => Comparator::NotBegins,
            Comparator::NotBegins => Comparator::Begins,
            Comparator::Ends => Comparator::NotEnds,
            Comparator::NotEnds => Comparator::Ends,
            Comparator::Contains => Comparator::NotContains,
            Comparator::NotContains => Comparator::Contains,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// A comparison that cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("kind mismatch: observed {obs} vs expected {exp}",
            obs = .observed.as_str(), exp = .expected.as_str())]
    KindMismatch {
        observed: ValueKind,
        expected: ValueKind,
    },
    #[error("comparator '{phrase}' needs a {needs} expectation", phrase = .comparator.phrase())]
    ShapeMismatch {
        comparator: Comparator,
        needs: &'static str,
    },
    #[error("comparator '{phrase}' is not defined for {of} values",
            phrase = .comparator.phrase(), of = .kind.as_str())]
    Unsupported {
        comparator: Comparator,
        kind: ValueKind,
    },
}

/// Evaluate `observed <comparator> expected`.
///
/// Integers and floats compare numerically within their own kind;
/// strings support equality, prefix/suffix/substring, and set
/// membership; byte buffers compare by length and content; pointers
/// compare by address ordering.
pub fn compare(
    observed: &Value,
    comparator: Comparator,
    expected: &Expected,
) -> Result<bool, CompareError> {
    match comparator {
        Comparator::Equal
        | Comparator::Unequal
        | Comparator::Greater
        | Comparator::GreaterOrEqual
        | Comparator::Lower
        | Comparator::LowerOrEqual
        | Comparator::Begins
        | Comparator::NotBegins
        | Comparator::Ends
        | Comparator::NotEnds
        | Comparator::Contains
        | Comparator::NotContains => {
            let Expected::Scalar(reference) = expected else {
                return Err(CompareError::ShapeMismatch {
                    comparator,
                    needs: "scalar",
                });
            };
            compare_scalar(observed, comparator, reference)
        }
        Comparator::InRange | Comparator::NotInRange => {
            let Expected::Range { min, max } = expected else {
                return Err(CompareError::ShapeMismatch {
                    comparator,
                    needs: "range",
                });
            };
            let inside = compare_scalar(observed, Comparator::GreaterOrEqual, min)?
                && compare_scalar(observed, Comparator::LowerOrEqual, max)?;
            Ok(inside == (comparator == Comparator::InRange))
        }
        Comparator::InSet | Comparator::NotInSet => {
            let Expected::Set(members) = expected else {
                return Err(CompareError::ShapeMismatch {
                    comparator,
                    needs: "set",
                });
            };
            let mut found = false;
            for member in members {
                if compare_scalar(observed, Comparator::Equal, member)? {
                    found = true;
                    break;
                }
            }
            Ok(found == (comparator == Comparator::InSet))
        }
    }
}

fn compare_scalar(
    observed: &Value,
    comparator: Comparator,
    reference: &Value,
) -> Result<bool, CompareError> {
    if observed.kind() != reference.kind() {
        return Err(CompareError::KindMismatch {
            observed: observed.kind(),
            expected: reference.kind(),
        });
    }
    match (observed, reference) {
        (Value::Sint(a), Value::Sint(b)) => ordered(comparator, a.cmp(b), observed.kind()),
        (Value::Uint(a), Value::Uint(b)) => ordered(comparator, a.cmp(b), observed.kind()),
        (Value::Ptr(a), Value::Ptr(b)) => ordered(comparator, a.cmp(b), observed.kind()),
        (Value::Float(a), Value::Float(b)) => match comparator {
            Comparator::Equal => Ok(a == b),
            Comparator::Unequal => Ok(a != b),
            Comparator::Greater => Ok(a > b),
            Comparator::GreaterOrEqual => Ok(a >= b),
            Comparator::Lower => Ok(a < b),
            Comparator::LowerOrEqual => Ok(a <= b),
            _ => Err(CompareError::Unsupported {
                comparator,
                kind: ValueKind::Float,
            }),
        },
        (Value::Str(a), Value::Str(b)) => match comparator {
            Comparator::Equal => Ok(a == b),
            Comparator::Unequal => Ok(a != b),
            Comparator::Begins => Ok(a.starts_with(b.as_str())),
            Comparator::NotBegins => Ok(!a.starts_with(b.as_str())),
            Comparator::Ends => Ok(a.ends_with(b.as_str())),
            Comparator::NotEnds => Ok(!a.ends_with(b.as_str())),
            Comparator::Contains => Ok(a.contains(b.as_str())),
            Comparator::NotContains => Ok(!a.contains(b.as_str())),
            _ => Err(CompareError::Unsupported {
                comparator,
                kind: ValueKind::Str,
            }),
        },
        (Value::Bytes(a), Value::Bytes(b)) => match comparator {
            Comparator::Equal => Ok(a == b),
            Comparator::Unequal => Ok(a != b),
            _ => Err(CompareError::Unsupported {
                comparator,
                kind: ValueKind::Bytes,
            }),
        },
        _ => unreachable!("kind equality checked above"),
    }
}

fn ordered(
    comparator: Comparator,
    ordering: std::cmp::Ordering,
    kind: ValueKind,
) -> Result<bool, CompareError> {
    use std::cmp::Ordering;
    match comparator {
        Comparator::Equal => Ok(ordering == Ordering::Equal),
        Comparator::Unequal => Ok(ordering != Ordering::Equal),
        Comparator::Greater => Ok(ordering == Ordering::Greater),
        Comparator::GreaterOrEqual => Ok(ordering != Ordering::Less),
        Comparator::Lower => Ok(ordering == Ordering::Less),
        Comparator::LowerOrEqual => Ok(ordering != Ordering::Greater),
        _ => Err(CompareError::Unsupported { comparator, kind }),
    }
}

/// Render the "wanted" and "found" halves of a failed check.
///
/// `check_expr` and `expect_expr` are the source-level expressions as the
/// caller wrote them; the found half shows the evaluated observed value
/// against the evaluated expectation with the negated predicate.
#[must_use]
pub fn describe_mismatch(
    check_expr: &str,
    comparator: Comparator,
    expect_expr: &str,
    observed: &Value,
    expected: &Expected,
) -> (String, String) {
    let wanted = format!("{check_expr} {} {expect_expr}", comparator.phrase());
    let found = format!("[{observed}] {} {expected}", comparator.negated().phrase());
    (wanted, found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sint_ordering() {
        let five = Value::Sint(5);
        assert_eq!(compare(&five, Comparator::Equal, &Expected::sint(5)), Ok(true));
        assert_eq!(compare(&five, Comparator::Greater, &Expected::sint(4)), Ok(true));
        assert_eq!(compare(&five, Comparator::Lower, &Expected::sint(4)), Ok(false));
        assert_eq!(
            compare(&five, Comparator::LowerOrEqual, &Expected::sint(5)),
            Ok(true)
        );
    }

    #[test]
    fn sint_range_membership() {
        let five = Value::Sint(5);
        assert_eq!(
            compare(&five, Comparator::InRange, &Expected::sint_range(0, 10)),
            Ok(true)
        );
        assert_eq!(
            compare(&five, Comparator::NotInRange, &Expected::sint_range(0, 10)),
            Ok(false)
        );
        assert_eq!(
            compare(&five, Comparator::InRange, &Expected::sint_range(6, 10)),
            Ok(false)
        );
        // Closed interval: both ends are inside.
        assert_eq!(
            compare(&five, Comparator::InRange, &Expected::sint_range(5, 5)),
            Ok(true)
        );
    }

    #[test]
    fn set_membership() {
        let two = Value::Uint(2);
        assert_eq!(
            compare(&two, Comparator::InSet, &Expected::uint_set([1, 2, 3])),
            Ok(true)
        );
        assert_eq!(
            compare(&two, Comparator::NotInSet, &Expected::uint_set([1, 3])),
            Ok(true)
        );
        let name = Value::Str("beta".into());
        assert_eq!(
            compare(&name, Comparator::InSet, &Expected::str_set(["alpha", "beta"])),
            Ok(true)
        );
    }

    #[test]
    fn string_affix_operators() {
        let hay = Value::Str("frobnicate".into());
        assert_eq!(compare(&hay, Comparator::Begins, &Expected::str("frob")), Ok(true));
        assert_eq!(compare(&hay, Comparator::Ends, &Expected::str("cate")), Ok(true));
        assert_eq!(compare(&hay, Comparator::Contains, &Expected::str("nic")), Ok(true));
        assert_eq!(
            compare(&hay, Comparator::NotContains, &Expected::str("xyz")),
            Ok(true)
        );
    }

    #[test]
    fn bytes_compare_by_length_and_content() {
        let buf = Value::Bytes(vec![0xde, 0xad]);
        assert_eq!(
            compare(&buf, Comparator::Equal, &Expected::bytes(vec![0xde, 0xad])),
            Ok(true)
        );
        assert_eq!(
            compare(&buf, Comparator::Equal, &Expected::bytes(vec![0xde])),
            Ok(false)
        );
        assert!(matches!(
            compare(&buf, Comparator::Greater, &Expected::bytes(vec![0x00])),
            Err(CompareError::Unsupported { .. })
        ));
    }

    #[test]
    fn pointer_address_ordering() {
        let p = Value::Ptr(0x2000);
        assert_eq!(compare(&p, Comparator::Greater, &Expected::ptr(0x1000)), Ok(true));
        assert_eq!(
            compare(
                &p,
                Comparator::InRange,
                &Expected::Range {
                    min: Value::Ptr(0x1000),
                    max: Value::Ptr(0x3000)
                }
            ),
            Ok(true)
        );
    }

    #[test]
    fn float_nan_never_matches_an_order() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(compare(&nan, Comparator::Equal, &Expected::float(f64::NAN)), Ok(false));
        assert_eq!(compare(&nan, Comparator::Greater, &Expected::float(0.0)), Ok(false));
        assert_eq!(compare(&nan, Comparator::Lower, &Expected::float(0.0)), Ok(false));
    }

    #[test]
    fn kind_mismatch_is_an_error() {
        let five = Value::Sint(5);
        assert!(matches!(
            compare(&five, Comparator::Equal, &Expected::uint(5)),
            Err(CompareError::KindMismatch { .. })
        ));
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let five = Value::Sint(5);
        assert!(matches!(
            compare(&five, Comparator::InRange, &Expected::sint(5)),
            Err(CompareError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            compare(&five, Comparator::Equal, &Expected::sint_range(0, 10)),
            Err(CompareError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn mismatch_rendering_matches_report_format() {
        let (wanted, found) = describe_mismatch(
            "nr",
            Comparator::NotInRange,
            "RANGE(0, 10)",
            &Value::Sint(5),
            &Expected::sint_range(0, 10),
        );
        assert_eq!(wanted, "nr not in range RANGE(0, 10)");
        assert_eq!(found, "[5] in range {0 ... 10}");
    }

    #[test]
    fn range_set_errors_propagate_kind_mismatch() {
        let five = Value::Sint(5);
        assert!(matches!(
            compare(&five, Comparator::InRange, &Expected::uint_range(0, 10)),
            Err(CompareError::KindMismatch { .. })
        ));
    }
}
