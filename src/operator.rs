use std::fmt;

/// Comparator tokens in scan order: longer tokens come before their prefixes.
pub const COMPARATOR_TOKENS: [&str; 8] = ["==", "!=", "<=", ">=", "!<", "!>", "<", ">"];

/// Logical connective tokens.
pub const LOGICAL_TOKENS: [&str; 2] = ["&&", "||"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparativeOperation {
    None,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
    Contains,
    ContainsOrEqual,
    NotContains,
    Contained,
    NotContained,
    ContainedOrEqual,
}

impl ComparativeOperation {
    pub const ALL: [ComparativeOperation; 13] = [
        Self::None,
        Self::Equal,
        Self::NotEqual,
        Self::LessThan,
        Self::LessThanOrEquals,
        Self::GreaterThan,
        Self::GreaterThanOrEquals,
        Self::Contains,
        Self::ContainsOrEqual,
        Self::NotContains,
        Self::Contained,
        Self::NotContained,
        Self::ContainedOrEqual,
    ];

    /// Reads a token with ordering semantics (`<` is "less than").
    ///
    /// `!<` and `!>` only exist for collections and map to containment even here.
    pub fn ordinal_from_token(token: &str) -> Option<Self> {
        Some(match token {
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            "<" => Self::LessThan,
            "<=" => Self::LessThanOrEquals,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterThanOrEquals,
            "!>" => Self::NotContains,
            "!<" => Self::NotContained,
            _ => return None,
        })
    }

    /// Reads a token with containment semantics (`<` is "is contained in").
    pub fn containment_from_token(token: &str) -> Option<Self> {
        Some(match token {
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            "<" => Self::Contained,
            "<=" => Self::ContainedOrEqual,
            ">" => Self::Contains,
            ">=" => Self::ContainsOrEqual,
            "!>" => Self::NotContains,
            "!<" => Self::NotContained,
            _ => return None,
        })
    }

    /// The operation a token denotes regardless of operand types, if any.
    pub fn unambiguous_from_token(token: &str) -> Option<Self> {
        match token {
            "==" | "!=" | "!>" | "!<" => Self::ordinal_from_token(token),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThan | Self::Contained => "<",
            Self::LessThanOrEquals | Self::ContainedOrEqual => "<=",
            Self::GreaterThan | Self::Contains => ">",
            Self::GreaterThanOrEquals | Self::ContainsOrEqual => ">=",
            Self::NotContains => "!>",
            Self::NotContained => "!<",
        }
    }

    /// Logical negation, applied to every leaf under a `!( ... )` group.
    ///
    /// Containment is reflexive, so `ContainsOrEqual` negates to `NotContains`
    /// (and likewise for the contained family).
    pub fn invert(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Equal => Self::NotEqual,
            Self::NotEqual => Self::Equal,
            Self::LessThan => Self::GreaterThanOrEquals,
            Self::GreaterThanOrEquals => Self::LessThan,
            Self::LessThanOrEquals => Self::GreaterThan,
            Self::GreaterThan => Self::LessThanOrEquals,
            Self::Contains | Self::ContainsOrEqual => Self::NotContains,
            Self::NotContains => Self::Contains,
            Self::Contained | Self::ContainedOrEqual => Self::NotContained,
            Self::NotContained => Self::Contained,
        }
    }

    /// The same relation seen from the right operand: `a < b` is `b > a`.
    pub fn from_right_operand_perspective(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Equal => Self::Equal,
            Self::NotEqual => Self::NotEqual,
            Self::LessThan => Self::GreaterThan,
            Self::GreaterThan => Self::LessThan,
            Self::LessThanOrEquals => Self::GreaterThanOrEquals,
            Self::GreaterThanOrEquals => Self::LessThanOrEquals,
            Self::Contains => Self::Contained,
            Self::Contained => Self::Contains,
            Self::ContainsOrEqual => Self::ContainedOrEqual,
            Self::ContainedOrEqual => Self::ContainsOrEqual,
            Self::NotContains => Self::NotContained,
            Self::NotContained => Self::NotContains,
        }
    }

    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::LessThan | Self::LessThanOrEquals | Self::GreaterThan | Self::GreaterThanOrEquals
        )
    }

    pub fn is_containment(self) -> bool {
        matches!(
            self,
            Self::Contains
                | Self::ContainsOrEqual
                | Self::NotContains
                | Self::Contained
                | Self::NotContained
                | Self::ContainedOrEqual
        )
    }
}

impl fmt::Display for ComparativeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "&&" => Some(Self::And),
            "||" => Some(Self::Or),
            _ => None,
        }
    }

    /// De Morgan complement.
    pub fn invert(self) -> Self {
        match self {
            Self::And => Self::Or,
            Self::Or => Self::And,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn right_perspective_is_an_involution() {
        for op in ComparativeOperation::ALL {
            assert_eq!(op.from_right_operand_perspective().from_right_operand_perspective(), op);
        }
    }

    #[test]
    fn invert_flips_every_family() {
        use ComparativeOperation::*;
        assert_eq!(Equal.invert(), NotEqual);
        assert_eq!(LessThan.invert(), GreaterThanOrEquals);
        assert_eq!(GreaterThan.invert(), LessThanOrEquals);
        assert_eq!(Contains.invert(), NotContains);
        assert_eq!(ContainsOrEqual.invert(), NotContains);
        assert_eq!(Contained.invert(), NotContained);
        assert_eq!(ContainedOrEqual.invert(), NotContained);
        assert_eq!(None.invert(), None);
    }

    #[test]
    fn invert_is_an_involution_outside_or_equal_containment() {
        for op in ComparativeOperation::ALL {
            if matches!(op, ComparativeOperation::ContainsOrEqual | ComparativeOperation::ContainedOrEqual) {
                continue;
            }
            assert_eq!(op.invert().invert(), op);
        }
    }

    #[test]
    fn tokens_read_back_in_either_family() {
        for token in COMPARATOR_TOKENS {
            let ordinal = ComparativeOperation::ordinal_from_token(token).unwrap();
            let containment = ComparativeOperation::containment_from_token(token).unwrap();
            assert_eq!(ordinal.token(), token);
            assert_eq!(containment.token(), token);
        }
        assert_eq!(ComparativeOperation::unambiguous_from_token("<"), None);
    }

    #[test]
    fn logical_operator_round_trips() {
        for token in LOGICAL_TOKENS {
            let op = LogicalOperator::from_token(token).unwrap();
            assert_eq!(op.token(), token);
            assert_eq!(op.invert().invert(), op);
        }
    }
}
