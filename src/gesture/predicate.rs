//! Checkpoint predicates
//!
//! A closed expression tree over [`FeatureState`]. Every primitive treats an
//! unavailable operand as "condition not met", so an occluded landmark disables
//! the gestures that read it instead of raising.

use crate::pose::features::{Feature, FeatureState};

/// A value a comparison reads
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Feature(Feature),
    Const(f64),
}

impl Operand {
    #[inline]
    fn resolve(&self, state: &FeatureState) -> Option<f64> {
        match self {
            Operand::Feature(f) => state.get(*f),
            Operand::Const(v) => Some(*v),
        }
    }
}

impl From<Feature> for Operand {
    fn from(feature: Feature) -> Self {
        Operand::Feature(feature)
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Const(value)
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Feature(feature) => write!(f, "{}", feature),
            Operand::Const(v) => write!(f, "{}", v),
        }
    }
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    #[inline]
    fn apply(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Lt => lhs < rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Ge => lhs >= rhs,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }
}

/// Boolean condition over a feature vector
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `lhs op rhs`
    Compare {
        lhs: Operand,
        op: Comparison,
        rhs: Operand,
    },
    /// `min <= value <= max`
    InRange { value: Operand, min: f64, max: f64 },
    /// Every child holds (empty is true)
    All(Vec<Predicate>),
    /// At least one child holds (empty is false)
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn lt(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Self::compare(lhs, Comparison::Lt, rhs)
    }

    pub fn gt(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Self::compare(lhs, Comparison::Gt, rhs)
    }

    pub fn compare(lhs: impl Into<Operand>, op: Comparison, rhs: impl Into<Operand>) -> Self {
        Predicate::Compare {
            lhs: lhs.into(),
            op,
            rhs: rhs.into(),
        }
    }

    pub fn in_range(value: impl Into<Operand>, min: f64, max: f64) -> Self {
        Predicate::InRange {
            value: value.into(),
            min,
            max,
        }
    }

    pub fn all(children: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::All(children.into_iter().collect())
    }

    pub fn any(children: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Any(children.into_iter().collect())
    }

    /// Evaluate against a frame. Never fails: missing or NaN operands yield false.
    pub fn evaluate(&self, state: &FeatureState) -> bool {
        match self {
            Predicate::Compare { lhs, op, rhs } => match (lhs.resolve(state), rhs.resolve(state)) {
                (Some(l), Some(r)) => op.apply(l, r),
                _ => false,
            },
            Predicate::InRange { value, min, max } => value
                .resolve(state)
                .is_some_and(|v| *min <= v && v <= *max),
            Predicate::All(children) => children.iter().all(|c| c.evaluate(state)),
            Predicate::Any(children) => children.iter().any(|c| c.evaluate(state)),
        }
    }

    /// Features this predicate reads, in first-use order
    pub fn features(&self) -> Vec<Feature> {
        let mut out = Vec::new();
        self.collect_features(&mut out);
        out
    }

    fn collect_features(&self, out: &mut Vec<Feature>) {
        fn push(out: &mut Vec<Feature>, op: &Operand) {
            if let Operand::Feature(f) = op {
                if !out.contains(f) {
                    out.push(*f);
                }
            }
        }
        match self {
            Predicate::Compare { lhs, rhs, .. } => {
                push(out, lhs);
                push(out, rhs);
            }
            Predicate::InRange { value, .. } => push(out, value),
            Predicate::All(children) | Predicate::Any(children) => {
                for child in children {
                    child.collect_features(out);
                }
            }
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Compare { lhs, op, rhs } => write!(f, "{} {} {}", lhs, op.symbol(), rhs),
            Predicate::InRange { value, min, max } => write!(f, "{} in [{}, {}]", value, min, max),
            Predicate::All(children) | Predicate::Any(children) => {
                let joiner = if matches!(self, Predicate::All(_)) { " and " } else { " or " };
                f.write_str("(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(joiner)?;
                    }
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
        }
    }
}
