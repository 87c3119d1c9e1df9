//! `percentile(arg, p)` as a windowed aggregate.
//!
//! [`PercentileFunction::compile`] checks the call's operands once, when the
//! query is built, and freezes `p`. Every group or window then gets its own
//! [`PercentileState`] from [`PercentileFunction::create_state`], which
//! converts incoming `INT`, `LONG`, `FLOAT` and `DOUBLE` values to `f64`
//! before handing them to a [`PercentileEstimator`].
//!
//! `NULL` inputs are skipped: `add` and `remove` return the current
//! percentile and leave the state untouched.

#![allow(clippy::unnecessary_cast)]

use crate::error::AggregateError;
use crate::floats::F64;
use crate::multiset::SortedVecMultiset;
use crate::order_statistics_multiset::OrderStatisticsMultiset;
use crate::percentile::PercentileEstimator;
use crate::snapshot::PercentileSnapshot;
use streammath_types::config::validate_percentile;
use streammath_types::{ConfigError, MultisetBackend, MultisetConfig, SqlType, SqlValue};
use tracing::debug;

/// Converts a non-null value of the declared input type to `f64`; `None`
/// when the value has a different type.
type Coercion = fn(&SqlValue) -> Option<f64>;

macro_rules! coercion {
    ($name:ident, $variant:ident) => {
        fn $name(value: &SqlValue) -> Option<f64> {
            match value {
                SqlValue::$variant(value) => Some(*value as f64),
                _ => None,
            }
        }
    };
}

coercion!(coerce_int, Int);
coercion!(coerce_long, Long);
coercion!(coerce_float, Float);
coercion!(coerce_double, Double);

fn coercion_for(sql_type: SqlType) -> Option<Coercion> {
    match sql_type {
        SqlType::Int => Some(coerce_int),
        SqlType::Long => Some(coerce_long),
        SqlType::Float => Some(coerce_float),
        SqlType::Double => Some(coerce_double),
        SqlType::Bool | SqlType::String => None,
    }
}

fn type_name(sql_type: Option<SqlType>) -> String {
    sql_type.map_or_else(|| "NULL".to_string(), |sql_type| sql_type.to_string())
}

/// An argument of a function call as seen by the query compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A value computed per event, e.g. a column reference.
    Column(SqlType),
    /// A value known when the query is compiled.
    Constant(SqlValue),
}

impl Operand {
    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            Operand::Column(sql_type) => Some(*sql_type),
            Operand::Constant(value) => value.sql_type(),
        }
    }
}

/// A validated `percentile(arg, p)` call.
#[derive(Debug, Clone)]
pub struct PercentileFunction {
    percentile: f64,
    input_type: SqlType,
    coerce: Coercion,
    multiset: MultisetConfig,
}

impl PercentileFunction {
    /// Validate the operands of a percentile call.
    ///
    /// The call must have exactly two operands: a numeric input and a
    /// constant `DOUBLE` percentile in `(0, 100]`. The percentile operand
    /// is checked before the input type.
    pub fn compile(operands: &[Operand], multiset: &MultisetConfig) -> Result<Self, ConfigError> {
        let [input, percentile] = operands else {
            return Err(ConfigError::ArgumentCount {
                actual: operands.len(),
            });
        };

        let percentile = match percentile {
            Operand::Column(_) => return Err(ConfigError::PercentileNotConstant),
            Operand::Constant(SqlValue::Double(percentile)) => validate_percentile(*percentile)?,
            Operand::Constant(other) => {
                return Err(ConfigError::PercentileType {
                    found: type_name(other.sql_type()),
                })
            }
        };

        let input_type = input.sql_type();
        let (input_type, coerce) = input_type
            .and_then(|sql_type| Some((sql_type, coercion_for(sql_type)?)))
            .ok_or_else(|| ConfigError::UnsupportedArgumentType {
                found: type_name(input_type),
            })?;

        debug!(
            percentile,
            %input_type,
            backend = ?multiset.backend,
            "compiled percentile function"
        );

        Ok(Self {
            percentile,
            input_type,
            coerce,
            multiset: multiset.clone(),
        })
    }

    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    pub fn input_type(&self) -> SqlType {
        self.input_type
    }

    pub fn return_type(&self) -> SqlType {
        SqlType::Double
    }

    /// Fresh, empty state for one group or window.
    pub fn create_state(&self) -> PercentileState {
        let estimator = match self.multiset.backend {
            MultisetBackend::SortedVec => Estimator::SortedVec(PercentileEstimator::new_unchecked(
                self.percentile,
                SortedVecMultiset::new(),
            )),
            MultisetBackend::OrderStatisticsTree => {
                Estimator::Tree(PercentileEstimator::new_unchecked(
                    self.percentile,
                    OrderStatisticsMultiset::with_branching_factor(self.multiset.branching_factor),
                ))
            }
        };

        PercentileState {
            input_type: self.input_type,
            coerce: self.coerce,
            estimator,
        }
    }
}

#[derive(Debug, Clone)]
enum Estimator {
    SortedVec(PercentileEstimator<SortedVecMultiset>),
    Tree(PercentileEstimator<OrderStatisticsMultiset<F64>>),
}

macro_rules! dispatch {
    ($estimator:expr, $inner:ident => $body:expr) => {
        match $estimator {
            Estimator::SortedVec($inner) => $body,
            Estimator::Tree($inner) => $body,
        }
    };
}

/// Per-group state of a percentile aggregate.
#[derive(Debug, Clone)]
pub struct PercentileState {
    input_type: SqlType,
    coerce: Coercion,
    estimator: Estimator,
}

impl PercentileState {
    fn coerce(&self, value: Option<&SqlValue>) -> Result<Option<f64>, AggregateError> {
        let Some(value) = value.filter(|value| !value.is_null()) else {
            return Ok(None);
        };

        match (self.coerce)(value) {
            Some(value) => Ok(Some(value)),
            None => Err(AggregateError::TypeMismatch {
                expected: self.input_type,
                found: value.sql_type().unwrap_or(self.input_type),
            }),
        }
    }

    /// Add a value entering the window and return the new percentile.
    pub fn add(&mut self, value: Option<&SqlValue>) -> Result<f64, AggregateError> {
        Ok(match self.coerce(value)? {
            Some(value) => dispatch!(&mut self.estimator, e => e.add(value)),
            None => self.current(),
        })
    }

    /// Remove a value leaving the window and return the new percentile.
    pub fn remove(&mut self, value: Option<&SqlValue>) -> Result<f64, AggregateError> {
        Ok(match self.coerce(value)? {
            Some(value) => dispatch!(&mut self.estimator, e => e.remove(value)),
            None => self.current(),
        })
    }

    pub fn current(&self) -> f64 {
        dispatch!(&self.estimator, e => e.current())
    }

    pub fn reset(&mut self) -> f64 {
        dispatch!(&mut self.estimator, e => e.reset())
    }

    pub fn can_destroy(&self) -> bool {
        dispatch!(&self.estimator, e => e.can_destroy())
    }

    pub fn len(&self) -> usize {
        dispatch!(&self.estimator, e => e.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> PercentileSnapshot {
        dispatch!(&self.estimator, e => e.snapshot())
    }

    pub fn restore(&mut self, snapshot: PercentileSnapshot) {
        dispatch!(&mut self.estimator, e => e.restore(snapshot))
    }
}
