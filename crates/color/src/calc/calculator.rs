//! Term accumulation and simplification for `calc()`.
//!
//! <https://drafts.csswg.org/css-values-4/#calc-simplification>

use std::{cmp::Ordering, fmt};

use crate::serialize::format_number;

/// Whether an already serialized expression is a sum or a product.
///
/// Used to decide where parentheses are needed when it is nested into another expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpressionKind {
    Sum,
    Product,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    Number(f64),

    /// Stored on a 0-100 scale
    Percentage(f64),
    Dimension(f64, String),

    /// A name that could not be resolved, like a relative color channel
    Symbol(String),

    /// A sub-result that could not be folded into a single value
    Expression(String, ExpressionKind),
}

impl Term {
    fn is_product(&self) -> bool {
        matches!(self, Self::Expression(_, ExpressionKind::Product))
    }

    fn is_sum(&self) -> bool {
        matches!(self, Self::Expression(_, ExpressionKind::Sum))
    }

    /// Serialize the term for use inside a `calc()` expression
    #[must_use]
    pub fn to_calc_string(&self) -> String {
        match self {
            Self::Expression(expression, _) => format!("calc({expression})"),
            Self::Symbol(name) => format!("calc({name})"),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Percentage(p) => write!(f, "{}%", format_number(*p)),
            Self::Dimension(value, unit) => write!(f, "{}{unit}", format_number(*value)),
            Self::Symbol(name) => f.write_str(name),
            Self::Expression(expression, _) => f.write_str(expression),
        }
    }
}

/// Collects the operands of a single sum or product and reduces them.
#[derive(Clone, Debug, Default)]
pub struct Calculator {
    has_terms: bool,

    num_sum: Vec<f64>,
    num_mul: Vec<f64>,
    pct_sum: Vec<f64>,
    pct_mul: Vec<f64>,

    dim_sum: Vec<(f64, String)>,
    dim_sub: Vec<(f64, String)>,
    dim_mul: Vec<(f64, String)>,
    dim_div: Vec<(f64, String)>,

    etc_sum: Vec<Term>,
    etc_sub: Vec<Term>,
    etc_mul: Vec<Term>,
    etc_div: Vec<Term>,
}

impl Calculator {
    pub fn add(&mut self, term: Term) {
        self.has_terms = true;
        match term {
            Term::Number(n) => self.num_sum.push(n),
            Term::Percentage(p) => self.pct_sum.push(p),
            Term::Dimension(value, unit) => self.dim_sum.push((value, unit)),
            other => self.etc_sum.push(other),
        }
    }

    pub fn subtract(&mut self, term: Term) {
        self.has_terms = true;
        match term {
            Term::Number(n) => self.num_sum.push(-n),
            Term::Percentage(p) => self.pct_sum.push(-p),
            Term::Dimension(value, unit) => self.dim_sub.push((value, unit)),
            other => self.etc_sub.push(other),
        }
    }

    pub fn multiply_by(&mut self, term: Term) {
        self.has_terms = true;
        match term {
            Term::Number(n) => self.num_mul.push(n),
            Term::Percentage(p) => self.pct_mul.push(p),
            Term::Dimension(value, unit) => self.dim_mul.push((value, unit)),
            other => self.etc_mul.push(other),
        }
    }

    pub fn divide_by(&mut self, term: Term) {
        self.has_terms = true;
        match term {
            Term::Number(n) => self.num_mul.push(1. / n),
            Term::Dimension(value, unit) => self.dim_div.push((value, unit)),
            other => self.etc_div.push(other),
        }
    }

    /// Reduce the collected factors of a product
    #[must_use]
    pub fn multiply(&self) -> Option<Term> {
        if !self.has_terms {
            return None;
        }

        let scalar: f64 = self.num_mul.iter().product();
        if scalar.is_nan() {
            return Some(Term::Number(f64::NAN));
        }

        let has_dimensions = !self.dim_mul.is_empty() || !self.dim_div.is_empty();
        let has_others = !self.etc_mul.is_empty() || !self.etc_div.is_empty();

        if scalar == 0. && !has_dimensions {
            return Some(if self.pct_mul.is_empty() {
                Term::Number(0.)
            } else {
                Term::Percentage(0.)
            });
        }

        // Factors that can be absorbed into the scalar
        match (
            self.pct_mul.as_slice(),
            self.dim_mul.as_slice(),
            self.dim_div.as_slice(),
            has_others,
        ) {
            ([], [], [], false) => return Some(Term::Number(scalar)),
            ([percentage], [], [], false) => return Some(Term::Percentage(percentage * scalar)),
            ([], [(value, unit)], [], false) => {
                return Some(Term::Dimension(value * scalar, unit.clone()))
            },
            ([], [(numerator, a)], [(denominator, b)], false) if a == b && *denominator != 0. => {
                return Some(Term::Number(scalar * numerator / denominator))
            },
            _ => {},
        }

        let mut numerator = vec![];
        let has_numerator_factors =
            !self.pct_mul.is_empty() || !self.dim_mul.is_empty() || !self.etc_mul.is_empty();
        if scalar != 1. || !has_numerator_factors {
            numerator.push(format_number(scalar));
        }
        numerator.extend(
            sorted_numbers(&self.pct_mul)
                .into_iter()
                .map(|p| Term::Percentage(p).to_string()),
        );
        numerator.extend(serialize_dimensions(&self.dim_mul));
        numerator.extend(serialize_factors(&self.etc_mul));

        let mut denominator = serialize_dimensions(&self.dim_div);
        denominator.extend(serialize_factors(&self.etc_div));

        let mut expression = numerator.join(" * ");
        match denominator.len() {
            0 => {},
            1 => {
                expression.push_str(" / ");
                expression.push_str(&denominator[0]);
            },
            _ => {
                expression.push_str(" / (");
                expression.push_str(&denominator.join(" * "));
                expression.push(')');
            },
        }

        Some(Term::Expression(expression, ExpressionKind::Product))
    }

    /// Reduce the collected operands of a sum
    #[must_use]
    pub fn sum(&self) -> Option<Term> {
        if !self.has_terms {
            return None;
        }

        let number = (!self.num_sum.is_empty()).then(|| self.num_sum.iter().sum::<f64>());
        let percentage = (!self.pct_sum.is_empty()).then(|| self.pct_sum.iter().sum::<f64>());

        // Fold dimensions that share a unit
        let mut dimensions: Vec<(f64, String)> = vec![];
        for (value, unit) in self
            .dim_sum
            .iter()
            .map(|(value, unit)| (*value, unit))
            .chain(self.dim_sub.iter().map(|(value, unit)| (-*value, unit)))
        {
            match dimensions.iter_mut().find(|(_, known)| known == unit) {
                Some((total, _)) => *total += value,
                None => dimensions.push((value, unit.clone())),
            }
        }
        dimensions.sort_by(compare_dimensions);

        let has_others = !self.etc_sum.is_empty() || !self.etc_sub.is_empty();

        // Anything that reduces to a single value is returned as-is
        match (number, percentage, dimensions.as_slice(), has_others) {
            (Some(n), None, [], false) => return Some(Term::Number(n)),
            (None, Some(p), [], false) => return Some(Term::Percentage(p)),
            (None, None, [(value, unit)], false) => {
                return Some(Term::Dimension(*value, unit.clone()))
            },
            (None, None, [], false) => return None,
            (None, None, [], true) if self.etc_sub.is_empty() && self.etc_sum.len() == 1 => {
                return Some(self.etc_sum[0].clone())
            },
            _ => {},
        }

        if number.is_some_and(f64::is_nan) {
            return Some(Term::Number(f64::NAN));
        }

        let mut positive = vec![];
        let mut negative = vec![];

        let only_number = percentage.is_none() && dimensions.is_empty() && !has_others;
        if let Some(n) = number.filter(|n| *n != 0. || only_number) {
            if n < 0. {
                negative.push(format_number(-n));
            } else {
                positive.push(format_number(n));
            }
        }

        if let Some(p) = percentage {
            if p < 0. {
                negative.push(Term::Percentage(-p).to_string());
            } else {
                positive.push(Term::Percentage(p).to_string());
            }
        }

        for (value, unit) in dimensions {
            if value < 0. {
                negative.push(Term::Dimension(-value, unit).to_string());
            } else {
                positive.push(Term::Dimension(value, unit).to_string());
            }
        }

        positive.extend(sorted_terms(&self.etc_sum).iter().map(|term| {
            if term.is_product() {
                format!("({term})")
            } else {
                term.to_string()
            }
        }));
        negative.extend(sorted_terms(&self.etc_sub).iter().map(|term| {
            if term.is_product() || term.is_sum() {
                format!("({term})")
            } else {
                term.to_string()
            }
        }));

        let expression = match (positive.is_empty(), negative.len()) {
            (_, 0) => positive.join(" + "),
            (true, 1) => format!("-1 * {}", negative[0]),
            (true, _) => format!("-1 * ({})", negative.join(" + ")),
            (false, 1) => format!("{} - {}", positive.join(" + "), negative[0]),
            (false, _) => format!("{} - ({})", positive.join(" + "), negative.join(" + ")),
        };

        Some(Term::Expression(expression, ExpressionKind::Sum))
    }
}

fn sorted_numbers(numbers: &[f64]) -> Vec<f64> {
    let mut numbers = numbers.to_vec();
    numbers.sort_by(f64::total_cmp);
    numbers
}

/// Dimensions are grouped by unit, then ordered by value
fn compare_dimensions(a: &(f64, String), b: &(f64, String)) -> Ordering {
    a.1.cmp(&b.1).then(a.0.total_cmp(&b.0))
}

fn serialize_dimensions(dimensions: &[(f64, String)]) -> Vec<String> {
    let mut dimensions = dimensions.to_vec();
    dimensions.sort_by(compare_dimensions);
    dimensions
        .into_iter()
        .map(|(value, unit)| Term::Dimension(value, unit).to_string())
        .collect()
}

fn sorted_terms(terms: &[Term]) -> Vec<Term> {
    let mut terms = terms.to_vec();
    terms.sort_by_key(ToString::to_string);
    terms
}

fn serialize_factors(terms: &[Term]) -> Vec<String> {
    sorted_terms(terms)
        .iter()
        .map(|term| {
            if term.is_sum() {
                format!("({term})")
            } else {
                term.to_string()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Calculator, ExpressionKind, Term};

    fn dimension(value: f64, unit: &str) -> Term {
        Term::Dimension(value, unit.to_string())
    }

    fn symbol(name: &str) -> Term {
        Term::Symbol(name.to_string())
    }

    #[test]
    fn empty_calculator() {
        let calculator = Calculator::default();
        assert_eq!(calculator.sum(), None);
        assert_eq!(calculator.multiply(), None);
    }

    #[test]
    fn fold_numbers() {
        let mut calculator = Calculator::default();
        calculator.multiply_by(Term::Number(1.));
        calculator.divide_by(Term::Number(2.));
        assert_eq!(calculator.multiply(), Some(Term::Number(0.5)));

        let mut calculator = Calculator::default();
        calculator.add(Term::Number(1.));
        calculator.subtract(Term::Number(3.));
        assert_eq!(calculator.sum(), Some(Term::Number(-2.)));
    }

    #[test]
    fn special_values_in_products() {
        let mut calculator = Calculator::default();
        calculator.multiply_by(Term::Number(0.));
        calculator.multiply_by(symbol("a"));
        assert_eq!(calculator.multiply(), Some(Term::Number(0.)));

        let mut calculator = Calculator::default();
        calculator.multiply_by(Term::Number(f64::NAN));
        calculator.multiply_by(Term::Number(2.));
        let product = calculator.multiply();
        assert!(matches!(product, Some(Term::Number(n)) if n.is_nan()));

        let mut calculator = Calculator::default();
        calculator.multiply_by(Term::Number(-1.));
        calculator.divide_by(Term::Number(0.));
        assert_eq!(calculator.multiply(), Some(Term::Number(f64::NEG_INFINITY)));
    }

    #[test]
    fn scalar_is_absorbed_by_single_unit() {
        let mut calculator = Calculator::default();
        calculator.multiply_by(Term::Number(2.));
        calculator.multiply_by(dimension(3., "px"));
        assert_eq!(calculator.multiply(), Some(dimension(6., "px")));

        let mut calculator = Calculator::default();
        calculator.multiply_by(Term::Percentage(50.));
        calculator.divide_by(Term::Number(2.));
        assert_eq!(calculator.multiply(), Some(Term::Percentage(25.)));
    }

    #[test]
    fn unfoldable_products() {
        let mut calculator = Calculator::default();
        calculator.multiply_by(symbol("a"));
        calculator.multiply_by(Term::Number(0.5));
        assert_eq!(
            calculator.multiply(),
            Some(Term::Expression(
                "0.5 * a".to_string(),
                ExpressionKind::Product
            ))
        );

        let mut calculator = Calculator::default();
        calculator.multiply_by(dimension(2., "em"));
        calculator.divide_by(symbol("b"));
        calculator.divide_by(dimension(1., "vw"));
        assert_eq!(
            calculator.multiply(),
            Some(Term::Expression(
                "2em / (1vw * b)".to_string(),
                ExpressionKind::Product
            ))
        );
    }

    #[test]
    fn dimensions_fold_per_unit() {
        let mut calculator = Calculator::default();
        for term in [
            dimension(-1., "px"),
            dimension(3., "px"),
            dimension(4., "px"),
            dimension(1., "vw"),
            dimension(2., "em"),
        ] {
            calculator.add(term);
        }
        assert_eq!(
            calculator.sum(),
            Some(Term::Expression(
                "2em + 6px + 1vw".to_string(),
                ExpressionKind::Sum
            ))
        );
    }

    #[test]
    fn product_factors_are_sorted() {
        let mut calculator = Calculator::default();
        for term in [
            dimension(1., "vw"),
            dimension(4., "px"),
            dimension(5., "em"),
            dimension(-1., "px"),
            dimension(2., "em"),
            dimension(3., "px"),
            dimension(2., "em"),
        ] {
            calculator.multiply_by(term);
        }
        assert_eq!(
            calculator.multiply(),
            Some(Term::Expression(
                "2em * 2em * 5em * -1px * 3px * 4px * 1vw".to_string(),
                ExpressionKind::Product
            ))
        );
    }

    #[test]
    fn products_are_parenthesized_in_sums() {
        let half_a = Term::Expression("0.5 * a".to_string(), ExpressionKind::Product);
        let mut calculator = Calculator::default();
        calculator.add(half_a.clone());
        calculator.add(half_a);
        assert_eq!(
            calculator.sum(),
            Some(Term::Expression(
                "(0.5 * a) + (0.5 * a)".to_string(),
                ExpressionKind::Sum
            ))
        );
    }

    #[test]
    fn subtraction_without_positive_terms() {
        let mut calculator = Calculator::default();
        calculator.subtract(symbol("a"));
        assert_eq!(
            calculator.sum(),
            Some(Term::Expression("-1 * a".to_string(), ExpressionKind::Sum))
        );

        let mut calculator = Calculator::default();
        calculator.subtract(symbol("a"));
        calculator.subtract(symbol("b"));
        assert_eq!(
            calculator.sum(),
            Some(Term::Expression(
                "-1 * (a + b)".to_string(),
                ExpressionKind::Sum
            ))
        );
    }

    #[test]
    fn numbers_come_first() {
        let mut calculator = Calculator::default();
        calculator.add(symbol("r"));
        calculator.add(Term::Number(10.));
        calculator.subtract(dimension(1., "px"));
        assert_eq!(
            calculator.sum(),
            Some(Term::Expression(
                "10 + r - 1px".to_string(),
                ExpressionKind::Sum
            ))
        );
    }

    #[test]
    fn zero_is_dropped_next_to_other_terms() {
        let mut calculator = Calculator::default();
        calculator.add(Term::Number(0.));
        calculator.add(symbol("g"));
        calculator.add(symbol("b"));
        assert_eq!(
            calculator.sum(),
            Some(Term::Expression("b + g".to_string(), ExpressionKind::Sum))
        );
    }
}
