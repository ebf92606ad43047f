use hashbrown::HashMap;
use num::{BigInt, BigRational, BigUint, One, Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::automaton::{AutomatonKind, bdd::Bit, dfa::Dfa};

/// Counts accepted words through the transfer matrix of an automaton.
///
/// The matrix only covers reachable states that can still reach acceptance,
/// so the sink and every other dead state drop out. The weight of an entry is
/// the number of symbols leading from one state to the other. The counter
/// does not keep a reference to the automaton and can be serialized and
/// restored on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolicCounter {
    kind: AutomatonKind,
    /// Sparse rows of `(column, weight)`.
    rows: Vec<Vec<(usize, BigUint)>>,
    /// `None` if the start state is dead.
    start: Option<usize>,
    accepting: Vec<usize>,
    /// Members of the language that are not words of the automaton, e.g. the
    /// `-1` of an integer automaton. They are added to every bounded count.
    extra: BigUint,
}

/// `a(n) = coefficients[0]·a(n-1) + … + coefficients[k-1]·a(n-k)` for
/// `n >= k`, and `a(n) = initial[n]` below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearRecurrence {
    pub coefficients: Vec<BigInt>,
    pub initial: Vec<BigInt>,
}

impl LinearRecurrence {
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }

    pub fn evaluate(&self, n: u64) -> BigInt {
        let k = self.order();
        if k == 0 {
            return BigInt::zero();
        }
        if (n as usize) < k {
            return self.initial[n as usize].clone();
        }

        let mut window = self.initial.clone();
        for _ in k as u64..=n {
            let next = self
                .coefficients
                .iter()
                .zip(window.iter().rev())
                .map(|(c, a)| c * a)
                .sum::<BigInt>();
            window.remove(0);
            window.push(next);
        }

        window[k - 1].clone()
    }
}

/// `numerator(x) / denominator(x)`, coefficients from the constant term up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratingFunction {
    pub numerator: Vec<BigInt>,
    pub denominator: Vec<BigInt>,
}

impl SymbolicCounter {
    pub fn from_dfa(dfa: &Dfa, kind: AutomatonKind) -> Self {
        let live = dfa.live_states();
        let states = dfa
            .reachable_states()
            .into_iter()
            .filter(|state| live[*state])
            .collect::<Vec<_>>();
        let index = states
            .iter()
            .enumerate()
            .map(|(i, state)| (*state, i))
            .collect::<HashMap<_, _>>();

        let rows = states
            .iter()
            .map(|state| {
                let mut weights: HashMap<usize, BigUint> = HashMap::new();
                for (pattern, target) in dfa.paths(*state) {
                    let Some(column) = index.get(&target) else {
                        continue;
                    };
                    let free = pattern
                        .iter()
                        .filter(|b| **b == Bit::Any)
                        .count();
                    *weights.entry(*column).or_default() += BigUint::one() << free;
                }
                let mut row = weights.into_iter().collect::<Vec<_>>();
                row.sort_by_key(|(column, _)| *column);
                row
            })
            .collect();

        let accepting = states
            .iter()
            .enumerate()
            .filter(|(_, state)| dfa.is_accepting(**state))
            .map(|(i, _)| i)
            .collect();

        SymbolicCounter {
            kind,
            rows,
            start: index.get(&dfa.start()).copied(),
            accepting,
            extra: BigUint::zero(),
        }
    }

    pub fn with_extra(mut self, extra: u64) -> Self {
        self.extra = BigUint::from(extra);
        self
    }

    pub fn kind(&self) -> AutomatonKind {
        self.kind
    }

    pub fn dimension(&self) -> usize {
        self.rows.len()
    }

    /// Number of accepted words of length at most `bound`.
    pub fn count(&self, bound: u64) -> BigUint {
        self.counts_by_length(bound).into_iter().sum::<BigUint>() + &self.extra
    }

    /// Number of accepted words of length exactly `length`.
    pub fn count_exact(&self, length: u64) -> BigUint {
        self.counts_by_length(length)
            .pop()
            .unwrap_or_default()
    }

    /// Accepted words per length `0..=bound`, without the extra members.
    fn counts_by_length(&self, bound: u64) -> Vec<BigUint> {
        let Some(start) = self.start else {
            return vec![BigUint::zero(); bound as usize + 1];
        };

        let mut vector = vec![BigUint::zero(); self.dimension()];
        vector[start] = BigUint::one();

        let mut result = Vec::with_capacity(bound as usize + 1);
        for length in 0..=bound {
            result.push(self.accepting.iter().map(|s| &vector[*s]).sum::<BigUint>());
            if length < bound {
                vector = self.step(&vector);
            }
        }

        result
    }

    fn step(&self, vector: &[BigUint]) -> Vec<BigUint> {
        let mut next = vec![BigUint::zero(); self.dimension()];
        for (from, row) in self.rows.iter().enumerate() {
            if vector[from].is_zero() {
                continue;
            }
            for (to, weight) in row {
                next[*to] += &vector[from] * weight;
            }
        }
        next
    }

    /// Coefficients `c_0 = 1, c_1, …, c_m` of the characteristic polynomial
    /// `λ^m + c_1·λ^(m-1) + … + c_m` of the transfer matrix, computed with the
    /// Faddeev-LeVerrier algorithm.
    pub fn characteristic_polynomial(&self) -> Vec<BigInt> {
        let m = self.dimension();
        let mut matrix = vec![vec![BigRational::zero(); m]; m];
        for (from, row) in self.rows.iter().enumerate() {
            for (to, weight) in row {
                matrix[from][*to] = BigRational::from_integer(BigInt::from(weight.clone()));
            }
        }

        let mut coefficients = vec![BigRational::one()];
        let mut current = vec![vec![BigRational::zero(); m]; m];

        for k in 1..=m {
            let mut next = multiply(&matrix, &current);
            for (i, row) in next.iter_mut().enumerate() {
                row[i] += &coefficients[k - 1];
            }
            let product = multiply(&matrix, &next);
            let trace = (0..m).map(|i| product[i][i].clone()).sum::<BigRational>();
            coefficients.push(-trace / BigRational::from_integer(BigInt::from(k)));
            current = next;
        }

        coefficients.into_iter().map(|c| c.to_integer()).collect()
    }

    /// Linear recurrence of the number of accepted words of exactly a given
    /// length.
    pub fn exact_recurrence(&self) -> LinearRecurrence {
        let polynomial = self.characteristic_polynomial();
        self.recurrence_from(&polynomial, |counter, n| counter.count_exact(n))
    }

    /// Linear recurrence of `count(bound)` without the extra members. The
    /// characteristic polynomial is multiplied by `λ - 1` to account for the
    /// running sum.
    pub fn recurrence(&self) -> LinearRecurrence {
        let polynomial = self.characteristic_polynomial();
        let mut cumulative = vec![BigInt::zero(); polynomial.len() + 1];
        for (i, c) in polynomial.iter().enumerate() {
            cumulative[i] += c;
            cumulative[i + 1] -= c;
        }

        self.recurrence_from(&cumulative, |counter, n| {
            counter.count(n) - &counter.extra
        })
    }

    fn recurrence_from(
        &self,
        polynomial: &[BigInt],
        value: impl Fn(&Self, u64) -> BigUint,
    ) -> LinearRecurrence {
        let coefficients = polynomial
            .iter()
            .skip(1)
            .map(|c| -c)
            .collect::<Vec<_>>();
        let initial = (0..coefficients.len() as u64)
            .map(|n| BigInt::from(value(self, n)))
            .collect();

        LinearRecurrence {
            coefficients,
            initial,
        }
    }

    /// The ordinary generating function `Σ count(n)·x^n` as a rational
    /// function, without the extra members.
    pub fn generating_function(&self) -> GeneratingFunction {
        let recurrence = self.recurrence();
        let k = recurrence.order();

        let mut denominator = vec![BigInt::one()];
        denominator.extend(recurrence.coefficients.iter().map(|c| -c));

        let mut numerator = vec![BigInt::zero(); k];
        for (i, q) in denominator.iter().enumerate() {
            for (j, a) in recurrence.initial.iter().enumerate() {
                if i + j < k {
                    numerator[i + j] += q * a;
                }
            }
        }

        while numerator.last().is_some_and(|c| c.is_zero()) {
            numerator.pop();
        }

        GeneratingFunction {
            numerator,
            denominator,
        }
    }

    /// `count(bound)` evaluated through the recurrence.
    pub fn count_symbolic(&self, bound: u64) -> BigUint {
        let value = self.recurrence().evaluate(bound);
        let words = if value.is_negative() {
            BigUint::zero()
        } else {
            value.magnitude().clone()
        };
        words + &self.extra
    }
}

fn multiply(a: &[Vec<BigRational>], b: &[Vec<BigRational>]) -> Vec<Vec<BigRational>> {
    let m = a.len();
    let mut result = vec![vec![BigRational::zero(); m]; m];
    for i in 0..m {
        for k in 0..m {
            if a[i][k].is_zero() {
                continue;
            }
            for j in 0..m {
                if !b[k][j].is_zero() {
                    result[i][j] += &a[i][k] * &b[k][j];
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::dfa::builder::DfaBuilder;

    fn binary_words() -> Dfa {
        let mut builder = DfaBuilder::new(1, 1);
        builder.store_state(0);
        builder.build("+")
    }

    #[test]
    fn counts_binary_words() {
        let counter = SymbolicCounter::from_dfa(&binary_words(), AutomatonKind::Bool);
        assert_eq!(counter.count_exact(3), BigUint::from(8u32));
        assert_eq!(counter.count(3), BigUint::from(15u32));
    }

    #[test]
    fn recurrence_matches_iteration() {
        let counter = SymbolicCounter::from_dfa(&binary_words(), AutomatonKind::Bool);
        let recurrence = counter.recurrence();

        assert_eq!(recurrence.coefficients, vec![BigInt::from(3), BigInt::from(-2)]);
        for n in 0..10 {
            assert_eq!(counter.count_symbolic(n), counter.count(n));
        }
    }

    #[test]
    fn generating_function_of_binary_words() {
        let counter = SymbolicCounter::from_dfa(&binary_words(), AutomatonKind::Bool);
        let gf = counter.generating_function();

        // 1 / ((1 - x)(1 - 2x))
        assert_eq!(gf.numerator, vec![BigInt::one()]);
        assert_eq!(
            gf.denominator,
            vec![BigInt::one(), BigInt::from(-3), BigInt::from(2)]
        );
    }
}
