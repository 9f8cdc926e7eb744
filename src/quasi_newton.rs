//! Limited-memory quasi-Newton approximations of the Hessian matrix.

use std::collections::VecDeque;

use log::debug;
use nalgebra::DVector;

use crate::core::{LinearOperator, RealField};

/// Limited-memory BFGS approximation of the Hessian matrix.
///
/// Unlike the usual two-loop recursion, which applies the *inverse*
/// approximation, this operator applies the approximation itself, which is
/// what trust-region methods need. It uses the unrolled form
///
/// ```text
/// B v = gamma v + sum_i [(b_i^T v) b_i - (a_i^T v) a_i]
/// ```
///
/// where `b_i = y_i / sqrt(y_i^T s_i)` and `a_i = B_{i-1} s_i / sqrt(s_i^T
/// B_{i-1} s_i)`. The vectors are recomputed whenever a pair is stored,
/// which makes the products `O(m n)`.
///
/// # References
///
/// \[1\] [Numerical Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)
#[derive(Debug, Clone)]
pub struct Lbfgs<T: RealField> {
    dim: usize,
    memory: usize,
    pairs: VecDeque<(DVector<T>, DVector<T>)>,
    a: Vec<DVector<T>>,
    b: Vec<DVector<T>>,
    gamma: T,
}

impl<T: RealField> Lbfgs<T> {
    /// Initializes an empty approximation (identity) of given dimension,
    /// storing at most `memory` pairs.
    pub fn new(dim: usize, memory: usize) -> Self {
        assert!(memory > 0, "memory must be greater than zero");

        Self {
            dim,
            memory,
            pairs: VecDeque::with_capacity(memory),
            a: Vec::with_capacity(memory),
            b: Vec::with_capacity(memory),
            gamma: T::one(),
        }
    }

    /// Maximum number of stored pairs.
    pub fn memory(&self) -> usize {
        self.memory
    }

    /// Number of currently stored pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Determines whether no pair is stored.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Stores a pair of step `s` and gradient difference `y`.
    ///
    /// Pairs violating the curvature condition `y^T s > sqrt(eps) ||s||
    /// ||y||` are skipped, otherwise the approximation would lose positive
    /// definiteness. Returns whether the pair was stored.
    pub fn push(&mut self, s: &DVector<T>, y: &DVector<T>) -> bool {
        let ys = y.dot(s);

        if ys <= T::EPSILON_SQRT * s.norm() * y.norm() {
            debug!("skipping quasi-Newton pair with curvature {}", ys);
            return false;
        }

        if self.pairs.len() == self.memory {
            self.pairs.pop_front();
        }

        self.pairs.push_back((s.clone_owned(), y.clone_owned()));
        self.gamma = y.norm_squared() / ys;
        self.update();

        true
    }

    /// Forgets all pairs.
    pub fn reset(&mut self) {
        self.pairs.clear();
        self.a.clear();
        self.b.clear();
        self.gamma = T::one();
    }

    /// Computes `out = B v`.
    pub fn apply(&self, v: &DVector<T>, out: &mut DVector<T>) {
        out.copy_from(v);
        *out *= self.gamma;

        for (ai, bi) in self.a.iter().zip(self.b.iter()) {
            out.axpy(bi.dot(v), bi, T::one());
            out.axpy(-ai.dot(v), ai, T::one());
        }
    }

    fn update(&mut self) {
        self.a.clear();
        self.b.clear();

        for (s, y) in self.pairs.iter() {
            let bi = y / y.dot(s).sqrt();

            let mut bs = s * self.gamma;
            for (aj, bj) in self.a.iter().zip(self.b.iter()) {
                bs.axpy(bj.dot(s), bj, T::one());
                bs.axpy(-aj.dot(s), aj, T::one());
            }

            let sbs = s.dot(&bs);
            let ai = if sbs > T::zero() {
                bs / sbs.sqrt()
            } else {
                DVector::zeros(self.dim)
            };

            self.a.push(ai);
            self.b.push(bi);
        }
    }
}

impl<T: RealField> LinearOperator<T> for Lbfgs<T> {
    fn dim(&self) -> usize {
        self.dim
    }

    fn apply_to(&mut self, v: &DVector<T>, out: &mut DVector<T>) {
        self.apply(v, out);
    }
}
