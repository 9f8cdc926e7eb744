//! Matrix-free linear operators and restriction to a subset of variables.

use nalgebra::{DMatrix, DVector};

use super::base::RealField;

/// A square linear operator available only through matrix-vector products.
///
/// Hessian matrices are never formed explicitly by the algorithms in this
/// crate. Instead, they are accessed through this trait which allows to use
/// analytic Hessian-vector products, finite differences or quasi-Newton
/// approximations interchangeably.
pub trait LinearOperator<T: RealField> {
    /// Dimensionality of the operator.
    fn dim(&self) -> usize;

    /// Computes `out = A v`.
    ///
    /// The method takes `&mut self` so that the implementations can use
    /// internal buffers or count the products.
    fn apply_to(&mut self, v: &DVector<T>, out: &mut DVector<T>);
}

impl<T: RealField> LinearOperator<T> for DMatrix<T> {
    fn dim(&self) -> usize {
        self.nrows()
    }

    fn apply_to(&mut self, v: &DVector<T>, out: &mut DVector<T>) {
        self.mul_to(v, out);
    }
}

impl<T: RealField, O: LinearOperator<T> + ?Sized> LinearOperator<T> for &mut O {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn apply_to(&mut self, v: &DVector<T>, out: &mut DVector<T>) {
        (**self).apply_to(v, out)
    }
}

/// Ordered set of variable indices.
///
/// Represents the selection matrix `Z` whose columns are the unit vectors of
/// the selected variables. [`gather`](IndexSet::gather) then computes `Z^T v`
/// and [`scatter`](IndexSet::scatter) computes `Z v` (only touching the
/// selected components).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSet {
    indices: Vec<usize>,
}

impl IndexSet {
    /// Creates an empty set with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            indices: Vec::with_capacity(capacity),
        }
    }

    /// Removes all indices.
    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// Appends an index. Indices must be pushed in increasing order.
    pub fn push(&mut self, i: usize) {
        debug_assert!(self.indices.last().map_or(true, |&last| last < i));
        self.indices.push(i);
    }

    /// Number of indices in the set.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Determines whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterates the indices in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Gathers the selected components of `full` into a new vector.
    pub fn gather<T: RealField>(&self, full: &DVector<T>) -> DVector<T> {
        DVector::from_iterator(self.len(), self.iter().map(|i| full[i]))
    }

    /// Gathers the selected components of `full` into `part`.
    pub fn gather_to<T: RealField>(&self, full: &DVector<T>, part: &mut DVector<T>) {
        for (k, i) in self.iter().enumerate() {
            part[k] = full[i];
        }
    }

    /// Writes the components of `part` to the selected components of `full`.
    pub fn scatter<T: RealField>(&self, part: &DVector<T>, full: &mut DVector<T>) {
        for (k, i) in self.iter().enumerate() {
            full[i] = part[k];
        }
    }

    /// Adds the components of `part` to the selected components of `full`.
    pub fn scatter_add<T: RealField>(&self, part: &DVector<T>, full: &mut DVector<T>) {
        for (k, i) in self.iter().enumerate() {
            full[i] += part[k];
        }
    }
}

/// Operator `Z^T A Z` restricted to a subset of variables.
pub struct RestrictedOperator<'a, T: RealField, O: ?Sized> {
    inner: &'a mut O,
    set: &'a IndexSet,
    v_full: DVector<T>,
    out_full: DVector<T>,
}

impl<'a, T: RealField, O: LinearOperator<T> + ?Sized> RestrictedOperator<'a, T, O> {
    /// Restricts the operator to given set of variables.
    pub fn new(inner: &'a mut O, set: &'a IndexSet) -> Self {
        let n = inner.dim();

        Self {
            inner,
            set,
            v_full: DVector::zeros(n),
            out_full: DVector::zeros(n),
        }
    }
}

impl<'a, T: RealField, O: LinearOperator<T> + ?Sized> LinearOperator<T>
    for RestrictedOperator<'a, T, O>
{
    fn dim(&self) -> usize {
        self.set.len()
    }

    fn apply_to(&mut self, v: &DVector<T>, out: &mut DVector<T>) {
        self.v_full.fill(T::zero());
        self.set.scatter(v, &mut self.v_full);
        self.inner.apply_to(&self.v_full, &mut self.out_full);
        self.set.gather_to(&self.out_full, out);
    }
}
