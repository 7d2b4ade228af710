//! Feature matrices produced by vectorizers and consumed by classifiers

use textserve_core::Result;

/// Compressed sparse row matrix of `f32` values.
///
/// Column indices are sorted ascending within each row.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f32>,
}

impl SparseMatrix {
    /// Build a matrix from per-row `(column, value)` entries.
    ///
    /// Entries within a row must already be sorted by column.
    pub fn from_rows(n_cols: usize, rows: Vec<Vec<(usize, f32)>>) -> Self {
        let nnz = rows.iter().map(Vec::len).sum();
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::with_capacity(nnz);
        let mut data = Vec::with_capacity(nnz);

        indptr.push(0);
        for row in rows {
            for (col, value) in row {
                debug_assert!(col < n_cols);
                indices.push(col);
                data.push(value);
            }
            indptr.push(indices.len());
        }

        Self {
            n_cols,
            indptr,
            indices,
            data,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Iterate over the stored entries of one row
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let (start, end) = (self.indptr[row], self.indptr[row + 1]);
        self.indices[start..end]
            .iter()
            .copied()
            .zip(self.data[start..end].iter().copied())
    }

    /// Expand into a row-major dense matrix
    pub fn to_dense(&self) -> DenseMatrix {
        let mut data = vec![0.0; self.n_rows() * self.n_cols];
        for r in 0..self.n_rows() {
            let offset = r * self.n_cols;
            for (col, value) in self.row(r) {
                data[offset + col] += value;
            }
        }
        DenseMatrix {
            n_rows: self.n_rows(),
            n_cols: self.n_cols,
            data,
        }
    }
}

/// Row-major dense matrix of `f32` values
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f32>,
}

impl DenseMatrix {
    /// Create a dense matrix, checking that `data` has `n_rows * n_cols` values
    pub fn new(n_rows: usize, n_cols: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != n_rows * n_cols {
            return Err(textserve_core::Error::prediction(format!(
                "dense matrix of shape ({n_rows}, {n_cols}) needs {} values, got {}",
                n_rows * n_cols,
                data.len()
            )));
        }
        Ok(Self {
            n_rows,
            n_cols,
            data,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.n_cols..(row + 1) * self.n_cols]
    }

    /// Raw row-major values
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// A batch of feature vectors, one row per input document
#[derive(Debug, Clone, PartialEq)]
pub enum Features {
    Sparse(SparseMatrix),
    Dense(DenseMatrix),
}

impl Features {
    pub fn n_rows(&self) -> usize {
        match self {
            Self::Sparse(m) => m.n_rows(),
            Self::Dense(m) => m.n_rows(),
        }
    }

    /// Number of columns (vocabulary size for count features)
    pub fn n_features(&self) -> usize {
        match self {
            Self::Sparse(m) => m.n_cols(),
            Self::Dense(m) => m.n_cols(),
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, Self::Sparse(_))
    }

    /// Convert to the dense representation, leaving dense input untouched
    pub fn into_dense(self) -> Self {
        match self {
            Self::Sparse(m) => Self::Dense(m.to_dense()),
            dense => dense,
        }
    }

    /// Dot product of one row with a weight vector of length `n_features`
    pub fn dot_row(&self, row: usize, weights: &[f32]) -> f32 {
        match self {
            Self::Sparse(m) => m.row(row).map(|(col, v)| v * weights[col]).sum(),
            Self::Dense(m) => m
                .row(row)
                .iter()
                .zip(weights)
                .map(|(v, w)| v * w)
                .sum(),
        }
    }
}
