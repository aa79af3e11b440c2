//! Python bindings for vcfidx using PyO3
//!
//! Exposes `build`, `load`, `search` and `free`. A freed handle raises on
//! further use instead of touching released memory.

#[cfg(feature = "python")]
use pyo3::exceptions::{PyFileNotFoundError, PyIOError, PyRuntimeError, PyValueError};
#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
use std::path::PathBuf;

#[cfg(feature = "python")]
use crate::{Error, IndexHandle, engine};

/// Python module for vcfidx
#[cfg(feature = "python")]
#[pymodule]
fn vcfidx(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Index>()?;
    m.add_class::<Location>()?;
    m.add_function(wrap_pyfunction!(build, m)?)?;
    m.add_function(wrap_pyfunction!(load, m)?)?;
    m.add_function(wrap_pyfunction!(search, m)?)?;
    m.add_function(wrap_pyfunction!(free, m)?)?;
    Ok(())
}

#[cfg(feature = "python")]
fn to_py_err(e: Error) -> PyErr {
    let message = format!("{}: {}", e.kind(), e);
    match e {
        Error::NotFound(_) => PyFileNotFoundError::new_err(message),
        Error::Io(_) => PyIOError::new_err(message),
        Error::Internal(_) => PyRuntimeError::new_err(message),
        _ => PyValueError::new_err(message),
    }
}

/// Loaded index; pass to `search`, release with `free`
#[cfg(feature = "python")]
#[pyclass]
pub struct Index {
    inner: Option<IndexHandle>,
}

#[cfg(feature = "python")]
impl Index {
    fn handle(&self) -> PyResult<&IndexHandle> {
        self.inner
            .as_ref()
            .ok_or_else(|| PyRuntimeError::new_err("index handle was already freed"))
    }
}

/// Search result: `n` matching lines starting at byte `offset`
#[cfg(feature = "python")]
#[pyclass]
#[derive(Clone, Copy)]
pub struct Location {
    #[pyo3(get)]
    n: u64,
    #[pyo3(get)]
    offset: u64,
}

#[cfg(feature = "python")]
#[pymethods]
impl Location {
    fn __repr__(&self) -> String {
        format!("Location(n={}, offset={})", self.n, self.offset)
    }
}

/// Build `<vcf>.idx` (vcf must be sorted by chromosome and position)
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(signature = (vcf, bsize=crate::DEFAULT_BIN_SIZE))]
fn build(py: Python<'_>, vcf: PathBuf, bsize: u32) -> PyResult<()> {
    py.allow_threads(|| engine::build(&vcf, bsize))
        .map(|_| ())
        .map_err(to_py_err)
}

/// Load the index of `vcf`
#[cfg(feature = "python")]
#[pyfunction]
fn load(py: Python<'_>, vcf: PathBuf) -> PyResult<Index> {
    let handle = py.allow_threads(|| engine::load(&vcf)).map_err(to_py_err)?;
    Ok(Index {
        inner: Some(handle),
    })
}

/// Count lines of `chrom` between `start` and `end` (inclusive)
#[cfg(feature = "python")]
#[pyfunction]
fn search(
    py: Python<'_>,
    vcf: PathBuf,
    idx: PyRef<'_, Index>,
    chrom: &str,
    start: u64,
    end: u64,
) -> PyResult<Location> {
    let handle = idx.handle()?;
    let result = py
        .allow_threads(|| engine::search(&vcf, handle, chrom, start, end))
        .map_err(to_py_err)?;
    Ok(Location {
        n: result.line_count,
        offset: result.offset,
    })
}

/// Release the memory held by `idx`
#[cfg(feature = "python")]
#[pyfunction]
fn free(mut idx: PyRefMut<'_, Index>) -> PyResult<()> {
    let handle = idx
        .inner
        .take()
        .ok_or_else(|| PyRuntimeError::new_err("index handle was already freed"))?;
    engine::release(handle);
    Ok(())
}
