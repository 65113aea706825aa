use crate::error::{recovered_channels, FilterError};
use crate::filters::FilterSpec;
use crate::processing::FilterBank;

use log::warn;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

fn to_py_err(e: FilterError) -> PyErr {
    match e {
        FilterError::InvalidSpecification(_) | FilterError::ChannelCountMismatch { .. } => {
            PyValueError::new_err(e.to_string())
        }
        _ => PyRuntimeError::new_err(e.to_string()),
    }
}

#[pyclass]
pub struct PyFilterBank {
    bank: FilterBank,
    order: usize,
    f_low: f64,
    f_high: f64,
}

#[pymethods]
impl PyFilterBank {
    #[new]
    #[pyo3(signature = (f_low=500.0, f_high=2000.0, order=2))]
    pub fn new(f_low: f64, f_high: f64, order: usize) -> Self {
        PyFilterBank {
            bank: FilterBank::new(),
            order,
            f_low,
            f_high,
        }
    }

    pub fn configure(&mut self, num_channels: usize, sample_rate: f64) -> PyResult<()> {
        let spec = FilterSpec::new(self.order, self.f_low, self.f_high, sample_rate);
        self.bank.configure(num_channels, spec).map_err(to_py_err)
    }

    /// Filters one buffer (a list of channel lists) and returns it with the
    /// channels that were reset after a non-finite output. State carries over
    /// to the next call.
    pub fn process(&mut self, mut data: Vec<Vec<f64>>) -> PyResult<(Vec<Vec<f64>>, Vec<usize>)> {
        let unstable = recovered_channels(self.bank.process(&mut data)).map_err(to_py_err)?;
        if !unstable.is_empty() {
            warn!("Non-finite output on channel(s) {:?}, state reset", unstable);
        }
        Ok((data, unstable))
    }

    pub fn reset(&mut self) {
        self.bank.reset();
    }

    /// Sections as `[b0, b1, b2, a0, a1, a2]` rows, like scipy's `sos` output.
    pub fn coefficients(&self) -> PyResult<Vec<[f64; 6]>> {
        let cascade = self
            .bank
            .cascade()
            .ok_or_else(|| to_py_err(FilterError::NotConfigured))?;
        Ok(cascade.sections().iter().map(|s| s.coefficients()).collect())
    }

    #[getter]
    pub fn num_channels(&self) -> usize {
        self.bank.num_channels()
    }
}

/// A Python module implemented in Rust.
#[pymodule]
pub fn neural_bandpass(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFilterBank>()?;
    Ok(())
}
