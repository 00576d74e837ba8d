use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

// ──────────────────────────────────────────────────────────────────────────────
// JSON-inngang: økter (+ metadata, konfig) → resultatsett som JSON
// ──────────────────────────────────────────────────────────────────────────────

#[pyfunction]
#[pyo3(signature = (sessions_json, metadata_json=None, config_json=None))]
fn analyze_sessions_json(
    sessions_json: &str,
    metadata_json: Option<&str>,
    config_json: Option<&str>,
) -> PyResult<String> {
    crate::analyze_sessions_json(sessions_json, metadata_json, config_json)
        .map_err(|e| PyValueError::new_err(format!("{e:#}")))
}

// ──────────────────────────────────────────────────────────────────────────────
// PyO3-MODUL
// ──────────────────────────────────────────────────────────────────────────────

#[pymodule]
fn runmap_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(analyze_sessions_json, m)?)?;
    Ok(())
}
