//! Python Bindings
//!
//! Blocking wrappers that expose the three clients as the `ailab_utils`
//! extension module. Each call drives the async client on a runtime owned by
//! the Python object and returns plain dicts/lists.

use crate::api::ChatRequest;
use crate::config::{DEFAULT_LLM_URL, DEFAULT_SIMILARITY_URL, DEFAULT_TASKS_URL};
use crate::error::AilabError;
use crate::services::{ArticleUpdate, LlmClient, SimilarityClient, SiteFields, TasksClient};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyList, PyString};
use serde_json::Value;
use tokio::runtime::Runtime;

fn new_runtime() -> PyResult<Runtime> {
    Runtime::new()
        .map_err(|e| PyErr::from(AilabError::Internal(format!("Failed to create runtime: {}", e))))
}

/// Python wrapper for the task-submission client
#[pyclass(name = "AITasksClient")]
struct PyTasksClient {
    inner: TasksClient,
    runtime: Runtime,
}

#[pymethods]
impl PyTasksClient {
    #[new]
    #[pyo3(signature = (api_key, base_url=DEFAULT_TASKS_URL))]
    fn new(api_key: &str, base_url: &str) -> PyResult<Self> {
        Ok(Self {
            inner: TasksClient::new(api_key, base_url)?,
            runtime: new_runtime()?,
        })
    }

    #[pyo3(signature = (prompt, callback_url, provider=None))]
    fn submit_task(
        &self,
        py: Python<'_>,
        prompt: &str,
        callback_url: &str,
        provider: Option<&str>,
    ) -> PyResult<Py<PyAny>> {
        let result = self
            .runtime
            .block_on(self.inner.submit_task(prompt, callback_url, provider))?;
        Ok(json_to_python(py, &result)?.unbind())
    }
}

/// Python wrapper for the LLM gateway client
#[pyclass(name = "LLMClient")]
struct PyLlmClient {
    inner: LlmClient,
    runtime: Runtime,
}

#[pymethods]
impl PyLlmClient {
    #[new]
    #[pyo3(signature = (api_key, base_url=DEFAULT_LLM_URL))]
    fn new(api_key: &str, base_url: &str) -> PyResult<Self> {
        Ok(Self {
            inner: LlmClient::new(api_key, base_url)?,
            runtime: new_runtime()?,
        })
    }

    /// List of model dicts with id, object, created and owned_by
    fn list_models(&self, py: Python<'_>) -> PyResult<Py<PyAny>> {
        let models = self.runtime.block_on(self.inner.list_models())?;
        let value = serde_json::to_value(models).map_err(AilabError::from)?;
        Ok(json_to_python(py, &value)?.unbind())
    }

    /// Streamed inference; extra keyword arguments are forwarded in the request body
    #[pyo3(signature = (model, prompt, **kwargs))]
    fn inference(
        &self,
        py: Python<'_>,
        model: &str,
        prompt: &str,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Py<PyAny>> {
        let mut request = ChatRequest::new(model, prompt);

        if let Some(extra) = kwargs {
            for (key, value) in extra.iter() {
                let key_str: String = key.extract()?;
                request.extra.insert(key_str, python_to_json(&value)?);
            }
        }

        let completion = self.runtime.block_on(self.inner.chat(&request))?;
        let value = serde_json::to_value(&completion).map_err(AilabError::from)?;
        Ok(json_to_python(py, &value)?.unbind())
    }
}

/// Python wrapper for the similarity client
#[pyclass(name = "SimilarityClient")]
struct PySimilarityClient {
    inner: SimilarityClient,
    runtime: Runtime,
}

impl PySimilarityClient {
    fn run(
        &self,
        py: Python<'_>,
        call: impl std::future::Future<Output = crate::Result<Value>>,
    ) -> PyResult<Py<PyAny>> {
        let value = self.runtime.block_on(call)?;
        Ok(json_to_python(py, &value)?.unbind())
    }
}

#[pymethods]
impl PySimilarityClient {
    #[new]
    #[pyo3(signature = (api_key, base_url=DEFAULT_SIMILARITY_URL))]
    fn new(api_key: &str, base_url: &str) -> PyResult<Self> {
        Ok(Self {
            inner: SimilarityClient::new(api_key, base_url)?,
            runtime: new_runtime()?,
        })
    }

    fn create_page(&self, py: Python<'_>, page_id: i64, text: &str) -> PyResult<Py<PyAny>> {
        self.run(py, self.inner.create_page(page_id, text))
    }

    fn get_pages(&self, py: Python<'_>) -> PyResult<Py<PyAny>> {
        self.run(py, self.inner.get_pages())
    }

    fn get_page(&self, py: Python<'_>, page_id: i64) -> PyResult<Py<PyAny>> {
        self.run(py, self.inner.get_page(page_id))
    }

    fn update_page(&self, py: Python<'_>, page_id: i64, text: &str) -> PyResult<Py<PyAny>> {
        self.run(py, self.inner.update_page(page_id, text))
    }

    fn delete_page(&self, page_id: i64) -> PyResult<()> {
        Ok(self.runtime.block_on(self.inner.delete_page(page_id))?)
    }

    #[pyo3(signature = (site_id, name=None, url=None))]
    fn create_site(
        &self,
        py: Python<'_>,
        site_id: i64,
        name: Option<String>,
        url: Option<String>,
    ) -> PyResult<Py<PyAny>> {
        let fields = SiteFields { name, url };
        self.run(py, self.inner.create_site(site_id, &fields))
    }

    fn get_sites(&self, py: Python<'_>) -> PyResult<Py<PyAny>> {
        self.run(py, self.inner.get_sites())
    }

    #[pyo3(signature = (site_id, name=None, url=None))]
    fn update_site(
        &self,
        py: Python<'_>,
        site_id: i64,
        name: Option<String>,
        url: Option<String>,
    ) -> PyResult<Py<PyAny>> {
        let fields = SiteFields { name, url };
        self.run(py, self.inner.update_site(site_id, &fields))
    }

    fn delete_site(&self, site_id: i64) -> PyResult<()> {
        Ok(self.runtime.block_on(self.inner.delete_site(site_id))?)
    }

    fn create_article(
        &self,
        py: Python<'_>,
        article_id: i64,
        site_id: i64,
        text: &str,
    ) -> PyResult<Py<PyAny>> {
        self.run(py, self.inner.create_article(article_id, site_id, text))
    }

    #[pyo3(signature = (site_id=None))]
    fn get_articles(&self, py: Python<'_>, site_id: Option<i64>) -> PyResult<Py<PyAny>> {
        self.run(py, self.inner.get_articles(site_id))
    }

    #[pyo3(signature = (article_id, site_id=None, text=None))]
    fn update_article(
        &self,
        py: Python<'_>,
        article_id: i64,
        site_id: Option<i64>,
        text: Option<String>,
    ) -> PyResult<Py<PyAny>> {
        let update = ArticleUpdate { id_site: site_id, text };
        self.run(py, self.inner.update_article(article_id, &update))
    }

    fn delete_article(&self, article_id: i64) -> PyResult<()> {
        Ok(self.runtime.block_on(self.inner.delete_article(article_id))?)
    }

    fn find_similar(
        &self,
        py: Python<'_>,
        site_id: i64,
        article_snapshot_id: i64,
        text: &str,
    ) -> PyResult<Py<PyAny>> {
        self.run(py, self.inner.find_similar(site_id, article_snapshot_id, text))
    }
}

/// Convert serde_json::Value to the equivalent Python object
fn json_to_python<'py>(py: Python<'py>, value: &Value) -> PyResult<Bound<'py, PyAny>> {
    let obj = match value {
        Value::Null => py.None().into_bound(py),
        Value::Bool(b) => PyBool::new(py, *b).to_owned().into_any(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into_pyobject(py)?.into_any()
            } else if let Some(u) = n.as_u64() {
                u.into_pyobject(py)?.into_any()
            } else {
                PyFloat::new(py, n.as_f64().unwrap_or(f64::NAN)).into_any()
            }
        }
        Value::String(s) => PyString::new(py, s).into_any(),
        Value::Array(items) => {
            let list = PyList::empty(py);
            for item in items {
                list.append(json_to_python(py, item)?)?;
            }
            list.into_any()
        }
        Value::Object(map) => {
            let dict = PyDict::new(py);
            for (key, item) in map {
                dict.set_item(key, json_to_python(py, item)?)?;
            }
            dict.into_any()
        }
    };
    Ok(obj)
}

/// Convert Python object to serde_json::Value
fn python_to_json(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if obj.is_none() {
        Ok(Value::Null)
    } else if let Ok(b) = obj.extract::<bool>() {
        Ok(Value::Bool(b))
    } else if let Ok(i) = obj.extract::<i64>() {
        Ok(Value::Number(i.into()))
    } else if let Ok(f) = obj.extract::<f64>() {
        Ok(serde_json::json!(f))
    } else if let Ok(s) = obj.extract::<String>() {
        Ok(Value::String(s))
    } else if let Ok(list) = obj.cast::<PyList>() {
        let vec: std::result::Result<Vec<_>, _> =
            list.iter().map(|item| python_to_json(&item)).collect();
        Ok(Value::Array(vec?))
    } else if let Ok(dict) = obj.cast::<PyDict>() {
        let mut map = serde_json::Map::new();
        for (key, value) in dict.iter() {
            let key_str: String = key.extract()?;
            map.insert(key_str, python_to_json(&value)?);
        }
        Ok(Value::Object(map))
    } else {
        // Fallback to string representation
        Ok(Value::String(obj.str()?.to_string()))
    }
}

/// Python module definition
#[pymodule]
fn _ailab_utils(m: &Bound<'_, PyModule>) -> PyResult<()> {
    crate::init_logging();

    m.add_class::<PyTasksClient>()?;
    m.add_class::<PyLlmClient>()?;
    m.add_class::<PySimilarityClient>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
