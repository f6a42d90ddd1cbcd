use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("request controller must be created inside a tokio runtime; use `with_runtime` to pass a handle explicitly")]
    NoRuntime,
}
