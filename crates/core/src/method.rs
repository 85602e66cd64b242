use http::Method;

use crate::MatrixError;

/// Fails with `M_UNRECOGNIZED` unless `method` is one of `allowed`.
pub fn check_method(allowed: &[Method], method: &Method) -> Result<(), MatrixError> {
    if allowed.contains(method) {
        Ok(())
    } else {
        Err(MatrixError::unrecognized("Unrecognized request"))
    }
}
