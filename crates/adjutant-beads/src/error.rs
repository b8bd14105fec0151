#[derive(Debug, thiserror::Error)]
pub enum BeadsError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("subprocess error: {0}")]
    Subprocess(String),
    #[error("timed out invoking bd")]
    Timeout,
}

/// Classify a non-zero `bd` exit by its stderr text, per the gateway's
/// failure-semantics contract: `not found | no such | missing` (any case)
/// means `NotFound`, everything else is a raw `Subprocess` error.
pub fn classify_stderr(stderr: &str) -> BeadsError {
    let lower = stderr.to_lowercase();
    if lower.contains("not found") || lower.contains("no such") || lower.contains("missing") {
        BeadsError::NotFound(stderr.to_string())
    } else {
        BeadsError::Subprocess(stderr.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_not_found_variants() {
        assert!(matches!(classify_stderr("Error: bead not found"), BeadsError::NotFound(_)));
        assert!(matches!(classify_stderr("no such bead: adj-1"), BeadsError::NotFound(_)));
        assert!(matches!(classify_stderr("NOT FOUND"), BeadsError::NotFound(_)));
        assert!(matches!(classify_stderr("missing database file"), BeadsError::NotFound(_)));
    }

    #[test]
    fn classifies_other_errors_as_subprocess() {
        assert!(matches!(classify_stderr("database is locked"), BeadsError::Subprocess(_)));
    }
}
