//! Categorization of CloudTrail lookup failures for log output.
//!
//! The AWS SDK already retries transient failures with exponential backoff.
//! This module only classifies what is left after those retries so a failed
//! region can be logged with a useful label, in particular regions that are not
//! enabled for the account (a routine outcome of `--region all`).

/// Categorized lookup failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Request was throttled by the LookupEvents rate limit
    Throttled { code: String },
    /// Request timed out
    Timeout,
    /// Network connectivity issues
    NetworkError,
    /// CloudTrail temporarily unavailable
    ServiceUnavailable,
    /// Region is opt-in and not enabled, or credentials are not valid there
    RegionNotEnabled { code: String },
    /// Anything else (permissions, validation, etc.)
    Other {
        code: String,
        is_permission_error: bool,
    },
}

impl ErrorCategory {
    /// Short label for log fields
    pub fn short_label(&self) -> &'static str {
        match self {
            ErrorCategory::Throttled { .. } => "throttled",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::NetworkError => "network",
            ErrorCategory::ServiceUnavailable => "unavailable",
            ErrorCategory::RegionNotEnabled { .. } => "region-not-enabled",
            ErrorCategory::Other {
                is_permission_error: true,
                ..
            } => "access-denied",
            ErrorCategory::Other { .. } => "error",
        }
    }

    /// AWS error code, when the failure carried one
    pub fn code(&self) -> Option<&str> {
        match self {
            ErrorCategory::Throttled { code }
            | ErrorCategory::RegionNotEnabled { code }
            | ErrorCategory::Other { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Categorize an `anyhow::Error` wrapping an SDK error.
///
/// The debug form carries the service error code, the display form usually
/// only says "service error", so the debug form is preferred when present.
pub fn categorize_error(error: &anyhow::Error) -> ErrorCategory {
    let error_str = format!("{:#}", error);
    let error_debug = format!("{:?}", error);

    let detail = if error_str.contains("service error") {
        &error_debug
    } else {
        &error_str
    };

    categorize_error_string(detail)
}

/// Categorize an error based on its string representation
pub fn categorize_error_string(error_str: &str) -> ErrorCategory {
    if error_str.contains("ThrottlingException")
        || error_str.contains("Throttling")
        || error_str.contains("TooManyRequestsException")
        || error_str.contains("RequestLimitExceeded")
        || error_str.contains("RateExceeded")
    {
        let code = extract_error_code(error_str).unwrap_or_else(|| "Throttling".to_string());
        return ErrorCategory::Throttled { code };
    }

    // Opt-in regions reject otherwise valid credentials with these codes
    if error_str.contains("UnrecognizedClientException")
        || error_str.contains("InvalidClientTokenId")
        || error_str.contains("OptInRequired")
    {
        let code = extract_error_code(error_str)
            .unwrap_or_else(|| "UnrecognizedClientException".to_string());
        return ErrorCategory::RegionNotEnabled { code };
    }

    if error_str.contains("TimeoutError")
        || error_str.contains("timeout")
        || error_str.contains("timed out")
        || error_str.contains("deadline exceeded")
    {
        return ErrorCategory::Timeout;
    }

    if error_str.contains("DispatchFailure")
        || error_str.contains("connection")
        || error_str.contains("Connection")
        || error_str.contains("dns error")
        || error_str.contains("DNS")
        || error_str.contains("socket")
    {
        return ErrorCategory::NetworkError;
    }

    if error_str.contains("ServiceUnavailable")
        || error_str.contains("InternalServerError")
        || error_str.contains("InternalServerException")
        || error_str.contains("CloudTrailInternal")
    {
        return ErrorCategory::ServiceUnavailable;
    }

    let is_permission_error = error_str.contains("AccessDenied")
        || error_str.contains("AccessDeniedException")
        || error_str.contains("UnauthorizedOperation")
        || error_str.contains("SignatureDoesNotMatch")
        || error_str.contains("ExpiredToken");

    let code = extract_error_code(error_str).unwrap_or_else(|| {
        if is_permission_error {
            "AccessDenied".to_string()
        } else {
            "Error".to_string()
        }
    });

    ErrorCategory::Other {
        code,
        is_permission_error,
    }
}

/// Extract an AWS error code from an error message.
///
/// Recognizes `Code: message` prefixes and `code: Some("Code")` in SDK debug output.
fn extract_error_code(error_str: &str) -> Option<String> {
    const DEBUG_CODE: &str = "code: Some(\"";

    if let Some(start) = error_str.find(DEBUG_CODE) {
        let rest = &error_str[start + DEBUG_CODE.len()..];
        if let Some(end) = rest.find('"') {
            let code = &rest[..end];
            if !code.is_empty() && code.len() < 50 {
                return Some(code.to_string());
            }
        }
    }

    if let Some(pos) = error_str.find(':') {
        let prefix = error_str[..pos].trim();
        if prefix.ends_with("Exception") || prefix.ends_with("Error") || prefix.ends_with("Required")
        {
            let code = prefix.rsplit("::").next().unwrap_or(prefix);
            if !code.is_empty() && code.len() < 50 && !code.contains(' ') {
                return Some(code.to_string());
            }
        }
    }

    None
}
