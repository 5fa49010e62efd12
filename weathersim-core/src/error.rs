use thiserror::Error;

/// Failure while turning a city name into a [`Position`](crate::Position).
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to send request to {service}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} request failed with status {status}: {body}")]
    HttpStatus {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{service} returned status '{status}'")]
    ServiceStatus { service: &'static str, status: String },

    #[error("{service} returned no results for '{query}'")]
    NoResults { service: &'static str, query: String },

    #[error("Failed to parse {service} JSON")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_body_is_kept() {
        assert_eq!(truncate_body("not found"), "not found");
    }

    #[test]
    fn long_body_is_truncated_on_char_boundary() {
        let body = "é".repeat(300);
        let truncated = truncate_body(&body);

        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
    }

    #[test]
    fn service_status_message_names_service() {
        let err = ResolveError::ServiceStatus {
            service: "Google Geocoding",
            status: "ZERO_RESULTS".into(),
        };

        assert_eq!(err.to_string(), "Google Geocoding returned status 'ZERO_RESULTS'");
    }
}
