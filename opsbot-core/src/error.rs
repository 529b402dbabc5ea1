use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure a tool can run into before it is turned into a string.
///
/// `Display` is meant for operators and logs. What the end user (and the
/// language model) sees comes from [`Error::user_message`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Holds the caller's input exactly as it was given.
    #[error("country code '{0}' not supported or found")]
    NotFound(String),

    #[error("directory inconsistency for capital '{capital}': {detail}")]
    ConfigurationInconsistency { capital: String, detail: String },

    #[error("transport failure: {0}")]
    TransportFailure(String),

    #[error("upstream responded with status {status}: {body}")]
    UpstreamError { status: u16, body: String },

    #[error("upstream returned no data for '{0}'")]
    EmptyResult(String),

    #[error("failed to parse upstream response: {0}")]
    ParseFailure(String),

    #[error("missing configuration: {0}")]
    MissingConfiguration(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    ConfigurationInconsistency,
    TransportFailure,
    UpstreamError,
    EmptyResult,
    ParseFailure,
    MissingConfiguration,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::ConfigurationInconsistency { .. } => ErrorKind::ConfigurationInconsistency,
            Error::TransportFailure(_) => ErrorKind::TransportFailure,
            Error::UpstreamError { .. } => ErrorKind::UpstreamError,
            Error::EmptyResult(_) => ErrorKind::EmptyResult,
            Error::ParseFailure(_) => ErrorKind::ParseFailure,
            Error::MissingConfiguration(_) => ErrorKind::MissingConfiguration,
        }
    }

    /// Polite text for the conversation. Never includes status codes or
    /// response bodies.
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidArgument(msg) => format!("Error: {msg}"),
            Error::NotFound(code) => {
                format!("Error: Country code '{code}' not supported or found.")
            }
            Error::ConfigurationInconsistency { capital, .. } => {
                format!("Error: Timezone information not available for capital '{capital}'.")
            }
            Error::TransportFailure(_) => {
                "Error: The weather service could not be reached. Please try again later."
                    .to_string()
            }
            Error::UpstreamError { .. } => {
                "Error: The weather service was unable to process the request.".to_string()
            }
            Error::EmptyResult(city) => {
                format!("Error: No weather data is currently available for {city}.")
            }
            Error::ParseFailure(_) => {
                "Error: The weather service returned data that could not be understood."
                    .to_string()
            }
            Error::MissingConfiguration(what) => {
                format!("Error: The assistant is not configured for this request ({what}).")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_hides_upstream_details() {
        let err = Error::UpstreamError {
            status: 503,
            body: "{\"secret\":\"internal trace\"}".into(),
        };

        let msg = err.user_message();
        assert!(!msg.contains("503"));
        assert!(!msg.contains("internal trace"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn not_found_message_keeps_original_input() {
        let err = Error::NotFound(" xyz ".into());
        assert_eq!(
            err.user_message(),
            "Error: Country code ' xyz ' not supported or found."
        );
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
