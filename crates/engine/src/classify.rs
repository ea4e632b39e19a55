// This file is part of Lander.
//
// Lander is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// Lander is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with Lander.
// If not, see https://www.gnu.org/licenses/.

use lander_provider::ProviderError;

/// How a failed submission should be treated
#[derive(Clone, Copy, Debug, PartialEq, Eq, parse_display::Display)]
#[display(style = "snake_case")]
pub enum ErrorClass {
    /// The transaction itself is invalid. Retrying cannot succeed.
    Fatal,
    /// Transient, worth another attempt
    Retryable,
}

// Messages that indicate the transaction can never land as submitted.
const FATAL_PATTERNS: &[&str] = &[
    "insufficient funds",
    "insufficient lamports",
    "invalid signature",
    "signature verification",
    "account not found",
    "accountnotfound",
    "instruction error",
    "instructionerror",
    "custom program error",
];

const RATE_LIMIT_PATTERNS: &[&str] = &[
    "rate limit",
    "rate-limit",
    "ratelimit",
    "too many requests",
    "congested",
];

const ALREADY_PROCESSED_PATTERNS: &[&str] = &["already been processed", "alreadyprocessed"];

const HTTP_TOO_MANY_REQUESTS: u16 = 429;

fn contains_any(message: &str, patterns: &[&str]) -> bool {
    let message = message.to_lowercase();
    patterns.iter().any(|p| message.contains(p))
}

/// Classify an error message. Anything unrecognized is retryable.
pub fn classify_message(message: &str) -> ErrorClass {
    if contains_any(message, FATAL_PATTERNS) {
        ErrorClass::Fatal
    } else {
        ErrorClass::Retryable
    }
}

/// Classify a provider error.
///
/// Transport failures and rate limiting are always retryable, whatever their
/// body says.
pub fn classify(err: &ProviderError) -> ErrorClass {
    match err {
        ProviderError::Timeout
        | ProviderError::Transport(_)
        | ProviderError::CoolingDown { .. } => ErrorClass::Retryable,
        ProviderError::Http { status, .. } if *status == HTTP_TOO_MANY_REQUESTS => {
            ErrorClass::Retryable
        }
        other => classify_message(&other.message()),
    }
}

/// Whether the relay is asking us to slow down
pub fn is_rate_limited(err: &ProviderError) -> bool {
    err.http_status() == Some(HTTP_TOO_MANY_REQUESTS)
        || contains_any(&err.message(), RATE_LIMIT_PATTERNS)
}

/// Whether a send failed only because the ledger has already seen the
/// transaction
pub fn is_already_processed(message: &str) -> bool {
    contains_any(message, ALREADY_PROCESSED_PATTERNS)
}

#[cfg(test)]
mod tests {
    use lander_utils::json_rpc::JsonRpcError;

    use super::*;

    fn rpc(message: &str) -> ProviderError {
        ProviderError::Rpc(JsonRpcError {
            code: -32002,
            message: message.to_string(),
            data: None,
        })
    }

    #[test]
    fn test_fatal_messages() {
        for msg in [
            "Transaction simulation failed: Insufficient funds for fee",
            "insufficient lamports 10, need 20",
            "Invalid signature",
            "signature verification failure",
            "AccountNotFound",
            "Error processing Instruction 0: custom program error: 0x1",
            "InstructionError(0, Custom(1))",
        ] {
            assert_eq!(classify_message(msg), ErrorClass::Fatal, "{msg}");
            assert_eq!(classify(&rpc(msg)), ErrorClass::Fatal, "{msg}");
        }
    }

    #[test]
    fn test_unknown_is_retryable() {
        assert_eq!(classify_message("blockhash not found"), ErrorClass::Retryable);
        assert_eq!(classify(&rpc("something odd")), ErrorClass::Retryable);
        assert_eq!(classify(&ProviderError::Timeout), ErrorClass::Retryable);
        assert_eq!(
            classify(&ProviderError::Transport("connection reset".into())),
            ErrorClass::Retryable
        );
    }

    #[test]
    fn test_rate_limit() {
        let http = ProviderError::Http {
            status: 429,
            body: "slow down".into(),
        };
        assert!(is_rate_limited(&http));
        assert_eq!(classify(&http), ErrorClass::Retryable);

        assert!(is_rate_limited(&rpc("Network congested. Endpoint is globally rate limited.")));
        assert!(is_rate_limited(&rpc("Too Many Requests")));
        assert!(!is_rate_limited(&rpc("bundle dropped")));
        assert!(!is_rate_limited(&ProviderError::Http {
            status: 500,
            body: "internal".into()
        }));
    }

    #[test]
    fn test_rate_limit_body_with_fatal_text_is_retryable() {
        let http = ProviderError::Http {
            status: 429,
            body: "insufficient funds".into(),
        };
        assert_eq!(classify(&http), ErrorClass::Retryable);
    }

    #[test]
    fn test_already_processed() {
        assert!(is_already_processed(
            "Transaction simulation failed: This transaction has already been processed"
        ));
        assert!(is_already_processed("AlreadyProcessed"));
        assert!(!is_already_processed("blockhash not found"));
    }
}
