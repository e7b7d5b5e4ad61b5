// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Indico client library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use serde_json::Value;
use snafu::Snafu;

/// Errors produced while building, issuing or interpreting an export query.
///
/// Usage errors (`MissingQueryType`, `MissingQueryId`, `UnknownQueryType`) are raised before any
/// network traffic. `Transport` and `Decode` abort the single query they occur in.
/// `MalformedResponse` is raised per event result; [Client::get_event](crate::Client::get_event)
/// collects these instead of failing the whole batch.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum IndicoError {
    #[snafu(display("query type must be set, e.g. \"event\", \"category\" or \"room\""))]
    MissingQueryType,

    #[snafu(display("query id must be set"))]
    MissingQueryId,

    #[snafu(display("unknown query type {}", name))]
    UnknownQueryType { name: String },

    #[snafu(display("request to {} failed: {}", url, message))]
    Transport {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[snafu(display("response from {} is not valid JSON: {}", url, source))]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[snafu(display("response from {} has no results list", url))]
    MissingResults { url: String },

    #[snafu(display("malformed response: missing or invalid key {}", key))]
    MalformedResponse { key: String, raw: Value },
}

impl IndicoError {
    /// HTTP status of a failed request, if the server produced a response at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

pub type Result<T, E = IndicoError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_response_names_the_key() {
        let err = IndicoError::MalformedResponse {
            key: "startDate.tz".into(),
            raw: Value::Null,
        };
        assert_eq!(
            err.to_string(),
            "malformed response: missing or invalid key startDate.tz"
        );
    }

    #[test]
    fn only_transport_errors_carry_a_status() {
        let err = IndicoError::Transport {
            url: "https://indico.example.org/export/event/1.json".into(),
            status: Some(404),
            message: "not found".into(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(IndicoError::MissingQueryId.status(), None);
    }
}
