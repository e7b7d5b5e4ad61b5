// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Indico client library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::error::{IndicoError, MissingQueryIdSnafu, MissingQueryTypeSnafu, Result};
use serde::{Deserialize, Serialize};
use snafu::OptionExt;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Value of the `limit` parameter when the caller does not set one.
pub const DEFAULT_LIMIT: u32 = 123;

/// The kinds of data the export API serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Event,
    Category,
    Room,
}

impl QueryKind {
    /// The path segment naming this kind in `/export/<kind>/<id>.json`.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Category => "categ",
            Self::Room => "room",
        }
    }
}

impl Display for QueryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

impl FromStr for QueryKind {
    type Err = IndicoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "event" => Ok(Self::Event),
            "category" | "categ" => Ok(Self::Category),
            "room" => Ok(Self::Room),
            _ => Err(IndicoError::UnknownQueryType { name: s.to_string() }),
        }
    }
}

/// A single export query: what to fetch and with which extra parameters.
///
/// Kind and id start out unset so that a query can be assembled piecewise; both are checked
/// when the query is turned into a request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuerySpec {
    kind: Option<QueryKind>,
    id: Option<String>,
    params: BTreeMap<String, String>,
    only_public: bool,
    persistent: bool,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event(id: impl Into<String>) -> Self {
        Self::new().with_kind(QueryKind::Event).with_id(id)
    }

    pub fn category(id: impl Into<String>) -> Self {
        Self::new().with_kind(QueryKind::Category).with_id(id)
    }

    pub fn room(id: impl Into<String>) -> Self {
        Self::new().with_kind(QueryKind::Room).with_id(id)
    }

    pub fn with_kind(mut self, kind: QueryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add an extra query string parameter, replacing any earlier value for `key`.
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Ask the server to only consider public data even if the API key grants more.
    pub fn only_public(mut self, only_public: bool) -> Self {
        self.only_public = only_public;
        self
    }

    /// Sign without a timestamp, producing a URL that does not expire.
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn kind(&self) -> Option<QueryKind> {
        self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_only_public(&self) -> bool {
        self.only_public
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// The export path, `/export/<kind>/<id>.json`.
    pub fn path(&self) -> Result<String> {
        let kind = self.kind.context(MissingQueryTypeSnafu)?;
        let id = self
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .context(MissingQueryIdSnafu)?;
        Ok(format!("/export/{}/{}.json", kind.path_segment(), id))
    }

    /// The extra parameters, with `limit` defaulted to [DEFAULT_LIMIT] if unset.
    pub fn params(&self) -> BTreeMap<String, String> {
        let mut params = self.params.clone();
        params
            .entry("limit".to_string())
            .or_insert_with(|| DEFAULT_LIMIT.to_string());
        params
    }
}
