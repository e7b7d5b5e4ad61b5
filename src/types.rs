// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Indico client library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::error::IndicoError;
use fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A downloadable file attached to a contribution.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub title: String,
    pub download_url: String,
}

impl Display for Attachment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt_as_json(self, f)
    }
}

/// A scheduled contribution (talk) of an event.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contribution {
    pub title: String,
    pub start_time: String,
    pub timezone: String,
    /// Full names, in the order the server lists them.
    pub speakers: Vec<String>,
    /// Only entries of type `file`; links and other attachment types are left out.
    pub attachments: Vec<Attachment>,
}

impl Display for Contribution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt_as_json(self, f)
    }
}

/// An event with its catalogue of scheduled contributions.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub category: String,
    pub room: Option<String>,
    pub title: String,
    pub location: Option<String>,
    pub start_date: String,
    pub start_time: String,
    pub timezone: String,
    /// Contributions without a start date are not part of the catalogue.
    pub contributions: Vec<Contribution>,
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}-{}-{}",
            self.title, self.id, self.start_date, self.start_time, self.timezone
        )
    }
}

/// The outcome of an event query.
///
/// Results that could not be mapped do not fail the query; they are collected in `failures` as
/// [IndicoError::MalformedResponse] errors.
#[derive(Debug, Default)]
pub struct EventBatch {
    pub events: Vec<Event>,
    pub failures: Vec<IndicoError>,
}

impl EventBatch {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

// Display implementation for types which serialize to JSON. Displays as a valid JSON object.
pub fn fmt_as_json<T: Serialize>(v: &T, f: &mut Formatter<'_>) -> fmt::Result {
    let string = serde_json::to_string(v).map_err(|_| fmt::Error)?;
    write!(f, "{}", string)
}
