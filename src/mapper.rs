// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Indico client library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Translation of raw event export results into [Event] records.
//!
//! Every field is looked up by name. A missing key, or a value of the wrong shape, is reported as
//! [IndicoError::MalformedResponse] naming the path of the key within the result, e.g.
//! `contributions[1].speakers[0].fullName`.

use crate::error::{IndicoError, Result};
use crate::types::{Attachment, Contribution, Event};
use serde_json::Value;

// Internally failures are just the path of the offending key.
type Extract<T> = std::result::Result<T, String>;

impl Event {
    /// Build an event from one entry of the `results` list of an event export.
    pub fn from_result(result: &Value) -> Result<Self> {
        event(result).map_err(|key| IndicoError::MalformedResponse {
            key,
            raw: result.clone(),
        })
    }
}

fn event(result: &Value) -> Extract<Event> {
    let start = member(result, "startDate", "")?;
    let contributions = array(result, "contributions", "")?
        .iter()
        .enumerate()
        .filter_map(|(i, c)| {
            let at = format!("contributions[{}]", i);
            match c.get("startDate") {
                None | Some(Value::Null) => None,
                Some(_) => Some(contribution(c, &at)),
            }
        })
        .collect::<Extract<Vec<_>>>()?;
    Ok(Event {
        id: text(result, "id", "")?,
        category: text(result, "category", "")?,
        room: optional_text(result, "roomFullname", "")?,
        title: text(result, "title", "")?,
        location: optional_text(result, "location", "")?,
        start_date: text(start, "date", "startDate")?,
        start_time: text(start, "time", "startDate")?,
        timezone: text(start, "tz", "startDate")?,
        contributions,
    })
}

fn contribution(c: &Value, at: &str) -> Extract<Contribution> {
    let start_at = join(at, "startDate");
    let start = member(c, "startDate", at)?;
    let speakers = array(c, "speakers", at)?
        .iter()
        .enumerate()
        .map(|(i, s)| text(s, "fullName", &format!("{}.speakers[{}]", at, i)))
        .collect::<Extract<Vec<_>>>()?;
    let mut attachments = vec![];
    for (i, folder) in array(c, "folders", at)?.iter().enumerate() {
        let folder_at = format!("{}.folders[{}]", at, i);
        for (j, a) in array(folder, "attachments", &folder_at)?.iter().enumerate() {
            let attachment_at = format!("{}.attachments[{}]", folder_at, j);
            if text(a, "type", &attachment_at)? == "file" {
                attachments.push(Attachment {
                    filename: text(a, "filename", &attachment_at)?,
                    title: text(a, "title", &attachment_at)?,
                    download_url: text(a, "download_url", &attachment_at)?,
                });
            }
        }
    }
    Ok(Contribution {
        title: text(c, "title", at)?,
        start_time: text(start, "time", &start_at)?,
        timezone: text(start, "tz", &start_at)?,
        speakers,
        attachments,
    })
}

fn join(at: &str, key: &str) -> String {
    if at.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", at, key)
    }
}

fn member<'a>(value: &'a Value, key: &str, at: &str) -> Extract<&'a Value> {
    value.get(key).ok_or_else(|| join(at, key))
}

fn array<'a>(value: &'a Value, key: &str, at: &str) -> Extract<&'a Vec<Value>> {
    member(value, key, at)?
        .as_array()
        .ok_or_else(|| join(at, key))
}

// Ids come back as strings or numbers depending on the server version.
fn text(value: &Value, key: &str, at: &str) -> Extract<String> {
    optional_text(value, key, at)?.ok_or_else(|| join(at, key))
}

fn optional_text(value: &Value, key: &str, at: &str) -> Extract<Option<String>> {
    match member(value, key, at)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(join(at, key)),
    }
}
