// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Indico client library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! # Client for the Indico HTTP export API.
//!
//! [Indico](https://getindico.io) exposes read-only exports of events, categories and rooms under
//! `/export/<kind>/<id>.json`. Requests may carry an API key and, if the account has a shared
//! secret, an HMAC-SHA1 signature over the path and its key-sorted query string. The `signer`
//! module builds these URLs; it is independent of any HTTP stack and can be used on its own to
//! hand out signed links.
//!
//! [Client] issues one request per call through a [Transport] (by default `surf`), decodes the
//! JSON body and, for event queries, maps every result into a typed [Event] with its catalogue of
//! scheduled [Contribution]s and their file [Attachment]s. Category and room exports are returned
//! as plain JSON.
//!
//! ```ignore
//! let client = Client::new(
//!     ClientConfig::new("indico.cern.ch")
//!         .with_api_key(api_key)
//!         .with_secret_key(secret),
//! );
//! let batch = client
//!     .get_event(QuerySpec::event("1234").with_param("detail", "contributions"))
//!     .await?;
//! for event in &batch.events {
//!     println!("{}", event);
//! }
//! ```

pub mod client;
pub mod error;
pub mod mapper;
pub mod query;
pub mod signer;
pub mod types;

pub use client::*;
pub use error::*;
pub use query::*;
pub use signer::*;
pub use types::*;
