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

use lander_types::constants::{DEFAULT_PRIMARY_RELAY, DEFAULT_REGIONAL_RELAYS};
use lander_utils::random;
use rand::Rng;

/// The relay endpoints a bundle may be submitted to.
///
/// The primary endpoint is always tried first. The remaining endpoints are
/// regional mirrors, tried in a fresh random order for every submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayEndpointPool {
    primary: String,
    regional: Vec<String>,
    status_endpoint: Option<String>,
}

impl Default for RelayEndpointPool {
    fn default() -> Self {
        Self::new(
            DEFAULT_PRIMARY_RELAY.to_string(),
            DEFAULT_REGIONAL_RELAYS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl RelayEndpointPool {
    /// Create a pool from a primary endpoint and its regional mirrors.
    ///
    /// Mirrors equal to the primary are dropped.
    pub fn new(primary: String, regional: Vec<String>) -> Self {
        let regional = regional.into_iter().filter(|r| *r != primary).collect();
        Self {
            primary,
            regional,
            status_endpoint: None,
        }
    }

    /// Create a pool from a list of urls, the first being the primary.
    ///
    /// Returns `None` if the list is empty.
    pub fn from_urls<I>(urls: I) -> Option<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut urls = urls.into_iter();
        let primary = urls.next()?;
        Some(Self::new(primary, urls.collect()))
    }

    /// Poll bundle statuses on a fixed endpoint instead of the endpoint that
    /// accepted the bundle.
    pub fn with_status_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.status_endpoint = endpoint;
        self
    }

    /// The primary endpoint
    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Number of endpoints, including the primary
    pub fn len(&self) -> usize {
        self.regional.len() + 1
    }

    /// Never true, a pool always has a primary endpoint
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All endpoints in the order they should be tried for one submission:
    /// primary first, then the mirrors shuffled.
    pub fn ordered_candidates<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        let mut candidates = Vec::with_capacity(self.len());
        candidates.push(self.primary.clone());
        candidates.extend(self.regional.iter().cloned());
        random::shuffle_after(&mut candidates, 1, rng);
        candidates
    }

    /// Index of the endpoint to move to after `current` reports a rate limit
    pub fn rotate(&self, current: usize) -> usize {
        (current + 1) % self.len()
    }

    /// Where to poll the status of a bundle accepted by `accepted_by`
    pub fn status_endpoint<'a>(&'a self, accepted_by: &'a str) -> &'a str {
        self.status_endpoint.as_deref().unwrap_or(accepted_by)
    }
}
