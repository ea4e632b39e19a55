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

//! Helpers for consuming broadcast event streams

use std::fmt::Display;

use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Capacity of the event channels.
pub const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Spawn a task calling `handler` for each event until every sender is
/// dropped.
///
/// The task resolves to the number of events handled. Events lost to a
/// lagging receiver are logged and not counted.
pub fn receive_events<T, F>(
    description: &'static str,
    mut rx: broadcast::Receiver<T>,
    mut handler: F,
) -> JoinHandle<u64>
where
    T: Clone + Send + 'static,
    F: FnMut(T) + Send + 'static,
{
    tokio::spawn(async move {
        let mut handled = 0;
        loop {
            match rx.recv().await {
                Ok(event) => {
                    handler(event);
                    handled += 1;
                }
                Err(RecvError::Closed) => {
                    debug!("{description} event stream closed after {handled} events");
                    return handled;
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("{description} event stream lagged, {missed} events missed")
                }
            }
        }
    })
}

/// Log every event at INFO level.
pub fn receive_and_log_events<T>(rx: broadcast::Receiver<T>) -> JoinHandle<u64>
where
    T: Clone + Display + Send + 'static,
{
    receive_events("logging", rx, |event| info!("{event}"))
}
