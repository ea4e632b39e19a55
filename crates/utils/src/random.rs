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

//! Random selection helpers.
//!
//! Callers pass their own `Rng` so that there is no shared randomness state
//! and tests can seed it.

use rand::{seq::SliceRandom, Rng};

/// Shuffle everything after the first `fixed` elements, leaving those in place.
pub fn shuffle_after<T, R: Rng + ?Sized>(items: &mut [T], fixed: usize, rng: &mut R) {
    if fixed < items.len() {
        items[fixed..].shuffle(rng);
    }
}

/// Pick one element uniformly at random.
pub fn pick<'a, T, R: Rng + ?Sized>(items: &'a [T], rng: &mut R) -> Option<&'a T> {
    items.choose(rng)
}
