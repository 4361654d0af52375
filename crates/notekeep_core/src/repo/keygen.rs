//! Note key generation.
//!
//! Keys are drawn uniformly over an alphanumeric alphabet from a
//! cryptographically strong generator and re-drawn until unused.

use crate::model::buffer::Buffer;
use log::warn;
use rand::distributions::{Distribution, Slice};
use rand::Rng;

pub const KEY_LEN: usize = 32;

const KEY_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Draws one key of [`KEY_LEN`] characters.
pub fn generate_key<R: Rng + ?Sized>(rng: &mut R) -> String {
    let alphabet = Slice::new(KEY_ALPHABET).expect("key alphabet is not empty");
    alphabet
        .sample_iter(rng)
        .take(KEY_LEN)
        .map(|byte| char::from(*byte))
        .collect()
}

/// Draws keys until one is neither a key nor a tag in `buffer`.
pub fn generate_unique_key<R: Rng + ?Sized>(buffer: &Buffer, rng: &mut R) -> String {
    draw_unique_key(buffer, rng).0
}

/// Returns the unused key together with the number of draws it took.
fn draw_unique_key<R: Rng + ?Sized>(buffer: &Buffer, rng: &mut R) -> (String, usize) {
    let mut draws = 0;
    loop {
        draws += 1;
        let key = generate_key(rng);
        if !buffer.contains_key(&key) && buffer.key_for_tag(&key).is_none() {
            return (key, draws);
        }
        warn!("event=key_generate module=repo status=collision");
    }
}
