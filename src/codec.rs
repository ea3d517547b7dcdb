use std::fmt;

use crate::error::MalformedKeyError;
use crate::{MovieId, UserId};

pub const KEY_SEPARATOR: char = '_';

/// A `(user, movie)` pair as it travels through the prediction pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey {
    pub user_id: UserId,
    pub movie_id: MovieId,
}

impl CompositeKey {
    pub fn new(user_id: UserId, movie_id: MovieId) -> Self {
        CompositeKey { user_id, movie_id }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.user_id, KEY_SEPARATOR, self.movie_id)
    }
}

/// Translates between the `"<userId>_<movieId>"` string form and [`CompositeKey`].
///
/// Only the first separator splits the input; anything after it belongs to the
/// movie component, so `"1_2_3"` is rejected rather than silently truncated.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyCodec;

impl KeyCodec {
    pub fn new() -> Self {
        KeyCodec
    }

    pub fn decode(&self, raw: &str) -> Result<CompositeKey, MalformedKeyError> {
        let (user_part, movie_part) = raw
            .split_once(KEY_SEPARATOR)
            .ok_or_else(|| MalformedKeyError::missing_separator(raw))?;
        let user_id = parse_component(raw, "userId", user_part)?;
        let movie_id = parse_component(raw, "movieId", movie_part)?;
        Ok(CompositeKey { user_id, movie_id })
    }

    pub fn encode(&self, key: &CompositeKey) -> String {
        key.to_string()
    }
}

fn parse_component(raw: &str, component: &'static str, part: &str) -> Result<u64, MalformedKeyError> {
    if part.is_empty() {
        return Err(MalformedKeyError::empty_component(raw, component));
    }
    // u64::from_str would also accept a leading '+'
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedKeyError::not_a_number(raw, component));
    }
    part.parse::<u64>()
        .map_err(|_| MalformedKeyError::out_of_range(raw, component))
}
