use derive_more::{Display, From};
use rand::prelude::IndexedRandom;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Client-assigned identifier for an in-flight request.
///
/// Created at request build time and extinguished when the matching venue response arrives or
/// the request times out. Also acts as the primary correlation key when grouping trade records
/// across reconciliation sources.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display, From,
)]
pub struct RequestKey(pub SmolStr);

impl RequestKey {
    /// Construct a `RequestKey` from the specified string.
    ///
    /// Use [`Self::random`] to generate a random stack-allocated `RequestKey`.
    pub fn new<S: Into<SmolStr>>(key: S) -> Self {
        Self(key.into())
    }

    /// Construct a stack-allocated `RequestKey` backed by a 23 byte [`SmolStr`].
    pub fn random() -> Self {
        const LEN_URL_SAFE_SYMBOLS: usize = 64;
        const URL_SAFE_SYMBOLS: [char; LEN_URL_SAFE_SYMBOLS] = [
            '_', '-', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e',
            'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v',
            'w', 'x', 'y', 'z', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M',
            'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
        ];
        // SmolStr can be up to 23 bytes long without allocating
        const LEN_NON_ALLOCATING_KEY: usize = 23;

        let mut thread_rng = rand::rng();

        let random_utf8: [u8; LEN_NON_ALLOCATING_KEY] = std::array::from_fn(|_| {
            let symbol = URL_SAFE_SYMBOLS
                .choose(&mut thread_rng)
                .expect("URL_SAFE_SYMBOLS slice is not empty");

            *symbol as u8
        });

        let random_utf8_str =
            std::str::from_utf8(&random_utf8).expect("URL_SAFE_SYMBOLS are valid utf8");

        Self(SmolStr::new_inline(random_utf8_str))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestKey {
    fn default() -> Self {
        Self::random()
    }
}

/// Venue-assigned order identifier, reported back on execution reports.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display, From,
)]
pub struct OrderId(pub SmolStr);

impl OrderId {
    pub fn new<S: AsRef<str>>(id: S) -> Self {
        Self(SmolStr::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_request_key_is_non_empty_and_inline() {
        let key = RequestKey::random();
        assert_eq!(key.as_str().len(), 23);
    }

    #[test]
    fn test_random_request_keys_differ() {
        assert_ne!(RequestKey::random(), RequestKey::random());
    }
}
