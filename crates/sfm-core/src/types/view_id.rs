use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Opaque identifier of a camera view. Never reused within a reconstruction.
pub type ViewId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a view pair needs two distinct views, got ({0}, {0})")]
pub struct SelfPairError(pub ViewId);

/// Unordered pair of two distinct views, stored with the smaller id first.
///
/// `ViewIdPair::new(a, b)` and `ViewIdPair::new(b, a)` compare and hash
/// identically.
///
/// ```
/// use sfm_core::ViewIdPair;
///
/// let p = ViewIdPair::new(7, 2).unwrap();
/// assert_eq!((p.first(), p.second()), (2, 7));
/// assert_eq!(p, ViewIdPair::new(2, 7).unwrap());
/// assert!(ViewIdPair::new(3, 3).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ViewIdPair {
    first: ViewId,
    second: ViewId,
}

impl ViewIdPair {
    pub fn new(a: ViewId, b: ViewId) -> Result<Self, SelfPairError> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Ok(Self {
                first: a,
                second: b,
            }),
            std::cmp::Ordering::Greater => Ok(Self {
                first: b,
                second: a,
            }),
            std::cmp::Ordering::Equal => Err(SelfPairError(a)),
        }
    }

    pub fn first(&self) -> ViewId {
        self.first
    }

    pub fn second(&self) -> ViewId {
        self.second
    }

    /// Whether `view_id` is one of the two endpoints.
    pub fn contains(&self, view_id: ViewId) -> bool {
        self.first == view_id || self.second == view_id
    }
}

impl fmt::Display for ViewIdPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

impl TryFrom<(ViewId, ViewId)> for ViewIdPair {
    type Error = SelfPairError;

    fn try_from((a, b): (ViewId, ViewId)) -> Result<Self, Self::Error> {
        Self::new(a, b)
    }
}

// Deserialization goes through `new` so stored pairs are re-canonicalised
// and self pairs are rejected.
impl<'de> Deserialize<'de> for ViewIdPair {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            first: ViewId,
            second: ViewId,
        }

        let raw = Raw::deserialize(deserializer)?;
        ViewIdPair::new(raw.first, raw.second).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn pair_is_canonical_and_hashes_identically() {
        let a = ViewIdPair::new(4, 1).unwrap();
        let b = ViewIdPair::new(1, 4).unwrap();
        assert_eq!(a, b);
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert!(a.contains(1) && a.contains(4) && !a.contains(2));
    }

    #[test]
    fn self_pair_is_rejected() {
        assert_eq!(ViewIdPair::new(5, 5), Err(SelfPairError(5)));
        assert!(ViewIdPair::try_from((9, 9)).is_err());
    }

    #[test]
    fn deserialization_canonicalises_and_validates() {
        let p: ViewIdPair = serde_json::from_str(r#"{"first": 9, "second": 3}"#).unwrap();
        assert_eq!((p.first(), p.second()), (3, 9));

        let bad = serde_json::from_str::<ViewIdPair>(r#"{"first": 2, "second": 2}"#);
        assert!(bad.is_err());
    }
}
