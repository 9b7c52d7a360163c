use std::collections::HashSet;

use itertools::Itertools;

use crate::errors::{HydrioError, Result};

/// Zero based band selection, either keeping or dropping `selection`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Indexes {
    selection: Vec<usize>,
    drop: bool,
}

impl Default for Indexes {
    fn default() -> Self {
        Self::all()
    }
}

impl<const N: usize> From<([usize; N], bool)> for Indexes {
    fn from(value: ([usize; N], bool)) -> Self {
        let (selection, drop) = value;
        Indexes {
            selection: selection.to_vec(),
            drop,
        }
    }
}

impl<const N: usize> From<[usize; N]> for Indexes {
    fn from(value: [usize; N]) -> Self {
        Indexes::from((value, false))
    }
}

impl From<std::ops::Range<usize>> for Indexes {
    fn from(value: std::ops::Range<usize>) -> Self {
        Indexes {
            selection: value.collect(),
            drop: false,
        }
    }
}

impl Indexes {
    pub fn all() -> Self {
        Self {
            selection: Vec::new(),
            drop: true,
        }
    }

    pub fn is_all(&self) -> bool {
        self.drop && self.selection.is_empty()
    }

    /// Resolves the selection against a collection of `collection_len` items.
    pub fn indexes_from(&self, collection_len: usize) -> Result<Vec<usize>> {
        if let Some(&index) = self.selection.iter().find(|idx| **idx >= collection_len) {
            return Err(HydrioError::BandIndex {
                index,
                count: collection_len,
            });
        }
        if self.drop {
            let drop_idxs: HashSet<&usize> = HashSet::from_iter(self.selection.iter());
            Ok((0..collection_len)
                .filter(|idx| !drop_idxs.contains(idx))
                .collect())
        } else {
            Ok(self.selection.iter().copied().unique().collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_and_drop() {
        assert_eq!(Indexes::all().indexes_from(3).unwrap(), vec![0, 1, 2]);
        assert_eq!(Indexes::from([2, 0]).indexes_from(3).unwrap(), vec![2, 0]);
        assert_eq!(Indexes::from(([1], true)).indexes_from(3).unwrap(), vec![0, 2]);
        assert_eq!(Indexes::from(0..2).indexes_from(2).unwrap(), vec![0, 1]);
        assert!(matches!(
            Indexes::from([3]).indexes_from(3),
            Err(HydrioError::BandIndex { index: 3, count: 3 })
        ));
    }
}
