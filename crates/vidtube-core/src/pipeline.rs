//! Filter → join → project → fold over rows fetched from the store.
//!
//! Joins are batched: the foreign keys of all rows are collected once,
//! deduplicated, and handed to a single fetch closure, so a view costs one
//! store round trip per join stage rather than one per row.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline<T> {
    rows: Vec<T>,
}

impl<T> Pipeline<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self { rows }
    }

    pub fn filter<P>(mut self, mut keep: P) -> Self
    where
        P: FnMut(&T) -> bool,
    {
        self.rows.retain(|row| keep(row));
        self
    }

    /// Inner join: each row is paired with the entity its foreign key points
    /// at. Rows with no key, or whose key matches nothing, are dropped.
    pub fn join<K, U, E, FK, F, PK>(
        self,
        foreign_key: FK,
        fetch: F,
        primary_key: PK,
    ) -> Result<Pipeline<(T, U)>, E>
    where
        K: Eq + Hash + Clone,
        U: Clone,
        FK: Fn(&T) -> Option<K>,
        F: FnOnce(&[K]) -> Result<Vec<U>, E>,
        PK: Fn(&U) -> K,
    {
        let index = self.index(&foreign_key, fetch, primary_key)?;
        let rows = self
            .rows
            .into_iter()
            .filter_map(|row| {
                let matched = foreign_key(&row).and_then(|k| index.get(&k)).cloned()?;
                Some((row, matched))
            })
            .collect();
        Ok(Pipeline { rows })
    }

    /// Left join: like [`join`](Self::join) but keeps unmatched rows.
    pub fn left_join<K, U, E, FK, F, PK>(
        self,
        foreign_key: FK,
        fetch: F,
        primary_key: PK,
    ) -> Result<Pipeline<(T, Option<U>)>, E>
    where
        K: Eq + Hash + Clone,
        U: Clone,
        FK: Fn(&T) -> Option<K>,
        F: FnOnce(&[K]) -> Result<Vec<U>, E>,
        PK: Fn(&U) -> K,
    {
        let index = self.index(&foreign_key, fetch, primary_key)?;
        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                let matched = foreign_key(&row).and_then(|k| index.get(&k)).cloned();
                (row, matched)
            })
            .collect();
        Ok(Pipeline { rows })
    }

    /// One-to-many join: each row gets every fetched entity whose foreign
    /// key equals the row's key, in fetch order. Rows with no matches get an
    /// empty vec.
    pub fn join_many<K, U, E, RK, F, FK>(
        self,
        row_key: RK,
        fetch: F,
        foreign_key: FK,
    ) -> Result<Pipeline<(T, Vec<U>)>, E>
    where
        K: Eq + Hash + Clone,
        U: Clone,
        RK: Fn(&T) -> K,
        F: FnOnce(&[K]) -> Result<Vec<U>, E>,
        FK: Fn(&U) -> Option<K>,
    {
        let keys = unique(self.rows.iter().map(&row_key));
        let mut groups: HashMap<K, Vec<U>> = HashMap::new();
        if !keys.is_empty() {
            for item in fetch(&keys)? {
                if let Some(k) = foreign_key(&item) {
                    groups.entry(k).or_default().push(item);
                }
            }
        }

        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                let matched = groups.get(&row_key(&row)).cloned().unwrap_or_default();
                (row, matched)
            })
            .collect();
        Ok(Pipeline { rows })
    }

    pub fn project<U, F>(self, f: F) -> Pipeline<U>
    where
        F: FnMut(T) -> U,
    {
        Pipeline {
            rows: self.rows.into_iter().map(f).collect(),
        }
    }

    /// Keeps the first row for each key.
    pub fn dedup_by_key<K, F>(mut self, key: F) -> Self
    where
        K: Eq + Hash,
        F: Fn(&T) -> K,
    {
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(key(row)));
        self
    }

    pub fn count(&self) -> u64 {
        self.rows.len() as u64
    }

    pub fn any<P>(&self, pred: P) -> bool
    where
        P: FnMut(&T) -> bool,
    {
        self.rows.iter().any(pred)
    }

    pub fn fold<A, F>(self, init: A, f: F) -> A
    where
        F: FnMut(A, T) -> A,
    {
        self.rows.into_iter().fold(init, f)
    }

    pub fn first(self) -> Option<T> {
        self.rows.into_iter().next()
    }

    pub fn collect(self) -> Vec<T> {
        self.rows
    }

    fn index<K, U, E, FK, F, PK>(
        &self,
        foreign_key: &FK,
        fetch: F,
        primary_key: PK,
    ) -> Result<HashMap<K, U>, E>
    where
        K: Eq + Hash + Clone,
        FK: Fn(&T) -> Option<K>,
        F: FnOnce(&[K]) -> Result<Vec<U>, E>,
        PK: Fn(&U) -> K,
    {
        let keys = unique(self.rows.iter().filter_map(foreign_key));
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(fetch(&keys)?
            .into_iter()
            .map(|item| (primary_key(&item), item))
            .collect())
    }
}

/// Distinct keys in first-seen order.
fn unique<K, I>(keys: I) -> Vec<K>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}
