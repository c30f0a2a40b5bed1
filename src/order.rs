//! セッション提示順
//!
//! 確定済みの天体を除いた残りを一様ランダムに並べ替える。順序は保存しない
//! （再開時は結果ストアとの差分から作り直す）。

use crate::catalog::Item;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// 未確定の天体を乱数順に並べる
pub fn build_order<R: Rng + ?Sized>(
    all_items: &[Item],
    completed_ids: &HashSet<String>,
    rng: &mut R,
) -> Vec<Item> {
    let mut remaining: Vec<Item> = all_items
        .iter()
        .filter(|item| !completed_ids.contains(&item.id))
        .cloned()
        .collect();
    remaining.shuffle(rng);
    remaining
}

/// セッション中の提示順とカーソル
#[derive(Debug, Clone)]
pub struct SessionOrder {
    items: Vec<Item>,
    cursor: usize,
}

impl SessionOrder {
    /// seed 指定時のみ再現可能な順序になる
    pub fn new(all_items: &[Item], completed_ids: &HashSet<String>, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::from_items(build_order(all_items, completed_ids, &mut rng))
    }

    pub fn from_items(items: Vec<Item>) -> Self {
        Self { items, cursor: 0 }
    }

    pub fn current(&self) -> Option<&Item> {
        self.items.get(self.cursor)
    }

    pub fn advance(&mut self) {
        if self.cursor < self.items.len() {
            self.cursor += 1;
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.items.len() - self.cursor
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(ids: &[&str]) -> Vec<Item> {
        ids.iter()
            .map(|id| Item {
                id: id.to_string(),
                views: Vec::new(),
            })
            .collect()
    }

    fn ids(items: &[Item]) -> Vec<String> {
        let mut ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_order_is_permutation() {
        let all = items(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let order = build_order(&all, &HashSet::new(), &mut StdRng::from_os_rng());

        assert_eq!(order.len(), all.len());
        assert_eq!(ids(&order), ids(&all));
    }

    #[test]
    fn test_completed_items_excluded() {
        let all = items(&["A", "B", "C"]);
        let completed = HashSet::from(["B".to_string()]);

        for seed in 0..20 {
            let order = build_order(&all, &completed, &mut StdRng::seed_from_u64(seed));
            assert_eq!(ids(&order), vec!["A".to_string(), "C".to_string()]);
        }
    }

    #[test]
    fn test_all_completed_is_empty() {
        let all = items(&["x", "y"]);
        let completed = HashSet::from(["x".to_string(), "y".to_string()]);
        let order = SessionOrder::new(&all, &completed, None);

        assert!(order.is_empty());
        assert!(order.is_exhausted());
        assert!(order.current().is_none());
    }

    #[test]
    fn test_seed_is_reproducible() {
        let all = items(&["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]);
        let first = SessionOrder::new(&all, &HashSet::new(), Some(7));
        let second = SessionOrder::new(&all, &HashSet::new(), Some(7));
        assert_eq!(first.items(), second.items());
    }

    #[test]
    fn test_order_not_tied_to_catalog_order() {
        let all = items(&["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]);
        // 10! 通りのうち元の順序が20回続けて出ることはない
        let shuffled = (0..20u64).any(|seed| {
            build_order(&all, &HashSet::new(), &mut StdRng::seed_from_u64(seed)) != all
        });
        assert!(shuffled);
    }

    #[test]
    fn test_cursor_advances_to_exhaustion() {
        let mut order = SessionOrder::from_items(items(&["p", "q"]));
        assert_eq!(order.remaining(), 2);
        assert_eq!(order.current().map(|i| i.id.as_str()), Some("p"));

        order.advance();
        assert_eq!(order.current().map(|i| i.id.as_str()), Some("q"));
        order.advance();
        order.advance();
        assert!(order.is_exhausted());
        assert_eq!(order.remaining(), 0);
    }
}
