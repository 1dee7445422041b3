use std::cmp::Reverse;

use crate::models::Item;

/// Ranking key: feed score plus double-weighted comment count.
pub fn ranking_key(item: &Item) -> u64 {
    u64::from(item.engagement.score) + 2 * u64::from(item.engagement.comments)
}

/// Return the `n` highest-ranked items, descending by [`ranking_key`].
///
/// Pure function of the engagement fields. The sort is stable, so ties
/// keep their relative input order.
pub fn select_top_n(items: &[Item], n: usize) -> Vec<Item> {
    let mut ranked: Vec<Item> = items.to_vec();
    ranked.sort_by_key(|item| Reverse(ranking_key(item)));
    ranked.truncate(n);
    ranked
}
