//! Groups posts by creation year and month for the archives page.

use crate::post::Post;
use chrono::Datelike;
use std::collections::BTreeMap;

/// Posts grouped by year, then month (both in UTC). Entries are indices into
/// the post list the archive was built from.
#[derive(Debug, Default)]
pub struct Archive {
    years: BTreeMap<i32, BTreeMap<u32, Vec<usize>>>,
}

/// One month of an [`Archive`] year.
pub struct Month<'a> {
    /// 1 through 12.
    pub month: u32,
    pub posts: &'a [usize],
}

/// One year of an [`Archive`].
pub struct Year<'a> {
    pub year: i32,
    /// Months in descending order.
    pub months: Vec<Month<'a>>,
}

impl Year<'_> {
    pub fn post_count(&self) -> usize {
        self.months.iter().map(|m| m.posts.len()).sum()
    }
}

impl Archive {
    pub fn from_posts(posts: &[Post]) -> Archive {
        let mut years: BTreeMap<i32, BTreeMap<u32, Vec<usize>>> = BTreeMap::new();
        for (i, post) in posts.iter().enumerate() {
            years
                .entry(post.created_at.year())
                .or_default()
                .entry(post.created_at.month())
                .or_default()
                .push(i);
        }

        // Pinning doesn't apply here: newest first within each month.
        for months in years.values_mut() {
            for members in months.values_mut() {
                members.sort_by(|a, b| posts[*b].created_at.cmp(&posts[*a].created_at));
            }
        }
        Archive { years }
    }

    /// Years in descending order.
    pub fn years(&self) -> Vec<Year<'_>> {
        self.years
            .iter()
            .rev()
            .map(|(year, months)| Year {
                year: *year,
                months: months
                    .iter()
                    .rev()
                    .map(|(month, posts)| Month {
                        month: *month,
                        posts,
                    })
                    .collect(),
            })
            .collect()
    }
}
