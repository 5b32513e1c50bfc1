//! Per-user activity statistics over ratings and favorites.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{FavoriteEntry, RatingEntry};

pub const DEFAULT_RECENT_RATINGS: usize = 5;

/// Inclusive calendar-day bounds, either side optional.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }

    pub fn is_inverted(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if from > to)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_ratings: usize,
    pub average_rating: f64,
    pub total_favorites: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RatingHistoryPoint {
    pub date: NaiveDate,
    pub average_rating: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ActivityPoint {
    pub date: NaiveDate,
    pub count: usize,
}

pub fn summarize(ratings: &[RatingEntry], favorites: &[FavoriteEntry], range: DateRange) -> Summary {
    let in_range: Vec<&RatingEntry> = ratings
        .iter()
        .filter(|rating| range.contains(rating.rated_at))
        .collect();
    Summary {
        total_ratings: in_range.len(),
        average_rating: mean(in_range.iter().map(|rating| rating.value)),
        total_favorites: favorites
            .iter()
            .filter(|favorite| range.contains(favorite.favorited_at))
            .count(),
    }
}

/// Average rating per UTC day, oldest day first.
pub fn rating_history(ratings: &[RatingEntry], range: DateRange) -> Vec<RatingHistoryPoint> {
    let mut days: BTreeMap<NaiveDate, Vec<i32>> = BTreeMap::new();
    for rating in ratings.iter().filter(|rating| range.contains(rating.rated_at)) {
        days.entry(rating.rated_at.date_naive())
            .or_default()
            .push(rating.value);
    }
    days.into_iter()
        .map(|(date, values)| RatingHistoryPoint {
            date,
            average_rating: mean(values.into_iter()),
        })
        .collect()
}

/// Favorites added per UTC day, oldest day first.
pub fn favorites_history(favorites: &[FavoriteEntry], range: DateRange) -> Vec<ActivityPoint> {
    count_by(
        favorites
            .iter()
            .map(|favorite| favorite.favorited_at)
            .filter(|at| range.contains(*at)),
        |at| Some(at.date_naive()),
    )
}

/// Ratings and favorites counted together per month. Each point is dated on
/// the first day of its month.
pub fn activity_by_month(
    ratings: &[RatingEntry],
    favorites: &[FavoriteEntry],
    range: DateRange,
) -> Vec<ActivityPoint> {
    let events = ratings
        .iter()
        .map(|rating| rating.rated_at)
        .chain(favorites.iter().map(|favorite| favorite.favorited_at))
        .filter(|at| range.contains(*at));
    count_by(events, |at| at.date_naive().with_day(1))
}

/// Mean of the ratings in range, `0.0` when there are none.
pub fn average_rating(ratings: &[RatingEntry], range: DateRange) -> f64 {
    mean(
        ratings
            .iter()
            .filter(|rating| range.contains(rating.rated_at))
            .map(|rating| rating.value),
    )
}

pub fn recent_ratings(ratings: &[RatingEntry], limit: usize) -> Vec<RatingEntry> {
    let mut recent = ratings.to_vec();
    recent.sort_by(|a, b| {
        b.rated_at
            .cmp(&a.rated_at)
            .then(a.movie_id.cmp(&b.movie_id))
    });
    recent.truncate(limit);
    recent
}

fn count_by(
    events: impl Iterator<Item = DateTime<Utc>>,
    bucket: impl Fn(DateTime<Utc>) -> Option<NaiveDate>,
) -> Vec<ActivityPoint> {
    let mut buckets: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for date in events.filter_map(bucket) {
        *buckets.entry(date).or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|(date, count)| ActivityPoint { date, count })
        .collect()
}

fn mean(values: impl Iterator<Item = i32>) -> f64 {
    let (sum, count) = values.fold((0i64, 0u32), |(sum, count), value| {
        (sum + i64::from(value), count + 1)
    });
    if count == 0 {
        0.0
    } else {
        sum as f64 / f64::from(count)
    }
}
