//! Summary statistics over a collection
//!
//! Each function is a single grouping pass over already-filtered live
//! documents. Output ordering is deterministic: groups sort by their
//! measure descending, ties by key ascending.

use std::collections::BTreeMap;

use tracing::warn;

use crate::country::alpha2_to_alpha3;
use crate::model::{
    ActiveUser, ActiveUserStats, CountryCount, CountryVisits, OverallStatistics, PageTotal, User,
    UserStatistics, Visitor, VisitorStats,
};

/// Number of pages reported by [`overall_statistics`].
pub const TOP_PAGES: usize = 5;

/// Arithmetic mean, `0.0` when there is nothing to average.
pub fn average(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub fn active_user_stats(sessions: &[ActiveUser]) -> ActiveUserStats {
    ActiveUserStats {
        total_active: sessions.len(),
        average_session_duration: average(sessions.iter().map(|s| s.session_duration)),
    }
}

pub fn visitor_stats(visitors: &[Visitor]) -> VisitorStats {
    let mut by_country: BTreeMap<Option<&str>, (usize, u64)> = BTreeMap::new();
    for visitor in visitors {
        let entry = by_country.entry(visitor.country()).or_default();
        entry.0 += 1;
        entry.1 += visitor.visit_count;
    }

    let mut visitors_by_country: Vec<CountryVisits> = by_country
        .into_iter()
        .map(|(country, (count, total_visits))| CountryVisits {
            country: country.map(str::to_string),
            count,
            total_visits,
        })
        .collect();
    // stable sort keeps the BTreeMap key order among equal counts
    visitors_by_country.sort_by(|a, b| b.count.cmp(&a.count));

    VisitorStats {
        total_unique_visitors: visitors.len(),
        total_visits: visitors.iter().map(|v| v.visit_count).sum(),
        visitors_by_country,
    }
}

pub fn overall_statistics(statistics: &[UserStatistics]) -> OverallStatistics {
    let mut by_page: BTreeMap<&str, u64> = BTreeMap::new();
    for page in statistics.iter().flat_map(|s| &s.pages_visited) {
        *by_page.entry(page.page_name.as_str()).or_default() += page.visit_count;
    }

    let mut most_visited_pages: Vec<PageTotal> = by_page
        .into_iter()
        .map(|(page_name, total_visits)| PageTotal {
            page_name: page_name.to_string(),
            total_visits,
        })
        .collect();
    most_visited_pages.sort_by(|a, b| b.total_visits.cmp(&a.total_visits));
    most_visited_pages.truncate(TOP_PAGES);

    OverallStatistics {
        total_users: statistics.len(),
        most_visited_pages,
        average_time_spent: average(statistics.iter().map(|s| s.total_time_spent)),
    }
}

/// Users per country, keyed by ISO alpha-3 code.
///
/// Users without a country are ignored; users whose country is not a valid
/// alpha-2 code are skipped with a warning.
pub fn country_histogram(users: &[User]) -> Vec<CountryCount> {
    let mut by_country: BTreeMap<&'static str, usize> = BTreeMap::new();
    for user in users {
        let Some(country) = user.country.as_deref() else {
            continue;
        };
        match alpha2_to_alpha3(country) {
            Some(alpha3) => *by_country.entry(alpha3).or_default() += 1,
            None => warn!(user = %user.id, country, "Error converting country code"),
        }
    }

    let mut histogram: Vec<CountryCount> = by_country
        .into_iter()
        .map(|(id, value)| CountryCount {
            id: id.to_string(),
            value,
        })
        .collect();
    histogram.sort_by(|a, b| b.value.cmp(&a.value));
    histogram
}
