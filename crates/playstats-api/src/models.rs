// Response payloads of the statistics backend.
//
// The backend is loose about optional fields, so every field that can be
// missing carries `#[serde(default)]`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Totals for the selected window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewStats {
    #[serde(default)]
    pub total_plays: u64,
    #[serde(default)]
    pub total_duration_hours: f64,
    #[serde(default)]
    pub unique_users: u64,
    #[serde(default)]
    pub unique_items: u64,
}

/// One day of the play trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    #[serde(default)]
    pub plays: u64,
    #[serde(default)]
    pub duration_hours: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrendResponse {
    #[serde(default)]
    pub trend: Vec<TrendPoint>,
}

/// A recently played item.
///
/// `time` is the backend-local timestamp string (`YYYY-MM-DD HH:MM:SS`),
/// kept as-is because it carries no offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentItem {
    pub item_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub show_name: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub backdrop_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

impl RecentItem {
    /// Title to display: series name, then item name, then the raw item name.
    pub fn display_title(&self) -> &str {
        self.show_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.name.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(&self.item_name)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecentResponse {
    #[serde(default)]
    pub recent: Vec<RecentItem>,
}

/// One row of a ranked breakdown (content, users, clients, devices).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    #[serde(default)]
    pub play_count: u64,
    #[serde(default)]
    pub duration_hours: f64,
}

/// A user the filter panel can offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOption {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Values the backend has seen, used to populate filter and naming panels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(default)]
    pub clients: Vec<String>,
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default)]
    pub users: Vec<UserOption>,
}

/// Login state as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub username: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recent_item_title_prefers_show_name() {
        let item: RecentItem = serde_json::from_value(json!({
            "item_name": "S01E02",
            "name": "Episode Two",
            "show_name": "Some Show"
        }))
        .unwrap();
        assert_eq!(item.display_title(), "Some Show");
    }

    #[test]
    fn recent_item_title_skips_empty_names() {
        let item: RecentItem = serde_json::from_value(json!({
            "item_name": "Movie.2019",
            "name": "",
            "show_name": null
        }))
        .unwrap();
        assert_eq!(item.display_title(), "Movie.2019");
    }

    #[test]
    fn overview_tolerates_missing_fields() {
        let stats: OverviewStats = serde_json::from_value(json!({ "total_plays": 12 })).unwrap();
        assert_eq!(stats.total_plays, 12);
        assert_eq!(stats.unique_users, 0);
    }
}
