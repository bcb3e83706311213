// Query parameters shared by every statistics endpoint.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Resolved filter window and dimensions sent with each stats request.
///
/// Serialized as `start_date` / `end_date` (ISO dates) followed by one
/// repeated `client`, `device` and `user` parameter per selected id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatsParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub clients: Vec<String>,
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
}

impl StatsParams {
    /// Flatten into `(name, value)` pairs for `RequestBuilder::query`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(
            2 + self.clients.len() + self.devices.len() + self.users.len(),
        );
        pairs.push(("start_date", self.start_date.format("%Y-%m-%d").to_string()));
        pairs.push(("end_date", self.end_date.format("%Y-%m-%d").to_string()));
        pairs.extend(self.clients.iter().map(|c| ("client", c.clone())));
        pairs.extend(self.devices.iter().map(|d| ("device", d.clone())));
        pairs.extend(self.users.iter().map(|u| ("user", u.clone())));
        pairs
    }
}

/// Ranked breakdowns served by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Leaderboard {
    /// Most played titles.
    Content,
    /// Most active users.
    Users,
    /// Most used client applications.
    Clients,
    /// Most used playback devices.
    Devices,
}

impl Leaderboard {
    pub const ALL: [Leaderboard; 4] = [Self::Content, Self::Users, Self::Clients, Self::Devices];

    /// Endpoint path below the server root.
    pub fn path(self) -> &'static str {
        match self {
            Self::Content => "api/top-content",
            Self::Users => "api/top-users",
            Self::Clients => "api/clients",
            Self::Devices => "api/devices",
        }
    }

    /// Key of the entry list inside the response object.
    pub fn response_key(self) -> &'static str {
        match self {
            Self::Content => "top_content",
            Self::Users => "top_users",
            Self::Clients => "clients",
            Self::Devices => "devices",
        }
    }
}
