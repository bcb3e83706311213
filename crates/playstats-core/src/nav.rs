// ── Tab navigation ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::watch;
use tracing::debug;

/// Dashboard views.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Overview, // 1
    Content, // 2
    Users,   // 3
    Devices, // 4
    History, // 5
}

impl Tab {
    /// All tabs in tab-bar order.
    pub const ALL: [Tab; 5] = [
        Self::Overview,
        Self::Content,
        Self::Users,
        Self::Devices,
        Self::History,
    ];

    /// Numeric key (1-5) for this tab.
    pub fn number(self) -> u8 {
        match self {
            Self::Overview => 1,
            Self::Content => 2,
            Self::Users => 3,
            Self::Devices => 4,
            Self::History => 5,
        }
    }

    /// Tab from a numeric key (1-5). Returns None for out-of-range.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Overview),
            2 => Some(Self::Content),
            3 => Some(Self::Users),
            4 => Some(Self::Devices),
            5 => Some(Self::History),
            _ => None,
        }
    }

    /// Next tab (wraps around).
    pub fn next(self) -> Self {
        let idx = self.index();
        Self::ALL
            .get((idx + 1) % Self::ALL.len())
            .copied()
            .unwrap_or_default()
    }

    /// Previous tab (wraps around).
    pub fn prev(self) -> Self {
        let idx = self.index();
        Self::ALL
            .get((idx + Self::ALL.len() - 1) % Self::ALL.len())
            .copied()
            .unwrap_or_default()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Content => "Content",
            Self::Users => "Users",
            Self::Devices => "Devices",
            Self::History => "History",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|&t| t == self).unwrap_or(0)
    }
}

/// Active tab plus the refresh counter every stats query watches.
///
/// Bumping the counter re-issues every query even when its descriptor is
/// unchanged.
#[derive(Debug)]
pub struct TabNavigation {
    active: Tab,
    refresh: watch::Sender<u64>,
}

impl TabNavigation {
    pub fn new() -> Self {
        let (refresh, _) = watch::channel(0);
        Self {
            active: Tab::default(),
            refresh,
        }
    }

    pub fn active(&self) -> Tab {
        self.active
    }

    pub fn select(&mut self, tab: Tab) {
        debug!(%tab, "tab selected");
        self.active = tab;
    }

    /// Select by 1-based number. Returns false (and changes nothing) when
    /// out of range.
    pub fn select_number(&mut self, n: u8) -> bool {
        match Tab::from_number(n) {
            Some(tab) => {
                self.select(tab);
                true
            }
            None => false,
        }
    }

    pub fn next(&mut self) -> Tab {
        self.select(self.active.next());
        self.active
    }

    pub fn prev(&mut self) -> Tab {
        self.select(self.active.prev());
        self.active
    }

    /// Increment the refresh key, returning the new value.
    pub fn refresh(&self) -> u64 {
        self.refresh.send_modify(|key| *key = key.wrapping_add(1));
        let key = *self.refresh.borrow();
        debug!(key, "refresh requested");
        key
    }

    pub fn refresh_key(&self) -> u64 {
        *self.refresh.borrow()
    }

    pub fn subscribe_refresh(&self) -> watch::Receiver<u64> {
        self.refresh.subscribe()
    }
}

impl Default for TabNavigation {
    fn default() -> Self {
        Self::new()
    }
}
