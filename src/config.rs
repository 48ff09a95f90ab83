use chrono::Duration;
use serde::Deserialize;
use serde::Serialize;

/// What to do when a transfer asks for more units or serials than the source pool holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OverdrawPolicy {
    /// Fail with [`InvariantViolation`](crate::error::InvariantViolation) and change nothing.
    #[default]
    Reject,
    /// Legacy behavior: floor stock at zero and silently skip serials that aren't there.
    Clamp,
}

/// What a whole-item maintenance transfer does with assignments that still reference the item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WholeTransferPolicy {
    /// Delete the item together with its assignments.
    #[default]
    Cascade,
    /// Refuse the transfer while any customer holds units of the item.
    RejectAssigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryConfig {
    pub overdraw:            OverdrawPolicy,
    pub whole_transfer:      WholeTransferPolicy,
    /// Items with stock below this value are counted as low stock in reports.
    pub low_stock_threshold: u32,
    /// How far back an assignment still counts as recent, in days.
    pub recent_window_days:  i64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            overdraw:            OverdrawPolicy::Reject,
            whole_transfer:      WholeTransferPolicy::Cascade,
            low_stock_threshold: 10,
            recent_window_days:  7,
        }
    }
}

impl InventoryConfig {
    pub fn with_overdraw(mut self, overdraw: OverdrawPolicy) -> Self {
        self.overdraw = overdraw;
        self
    }

    pub fn with_whole_transfer(mut self, policy: WholeTransferPolicy) -> Self {
        self.whole_transfer = policy;
        self
    }

    pub fn with_low_stock_threshold(mut self, threshold: u32) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn with_recent_window_days(mut self, days: i64) -> Self {
        self.recent_window_days = days;
        self
    }

    pub fn is_lenient(&self) -> bool {
        self.overdraw == OverdrawPolicy::Clamp
    }

    pub fn recent_window(&self) -> Duration {
        Duration::days(self.recent_window_days)
    }
}
