use serde::{Deserialize, Serialize};

/// Outcome of one alarm evaluation.
///
/// At most one of `just_activated` / `just_deactivated` is set, and only on
/// the tick where `alarm_active` actually flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlarmTransition {
    pub alarm_active: bool,
    pub just_activated: bool,
    pub just_deactivated: bool,
}

impl AlarmTransition {
    pub(crate) fn steady(alarm_active: bool) -> Self {
        Self {
            alarm_active,
            ..Self::default()
        }
    }

    pub(crate) fn activated() -> Self {
        Self {
            alarm_active: true,
            just_activated: true,
            just_deactivated: false,
        }
    }

    pub(crate) fn deactivated() -> Self {
        Self {
            alarm_active: false,
            just_activated: false,
            just_deactivated: true,
        }
    }

    pub fn changed(&self) -> bool {
        self.just_activated || self.just_deactivated
    }
}

/// What an acknowledgement means for the following ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckPolicy {
    /// Acknowledge silences the current alarm only. If the threshold is
    /// still exceeded the next tick raises it again.
    #[default]
    Rearm,
    /// Acknowledge suppresses the alarm until the next event is recorded.
    UntilRecorded,
}

impl std::str::FromStr for AckPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rearm" => Ok(AckPolicy::Rearm),
            "until_recorded" => Ok(AckPolicy::UntilRecorded),
            other => Err(format!("unknown acknowledge policy: {other}")),
        }
    }
}
