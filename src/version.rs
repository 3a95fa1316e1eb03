use std::fmt;

use serde::Serialize;

/// Version metadata baked in at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub build_time: &'static str,
}

impl BuildInfo {
    pub const fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: match option_env!("SLACK_COLLECTOR_COMMIT") {
                Some(commit) => commit,
                None => "unknown",
            },
            build_time: match option_env!("SLACK_COLLECTOR_BUILD_TIME") {
                Some(time) => time,
                None => "unknown",
            },
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "slack-collector {} (commit: {}, built: {})",
            self.version, self.commit, self.build_time
        )
    }
}
