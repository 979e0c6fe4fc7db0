use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Timeline ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    /// Newest first.
    #[default]
    Latest,
    /// Oldest first.
    Oldest,
    Random,
}

impl Sort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sort::Latest => "latest",
            Sort::Oldest => "oldest",
            Sort::Random => "random",
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "latest" => Ok(Sort::Latest),
            "oldest" => Ok(Sort::Oldest),
            "random" => Ok(Sort::Random),
            other => Err(format!("Unknown sort: {}. Use latest, oldest or random", other)),
        }
    }
}
