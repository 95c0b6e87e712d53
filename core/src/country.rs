//! Tenant country sent on every request as `X-Country`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const COUNTRY_HEADER: &str = "X-Country";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Country {
    Mx,
    Co,
    Pe,
    Ar,
}

impl Country {
    /// Used when neither the caller nor the persisted selection names one.
    pub const DEFAULT: Country = Country::Mx;

    pub const ALL: [Country; 4] = [Country::Mx, Country::Co, Country::Pe, Country::Ar];

    pub fn code(self) -> &'static str {
        match self {
            Country::Mx => "mx",
            Country::Co => "co",
            Country::Pe => "pe",
            Country::Ar => "ar",
        }
    }
}

impl Default for Country {
    fn default() -> Self {
        Country::DEFAULT
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown country code: {0}")]
pub struct UnknownCountry(pub String);

impl FromStr for Country {
    type Err = UnknownCountry;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Country::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| UnknownCountry(s.to_string()))
    }
}
