use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of session within a race weekend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    #[serde(rename = "R")]
    Race,
    #[serde(rename = "Q")]
    Qualifying,
    #[serde(rename = "S")]
    SprintRace,
    #[serde(rename = "SQ")]
    SprintQualifying,
}

impl SessionType {
    pub const ALL: [SessionType; 4] = [
        SessionType::Race,
        SessionType::Qualifying,
        SessionType::SprintRace,
        SessionType::SprintQualifying,
    ];

    /// Short code used in backend URLs
    pub fn code(&self) -> &'static str {
        match self {
            SessionType::Race => "R",
            SessionType::Qualifying => "Q",
            SessionType::SprintRace => "S",
            SessionType::SprintQualifying => "SQ",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SessionType::Race => "Race",
            SessionType::Qualifying => "Qualifying",
            SessionType::SprintRace => "Sprint",
            SessionType::SprintQualifying => "Sprint Qualifying",
        }
    }
}

impl FromStr for SessionType {
    type Err = SessionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "R" => Ok(SessionType::Race),
            "Q" => Ok(SessionType::Qualifying),
            "S" => Ok(SessionType::SprintRace),
            "SQ" => Ok(SessionType::SprintQualifying),
            _ => Err(SessionParseError::UnknownType(s.to_string())),
        }
    }
}

/// Identity of one session: the lookup key into the telemetry source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId {
    pub year: u16,
    pub round: u8,
    pub session_type: SessionType,
}

impl SessionId {
    pub fn new(year: u16, round: u8, session_type: SessionType) -> Self {
        Self {
            year,
            round,
            session_type,
        }
    }

    /// Heading shown above the replay, e.g. "2024 - Round 5 - Race"
    pub fn title(&self) -> String {
        format!(
            "{} - Round {} - {}",
            self.year,
            self.round,
            self.session_type.display_name()
        )
    }
}

/// Formats as the `year/round/type` path used by the backend
impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.year, self.round, self.session_type.code())
    }
}

impl FromStr for SessionId {
    type Err = SessionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().trim_matches('/').split('/').collect();
        let [year, round, kind] = parts.as_slice() else {
            return Err(SessionParseError::Format(s.to_string()));
        };

        let year = year
            .parse::<u16>()
            .map_err(|_| SessionParseError::Format(s.to_string()))?;
        let round = round
            .parse::<u8>()
            .ok()
            .filter(|r| *r > 0)
            .ok_or_else(|| SessionParseError::Format(s.to_string()))?;

        Ok(SessionId::new(year, round, kind.parse()?))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionParseError {
    #[error("expected YEAR/ROUND/TYPE, got {0:?}")]
    Format(String),
    #[error("unknown session type {0:?} (expected R, Q, S or SQ)")]
    UnknownType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_path() {
        let id: SessionId = "2024/5/R".parse().unwrap();
        assert_eq!(id, SessionId::new(2024, 5, SessionType::Race));

        let id: SessionId = "/2023/12/sq/".parse().unwrap();
        assert_eq!(id.session_type, SessionType::SprintQualifying);
        assert_eq!(id.to_string(), "2023/12/SQ");
    }

    #[test]
    fn test_parse_session_rejects_garbage() {
        assert!(matches!(
            "2024/5".parse::<SessionId>(),
            Err(SessionParseError::Format(_))
        ));
        assert!(matches!(
            "2024/0/R".parse::<SessionId>(),
            Err(SessionParseError::Format(_))
        ));
        assert_eq!(
            "2024/5/FP1".parse::<SessionId>(),
            Err(SessionParseError::UnknownType("FP1".to_string()))
        );
    }

    #[test]
    fn test_title() {
        let id = SessionId::new(2024, 21, SessionType::SprintRace);
        assert_eq!(id.title(), "2024 - Round 21 - Sprint");
    }
}
