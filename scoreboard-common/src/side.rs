use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[derivative(Default)]
    Home,
    Guest,
}

impl Side {
    pub fn is_home(self) -> bool {
        matches!(self, Self::Home)
    }

    pub fn from_home(home: bool) -> Self {
        if home { Self::Home } else { Self::Guest }
    }
}

impl core::fmt::Display for Side {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Self::Home => write!(f, "Home"),
            Self::Guest => write!(f, "Guest"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
#[error("`{0}` is not a side, expected `home` or `guest`")]
pub struct ParseSideError(pub String);

impl FromStr for Side {
    type Err = ParseSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "home" | "h" => Ok(Self::Home),
            "guest" | "g" => Ok(Self::Guest),
            _ => Err(ParseSideError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_side_from_str() {
        assert_eq!("home".parse(), Ok(Side::Home));
        assert_eq!("Guest".parse(), Ok(Side::Guest));
        assert_eq!("g".parse(), Ok(Side::Guest));
        assert_eq!(
            "away".parse::<Side>(),
            Err(ParseSideError("away".to_string()))
        );
    }

    #[test]
    fn test_side_serde() {
        assert_eq!(serde_json::to_string(&Side::Home).unwrap(), "\"home\"");
        assert_eq!(
            serde_json::from_str::<Side>("\"guest\"").unwrap(),
            Side::Guest
        );
        assert_eq!(Side::from_home(false), Side::Guest);
    }
}
