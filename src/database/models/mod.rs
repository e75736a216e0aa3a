pub mod dataset;
pub mod incident;
pub mod ticket;
pub mod user;

pub use dataset::{Dataset, DatasetTotals, NewDataset};
pub use incident::{Incident, IncidentCount, NewIncident};
pub use ticket::{NewTicket, StaffBacklog, StatusBacklog, Ticket, TicketStats};
pub use user::CredentialRecord;

use serde::{Deserialize, Serialize};

/// Implements `as_str`, `Display` and `FromStr` for a text-backed enum so
/// the same spelling is used in SQL, JSON, CSV and query strings. Extra
/// spellings after `|` are accepted on parse only.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($text) $(|| s.eq_ignore_ascii_case($alias))* {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!("invalid {} '{}'", stringify!($name).to_lowercase(), s))
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

text_enum!(Severity {
    Low => "Low",
    Medium => "Medium",
    High => "High",
    Critical => "Critical",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

text_enum!(Priority {
    Low => "Low",
    Medium => "Medium",
    High => "High",
    Critical => "Critical",
});

/// Workflow state shared by incidents and tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Status {
    Open,
    #[serde(rename = "In Progress", alias = "Investigating")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    Resolved,
    Closed,
}

text_enum!(Status {
    Open => "Open",
    InProgress => "In Progress" | "Investigating",
    Resolved => "Resolved",
    Closed => "Closed",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("critical".parse::<Severity>(), Ok(Severity::Critical));
        assert_eq!("in progress".parse::<Status>(), Ok(Status::InProgress));
        assert_eq!(" High ".parse::<Priority>(), Ok(Priority::High));
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn parse_accepts_the_same_aliases_as_serde() {
        assert_eq!("Investigating".parse::<Status>(), Ok(Status::InProgress));
        assert_eq!("investigating".parse::<Status>(), Ok(Status::InProgress));
        assert_eq!(Status::InProgress.to_string(), "In Progress");
    }

    #[test]
    fn json_uses_display_spelling() {
        assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"In Progress\"");
        assert_eq!(
            serde_json::from_str::<Status>("\"Investigating\"").unwrap(),
            Status::InProgress
        );
        assert_eq!(Severity::ALL.len(), 4);
    }
}
