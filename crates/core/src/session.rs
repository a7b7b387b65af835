//! Session setup types.
//!
//! A [`SessionConfig`] is filled in once by the setup form and never changes
//! for the lifetime of the session.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::SetupError;

/// Unique identifier for a tutoring session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// School grade (class), Grade 6 to Grade 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Grade(u8);

impl Grade {
    pub const MIN: u8 = 6;
    pub const MAX: u8 = 12;

    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&level).then_some(Self(level))
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    /// Every selectable grade, lowest first.
    pub fn all() -> impl Iterator<Item = Grade> {
        (Self::MIN..=Self::MAX).map(Grade)
    }
}

impl Default for Grade {
    fn default() -> Self {
        Self(10)
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Grade {}", self.0)
    }
}

impl FromStr for Grade {
    type Err = SetupError;

    /// Accepts "Grade 10", "grade10", "Class 10" or just "10".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let digits = lowered
            .strip_prefix("grade")
            .or_else(|| lowered.strip_prefix("class"))
            .unwrap_or(&lowered)
            .trim();
        digits
            .parse::<u8>()
            .ok()
            .and_then(Grade::new)
            .ok_or_else(|| SetupError::UnknownGrade(s.trim().to_string()))
    }
}

impl TryFrom<String> for Grade {
    type Error = SetupError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Grade> for String {
    fn from(grade: Grade) -> Self {
        grade.to_string()
    }
}

/// What the student wants to do with the chapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TutorMode {
    #[default]
    Learn,
    Revise,
    Doubt,
}

impl TutorMode {
    pub const ALL: [TutorMode; 3] = [Self::Learn, Self::Revise, Self::Doubt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learn => "learn",
            Self::Revise => "revise",
            Self::Doubt => "doubt",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Learn => "New Chapter (Learn)",
            Self::Revise => "Revision Mode",
            Self::Doubt => "Doubt Solving",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Learn => "Structured Master Class",
            Self::Revise => "Rapid recall & error checking",
            Self::Doubt => "Specific questions & clarity",
        }
    }
}

impl std::fmt::Display for TutorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TutorMode {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "learn" => Ok(Self::Learn),
            "revise" | "revision" => Ok(Self::Revise),
            "doubt" => Ok(Self::Doubt),
            other => Err(SetupError::UnknownMode(other.to_string())),
        }
    }
}

/// Per-session parameters chosen on the setup screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub grade: Grade,
    pub subject: String,
    pub chapter: String,
    pub mode: TutorMode,
}

impl SessionConfig {
    /// Build a config, rejecting a blank subject or chapter.
    pub fn new(
        grade: Grade,
        subject: impl Into<String>,
        chapter: impl Into<String>,
        mode: TutorMode,
    ) -> Result<Self, SetupError> {
        let subject = subject.into().trim().to_string();
        let chapter = chapter.into().trim().to_string();
        if subject.is_empty() {
            return Err(SetupError::MissingField("subject"));
        }
        if chapter.is_empty() {
            return Err(SetupError::MissingField("chapter"));
        }
        Ok(Self {
            grade,
            subject,
            chapter,
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_parses_common_forms() {
        assert_eq!("Grade 10".parse::<Grade>().unwrap().level(), 10);
        assert_eq!("grade7".parse::<Grade>().unwrap().level(), 7);
        assert_eq!("Class 12".parse::<Grade>().unwrap().level(), 12);
        assert_eq!("6".parse::<Grade>().unwrap().level(), 6);
    }

    #[test]
    fn grade_outside_range_rejected() {
        assert!(matches!(
            "Grade 5".parse::<Grade>(),
            Err(SetupError::UnknownGrade(_))
        ));
        assert!("13".parse::<Grade>().is_err());
        assert!(Grade::new(4).is_none());
    }

    #[test]
    fn grade_list_and_default() {
        let labels: Vec<String> = Grade::all().map(|g| g.to_string()).collect();
        assert_eq!(labels.first().unwrap(), "Grade 6");
        assert_eq!(labels.last().unwrap(), "Grade 12");
        assert_eq!(labels.len(), 7);
        assert_eq!(Grade::default().to_string(), "Grade 10");
    }

    #[test]
    fn grade_serializes_as_label() {
        let json = serde_json::to_string(&Grade::default()).unwrap();
        assert_eq!(json, r#""Grade 10""#);
        let parsed: Grade = serde_json::from_str(r#""Grade 8""#).unwrap();
        assert_eq!(parsed.level(), 8);
    }

    #[test]
    fn tutor_mode_parses() {
        assert_eq!("Learn".parse::<TutorMode>().unwrap(), TutorMode::Learn);
        assert_eq!("revision".parse::<TutorMode>().unwrap(), TutorMode::Revise);
        assert!("cram".parse::<TutorMode>().is_err());
        assert_eq!(TutorMode::Doubt.label(), "Doubt Solving");
    }

    #[test]
    fn session_config_requires_subject_and_chapter() {
        let err = SessionConfig::new(Grade::default(), "  ", "Light", TutorMode::Learn);
        assert_eq!(err, Err(SetupError::MissingField("subject")));

        let err = SessionConfig::new(Grade::default(), "Science", "", TutorMode::Learn);
        assert_eq!(err, Err(SetupError::MissingField("chapter")));

        let ok = SessionConfig::new(
            Grade::default(),
            " Science ",
            "Carbon and its Compounds",
            TutorMode::Learn,
        )
        .unwrap();
        assert_eq!(ok.subject, "Science");
    }
}
