//! Playlist data models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The space a playlist currently lives in.
///
/// EMS holds raw imports, GMS holds scored candidates awaiting approval, PMS
/// is the user's approved collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpaceType {
    #[serde(rename = "EMS")]
    Ems,
    #[serde(rename = "GMS")]
    Gms,
    #[serde(rename = "PMS")]
    Pms,
}

impl SpaceType {
    pub const ALL: [SpaceType; 3] = [SpaceType::Ems, SpaceType::Gms, SpaceType::Pms];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceType::Ems => "EMS",
            SpaceType::Gms => "GMS",
            SpaceType::Pms => "PMS",
        }
    }
}

impl FromStr for SpaceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EMS" => Ok(SpaceType::Ems),
            "GMS" => Ok(SpaceType::Gms),
            "PMS" => Ok(SpaceType::Pms),
            other => Err(format!("Unknown space type: {}", other)),
        }
    }
}

impl fmt::Display for SpaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress flag orthogonal to the space: pending, promoted/reviewed, final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusFlag {
    #[serde(rename = "PTP")]
    Ptp,
    #[serde(rename = "PRP")]
    Prp,
    #[serde(rename = "PFP")]
    Pfp,
}

impl StatusFlag {
    pub const ALL: [StatusFlag; 3] = [StatusFlag::Ptp, StatusFlag::Prp, StatusFlag::Pfp];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFlag::Ptp => "PTP",
            StatusFlag::Prp => "PRP",
            StatusFlag::Pfp => "PFP",
        }
    }
}

impl FromStr for StatusFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PTP" => Ok(StatusFlag::Ptp),
            "PRP" => Ok(StatusFlag::Prp),
            "PFP" => Ok(StatusFlag::Pfp),
            other => Err(format!("Unknown status flag: {}", other)),
        }
    }
}

impl fmt::Display for StatusFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provenance of a playlist. Informational, not part of the lifecycle rules,
/// except that listening profiles are derived from `Platform` tracks only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    Platform,
    Upload,
    System,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Platform => "Platform",
            SourceType::Upload => "Upload",
            SourceType::System => "System",
        }
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Platform" => Ok(SourceType::Platform),
            "Upload" => Ok(SourceType::Upload),
            "System" => Ok(SourceType::System),
            other => Err(format!("Unknown source type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Playlist {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub space: SpaceType,
    pub status: StatusFlag,
    pub source: SourceType,
    /// Unix timestamp of the import.
    pub created: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Track {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub genre: Option<String>,
}

/// Score attached to a (playlist, evaluating user) pair. The same playlist
/// may score differently against different users' profiles.
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistScore {
    pub playlist_id: i64,
    pub user_id: i64,
    pub score: f64,
    pub reason: String,
    pub updated: i64,
}

/// Payload for importing a playlist. Imports always land in (EMS, PTP).
#[derive(Debug, Clone, Deserialize)]
pub struct NewPlaylist {
    pub owner_id: i64,
    pub name: String,
    pub source: SourceType,
    /// Track order is significant and preserved.
    pub tracks: Vec<NewTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTrack {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub genre: Option<String>,
}

/// Filter for playlist listing. All fields optional, combined with AND.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PlaylistFilter {
    pub space: Option<SpaceType>,
    pub status: Option<StatusFlag>,
    pub owner_id: Option<i64>,
}
