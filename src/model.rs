use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Present" => Some(AttendanceStatus::Present),
            "Absent" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub roll_number: String,
    pub name: String,
    pub branch: String,
    pub avatar_url: String,
    pub status: AttendanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub location_warning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absence_reason: Option<String>,
    pub was_cancelled: bool,
}

impl Student {
    pub fn key(&self) -> String {
        roll_key(&self.roll_number)
    }
}

/// Lookups on roll number are case-insensitive; this is the stored key.
pub fn roll_key(roll_number: &str) -> String {
    roll_number.to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSession {
    pub start_time: DateTime<Utc>,
    pub is_open: bool,
}
