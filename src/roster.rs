use crate::model::{AttendanceStatus, Student};

pub const BRANCH_BTECH_CSE: &str = "B.Tech CSE";
pub const BRANCH_CSE_DS: &str = "CSE(DS)";

const AVATAR_PLACEHOLDER: &str = "https://placehold.co/100x100.png";

// (id, roll number, name, branch)
const SEED: &[(&str, &str, &str, &str)] = &[
    ("1", "23M05A0501", "Alice Johnson", BRANCH_BTECH_CSE),
    ("2", "23M05A0502", "Bob Williams", BRANCH_BTECH_CSE),
    ("3", "23M05A0503", "Charlie Brown", BRANCH_BTECH_CSE),
    ("4", "23M05A0504", "Diana Miller", BRANCH_BTECH_CSE),
    ("5", "23M05A0505", "Ethan Garcia", BRANCH_BTECH_CSE),
    ("6", "23M67A0601", "Fiona Davis", BRANCH_CSE_DS),
    ("7", "23M67A0602", "George Rodriguez", BRANCH_CSE_DS),
    ("8", "23M67A0603", "Hannah Martinez", BRANCH_CSE_DS),
    ("9", "23M67A0604", "Ivan Hernandez", BRANCH_CSE_DS),
    ("10", "23M67A0605", "Jane Doe", BRANCH_CSE_DS),
];

/// The canonical roster. Every seed student starts out Absent.
pub fn seed_roster() -> Vec<Student> {
    SEED.iter()
        .map(|(id, roll, name, branch)| Student {
            id: id.to_string(),
            roll_number: roll.to_string(),
            name: name.to_string(),
            branch: branch.to_string(),
            avatar_url: AVATAR_PLACEHOLDER.to_string(),
            status: AttendanceStatus::Absent,
            attendance_time: None,
            location: None,
            location_warning: false,
            absence_reason: None,
            was_cancelled: false,
        })
        .collect()
}

/// Roll numbers encode the branch: `M05` for B.Tech CSE, `M67` for CSE(DS).
/// Branches without a known marker accept any roll number.
pub fn roll_belongs_to_branch(roll_number: &str, branch: &str) -> bool {
    let marker = match branch {
        BRANCH_BTECH_CSE => "M05",
        BRANCH_CSE_DS => "M67",
        _ => return true,
    };
    roll_number.to_ascii_uppercase().contains(marker)
}
