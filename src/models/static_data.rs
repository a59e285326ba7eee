//! The fixed vocabularies events and profiles are validated against.

pub struct Sport;

impl Sport {
    pub const ALL: [&'static str; 15] = [
        "Badminton",
        "Baseball",
        "Basketball",
        "Cricket",
        "FlagFootball",
        "Frisbee",
        "Golf",
        "PickleBall",
        "Running",
        "Soccer",
        "Softball",
        "Swimming",
        "TableTennis",
        "Tennis",
        "Volleyball",
    ];

    pub fn is_valid(sport: &str) -> bool {
        Self::ALL.contains(&sport)
    }
}

pub struct SkillLevel;

impl SkillLevel {
    pub const BEGINNER: &'static str = "Beginner";
    pub const INTERMEDIATE: &'static str = "Intermediate";
    pub const ADVANCED: &'static str = "Advanced";

    pub const ALL: [&'static str; 3] = [Self::BEGINNER, Self::INTERMEDIATE, Self::ADVANCED];

    pub fn is_valid(level: &str) -> bool {
        Self::ALL.contains(&level)
    }
}

pub struct SchoolYear;

impl SchoolYear {
    pub const ALL: [&'static str; 5] = ["Freshman", "Sophomore", "Junior", "Senior", "Graduate"];

    pub fn is_valid(year: &str) -> bool {
        Self::ALL.contains(&year)
    }
}
