use serde::{Deserialize, Serialize};

/// Catalog classification of a course.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CourseType {
    #[serde(rename = "COMPULSORY")]
    Compulsory,
    #[serde(rename = "ELECTIVE")]
    Elective,
}

impl CourseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compulsory => "COMPULSORY",
            Self::Elective => "ELECTIVE",
        }
    }

    /// User-facing label, matching the catalog language.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Compulsory => "必修课",
            Self::Elective => "选修课",
        }
    }

    /// Lenient parser for extractor output and storage round-trips.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "COMPULSORY" => Some(Self::Compulsory),
            "ELECTIVE" => Some(Self::Elective),
            _ => None,
        }
    }
}

/// Read-only catalog entry. Owned by the course catalog; the engine never
/// mutates one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub credits: f64,
    #[serde(rename = "type")]
    pub course_type: CourseType,
    pub faculty_name: String,
    pub teacher_name: String,
    #[serde(default)]
    pub description: String,
    pub average_rating: Option<f64>,
    pub review_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::CourseType;

    #[test]
    fn course_type_parses_storage_values() {
        assert_eq!(CourseType::parse("COMPULSORY"), Some(CourseType::Compulsory));
        assert_eq!(CourseType::parse("elective"), Some(CourseType::Elective));
        assert_eq!(CourseType::parse("seminar"), None);
    }

    #[test]
    fn course_type_serializes_to_wire_names() {
        let json = serde_json::to_string(&CourseType::Elective).expect("serialize");
        assert_eq!(json, "\"ELECTIVE\"");
    }
}
