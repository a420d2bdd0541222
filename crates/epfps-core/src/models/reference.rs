use serde::{Deserialize, Serialize};

/// A reference record identified by a code unique within its list.
pub trait NaturalKey {
    /// Human-readable name of the record type, used in diagnostics.
    const KIND: &'static str;

    fn code(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationLevel {
    pub level_code: String,
    pub name: String,
    /// Position in the school cycle, when the API provides one
    #[serde(default)]
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ethnicity {
    pub ethnicity_code: String,
    pub name: String,
    #[serde(default)]
    pub region_code: Option<String>,
}

/// Kind of link between a student and a guardian (mother, uncle, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub relationship_code: String,
    pub name: String,
}

impl NaturalKey for EducationLevel {
    const KIND: &'static str = "education level";
    fn code(&self) -> &str {
        &self.level_code
    }
}

impl NaturalKey for Ethnicity {
    const KIND: &'static str = "ethnicity";
    fn code(&self) -> &str {
        &self.ethnicity_code
    }
}

impl NaturalKey for Relationship {
    const KIND: &'static str = "relationship";
    fn code(&self) -> &str {
        &self.relationship_code
    }
}
