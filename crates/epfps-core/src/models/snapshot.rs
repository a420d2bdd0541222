use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    Arrondissement, City, Country, Department, EducationLevel, Ethnicity, NaturalKey, Region,
    Relationship, State, Street,
};
use crate::utils::cmp_ignore_case;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Duplicate {kind} code: {code}")]
    DuplicateCode { kind: &'static str, code: String },
}

/// Every reference list the client needs, replaced as one unit.
///
/// Lists missing from a payload decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationSnapshot {
    pub countries: Vec<Country>,
    pub states: Vec<State>,
    pub cities: Vec<City>,
    pub streets: Vec<Street>,
    pub regions: Vec<Region>,
    pub departments: Vec<Department>,
    pub arrondissements: Vec<Arrondissement>,
    #[serde(alias = "educationLevels")]
    pub education_levels: Vec<EducationLevel>,
    pub ethnicities: Vec<Ethnicity>,
    pub relationships: Vec<Relationship>,
}

fn check_unique<T: NaturalKey>(items: &[T]) -> Result<(), SnapshotError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.code()) {
            return Err(SnapshotError::DuplicateCode {
                kind: T::KIND,
                code: item.code().to_string(),
            });
        }
    }
    Ok(())
}

fn sorted_by_name<'a, T>(items: impl Iterator<Item = &'a T>, name: impl Fn(&T) -> &str) -> Vec<&'a T>
where
    T: 'a,
{
    let mut items: Vec<&T> = items.collect();
    items.sort_by(|a, b| cmp_ignore_case(name(a), name(b)));
    items
}

impl ConfigurationSnapshot {
    /// Check that natural keys are unique within each list.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        check_unique(&self.countries)?;
        check_unique(&self.states)?;
        check_unique(&self.cities)?;
        check_unique(&self.streets)?;
        check_unique(&self.regions)?;
        check_unique(&self.departments)?;
        check_unique(&self.arrondissements)?;
        check_unique(&self.education_levels)?;
        check_unique(&self.ethnicities)?;
        check_unique(&self.relationships)?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
            && self.states.is_empty()
            && self.cities.is_empty()
            && self.streets.is_empty()
            && self.regions.is_empty()
            && self.departments.is_empty()
            && self.arrondissements.is_empty()
            && self.education_levels.is_empty()
            && self.ethnicities.is_empty()
            && self.relationships.is_empty()
    }

    /// Total number of records across all lists
    pub fn record_count(&self) -> usize {
        self.countries.len()
            + self.states.len()
            + self.cities.len()
            + self.streets.len()
            + self.regions.len()
            + self.departments.len()
            + self.arrondissements.len()
            + self.education_levels.len()
            + self.ethnicities.len()
            + self.relationships.len()
    }

    // ===== Cascading lookups for address and origin pickers =====

    pub fn states_of(&self, country_code: &str) -> Vec<&State> {
        sorted_by_name(
            self.states.iter().filter(|s| s.country_code == country_code),
            |s| &s.name,
        )
    }

    pub fn cities_of(&self, state_code: &str) -> Vec<&City> {
        sorted_by_name(
            self.cities.iter().filter(|c| c.state_code == state_code),
            |c| &c.name,
        )
    }

    pub fn streets_of(&self, city_code: &str) -> Vec<&Street> {
        sorted_by_name(
            self.streets.iter().filter(|s| s.city_code == city_code),
            |s| &s.name,
        )
    }

    pub fn departments_of(&self, region_code: &str) -> Vec<&Department> {
        sorted_by_name(
            self.departments.iter().filter(|d| d.region_code == region_code),
            |d| &d.name,
        )
    }

    pub fn arrondissements_of(&self, department_code: &str) -> Vec<&Arrondissement> {
        sorted_by_name(
            self.arrondissements
                .iter()
                .filter(|a| a.department_code == department_code),
            |a| &a.name,
        )
    }

    /// Education levels in school-cycle order; unranked levels last, by name.
    pub fn education_levels_ordered(&self) -> Vec<&EducationLevel> {
        let mut levels: Vec<&EducationLevel> = self.education_levels.iter().collect();
        levels.sort_by(|a, b| match (a.rank, b.rank) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => cmp_ignore_case(&a.name, &b.name),
        });
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn region(code: &str, name: &str) -> Region {
        Region {
            region_code: code.into(),
            name: name.into(),
        }
    }

    fn department(code: &str, region_code: &str, name: &str) -> Department {
        Department {
            department_code: code.into(),
            region_code: region_code.into(),
            name: name.into(),
        }
    }

    #[test]
    fn test_default_snapshot_is_empty() {
        let snapshot = ConfigurationSnapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.record_count(), 0);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_codes() {
        let snapshot = ConfigurationSnapshot {
            regions: vec![region("CE", "Centre"), region("LT", "Littoral"), region("CE", "Centre bis")],
            ..Default::default()
        };
        assert_eq!(
            snapshot.validate(),
            Err(SnapshotError::DuplicateCode {
                kind: "region",
                code: "CE".into()
            })
        );
    }

    #[test]
    fn test_same_code_in_different_lists_is_fine() {
        let snapshot = ConfigurationSnapshot {
            regions: vec![region("X1", "Centre")],
            departments: vec![department("X1", "X1", "Mfoundi")],
            ..Default::default()
        };
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_departments_of_filters_and_sorts() {
        let snapshot = ConfigurationSnapshot {
            departments: vec![
                department("MFD", "CE", "mfoundi"),
                department("WRI", "LT", "Wouri"),
                department("LEK", "CE", "Lekié"),
            ],
            ..Default::default()
        };

        let names: Vec<&str> = snapshot
            .departments_of("CE")
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["Lekié", "mfoundi"]);
        assert!(snapshot.departments_of("NW").is_empty());
    }

    #[test]
    fn test_education_levels_ordered_by_rank() {
        let level = |code: &str, name: &str, rank: Option<u32>| EducationLevel {
            level_code: code.into(),
            name: name.into(),
            rank,
        };
        let snapshot = ConfigurationSnapshot {
            education_levels: vec![
                level("TLE", "Terminale", Some(7)),
                level("AUT", "Autre", None),
                level("6E", "Sixième", Some(1)),
            ],
            ..Default::default()
        };

        let codes: Vec<&str> = snapshot
            .education_levels_ordered()
            .iter()
            .map(|l| l.level_code.as_str())
            .collect();
        assert_eq!(codes, vec!["6E", "TLE", "AUT"]);
    }

    #[test]
    fn test_deserialize_partial_payload() {
        let snapshot: ConfigurationSnapshot = serde_json::from_value(json!({
            "regions": [{"region_code": "CE", "name": "Centre"}],
            "educationLevels": [{"level_code": "6E", "name": "Sixième"}]
        }))
        .unwrap();

        assert_eq!(snapshot.regions.len(), 1);
        assert_eq!(snapshot.education_levels.len(), 1);
        assert_eq!(snapshot.education_levels[0].rank, None);
        assert!(snapshot.countries.is_empty());
    }
}
