use serde::{Deserialize, Serialize};

use super::NaturalKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub country_code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub state_code: String,
    pub country_code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub city_code: String,
    pub state_code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Street {
    pub street_code: String,
    pub city_code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub region_code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub department_code: String,
    pub region_code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrondissement {
    pub arrondissement_code: String,
    pub department_code: String,
    pub name: String,
}

impl NaturalKey for Country {
    const KIND: &'static str = "country";
    fn code(&self) -> &str {
        &self.country_code
    }
}

impl NaturalKey for State {
    const KIND: &'static str = "state";
    fn code(&self) -> &str {
        &self.state_code
    }
}

impl NaturalKey for City {
    const KIND: &'static str = "city";
    fn code(&self) -> &str {
        &self.city_code
    }
}

impl NaturalKey for Street {
    const KIND: &'static str = "street";
    fn code(&self) -> &str {
        &self.street_code
    }
}

impl NaturalKey for Region {
    const KIND: &'static str = "region";
    fn code(&self) -> &str {
        &self.region_code
    }
}

impl NaturalKey for Department {
    const KIND: &'static str = "department";
    fn code(&self) -> &str {
        &self.department_code
    }
}

impl NaturalKey for Arrondissement {
    const KIND: &'static str = "arrondissement";
    fn code(&self) -> &str {
        &self.arrondissement_code
    }
}
