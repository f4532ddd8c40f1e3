//! Hierarchical generator configuration
//!
//! A [`ParameterSet`] is read from an xml block. Attributes become
//! parameters, child elements become nested parameter sets:
//!
//! ```xml
//! <generator hadronizer="toy" crossSection="5.2e4" ptMin="20">
//!   <ExternalDecays decayer="toy" particles="15 -15"/>
//! </generator>
//! ```
//!
//! Vector parameters are whitespace-separated lists.
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

use thiserror::Error;

pub type XmlTree = xmltree::Element;

#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("failed to parse configuration: {0}")]
    Xml(#[from] xmltree::ParseError),
    #[error("parameter '{name}' missing in '{set}'")]
    Missing { set: String, name: String },
    #[error("parameter '{name}' has unusable value '{value}'")]
    Conversion { name: String, value: String },
    #[error("'{name}' defined more than once in '{set}'")]
    Duplicate { set: String, name: String },
}

/// Named tree of configuration parameters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParameterSet {
    name: String,
    parameters: BTreeMap<String, String>,
    children: BTreeMap<String, ParameterSet>,
}

impl ParameterSet {
    pub fn new(name: &str) -> Self {
        ParameterSet {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    /// Parse a parameter set from an xml document
    ///
    /// # Example
    ///
    /// ```rust
    /// let pset = genfilter::ParameterSet::parse(
    ///     r#"<generator hadronizer="toy" ptMin="20"/>"#.as_bytes()
    /// ).unwrap();
    /// assert_eq!(pset.get_parameter::<f64>("ptMin").unwrap(), 20.);
    /// ```
    pub fn parse<R: Read>(stream: R) -> Result<Self, ParameterError> {
        let root = XmlTree::parse(stream)?;
        Self::from_xml(&root)
    }

    pub fn from_xml(element: &XmlTree) -> Result<Self, ParameterError> {
        let mut pset = ParameterSet::new(&element.name);
        for (name, value) in &element.attributes {
            pset.parameters.insert(name.clone(), value.clone());
        }
        for child in &element.children {
            if pset.exists(&child.name) {
                return Err(ParameterError::Duplicate {
                    set: pset.name.clone(),
                    name: child.name.clone(),
                });
            }
            let nested = Self::from_xml(child)?;
            pset.children.insert(child.name.clone(), nested);
        }
        Ok(pset)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a parameter or nested set of the given name is present
    pub fn exists(&self, name: &str) -> bool {
        self.parameters.contains_key(name) || self.children.contains_key(name)
    }

    pub fn get_parameter<T: FromStr>(&self, name: &str) -> Result<T, ParameterError> {
        let value = self.raw(name)?;
        convert(name, value.trim())
    }

    pub fn get_parameter_or<T: FromStr>(
        &self,
        name: &str,
        default: T,
    ) -> Result<T, ParameterError> {
        match self.parameters.get(name) {
            Some(value) => convert(name, value.trim()),
            None => Ok(default),
        }
    }

    /// A whitespace-separated list, empty if the parameter is absent
    pub fn get_vector<T: FromStr>(&self, name: &str) -> Result<Vec<T>, ParameterError> {
        match self.parameters.get(name) {
            Some(value) => value
                .split_whitespace()
                .map(|entry| convert(name, entry))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    pub fn get_parameter_set(&self, name: &str) -> Result<&ParameterSet, ParameterError> {
        self.children.get(name).ok_or_else(|| ParameterError::Missing {
            set: self.name.clone(),
            name: name.to_owned(),
        })
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    pub fn insert_parameter<T: fmt::Display>(&mut self, name: &str, value: T) {
        self.parameters.insert(name.to_owned(), value.to_string());
    }

    pub fn with_parameter<T: fmt::Display>(mut self, name: &str, value: T) -> Self {
        self.insert_parameter(name, value);
        self
    }

    pub fn with_parameter_set(mut self, pset: ParameterSet) -> Self {
        self.children.insert(pset.name.clone(), pset);
        self
    }

    fn raw(&self, name: &str) -> Result<&str, ParameterError> {
        self.parameters
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ParameterError::Missing {
                set: self.name.clone(),
                name: name.to_owned(),
            })
    }
}

/// Canonical one-line rendering, used as configuration description
impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{{", self.name)?;
        let mut first = true;
        for (name, value) in &self.parameters {
            if !first {
                f.write_str(";")?;
            }
            write!(f, "{}={}", name, value)?;
            first = false;
        }
        for child in self.children.values() {
            if !first {
                f.write_str(";")?;
            }
            write!(f, "{}", child)?;
            first = false;
        }
        f.write_str("}")
    }
}

impl FromStr for ParameterSet {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.trim().as_bytes())
    }
}

fn convert<T: FromStr>(name: &str, value: &str) -> Result<T, ParameterError> {
    value.parse::<T>().map_err(|_| ParameterError::Conversion {
        name: name.to_owned(),
        value: value.to_owned(),
    })
}
