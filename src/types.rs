use std::collections::hash_map;
use std::collections::HashMap;

use crate::normalize::{self, Style};

/// String variables every parse session starts with
pub(crate) const MONTHS: [(&str, &str); 12] = [
    ("JAN", "January"),
    ("FEB", "February"),
    ("MAR", "March"),
    ("APR", "April"),
    ("MAY", "May"),
    ("JUN", "June"),
    ("JUL", "July"),
    ("AUG", "August"),
    ("SEP", "September"),
    ("OCT", "October"),
    ("NOV", "November"),
    ("DEC", "December"),
];

/// One entry in a `.bib` file
///
/// The entry type (e.g. “article”) is not retained. IDs and field names are
/// stored upper-cased; lookups through [`BibEntry::get`] ignore case.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BibEntry {
    /// entry name, e.g. “POTHARAJU2013JUGGLING”
    pub id: String,
    /// map of fields, e.g. “AUTHOR” mapped to “Potharaju, Rahul and Jain, Navendu”
    pub fields: HashMap<String, String>,
}

impl BibEntry {
    /// Generate a new instance of BibEntry without fields.
    pub fn new(id: &str) -> BibEntry {
        BibEntry {
            id: id.to_uppercase(),
            fields: HashMap::new(),
        }
    }

    /// Raw data of a field, as read from the source
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_uppercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(&name.to_uppercase())
    }

    /// Names of all fields, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Given the name of a field, return its data with the escape macros
    /// expanded according to `style`. See [`normalize::normalize`].
    pub fn normalized(&self, name: &str, style: Style) -> Option<String> {
        self.get(name).map(|data| normalize::normalize(data, style))
    }

    /// Store a field, replacing an earlier field of the same name.
    pub(crate) fn set(&mut self, name: String, data: String) {
        if let Some(old) = self.fields.insert(name, data) {
            log::trace!("entry {} overwrites field value {:?}", self.id, old);
        }
    }
}

/// The result of parsing a `.bib` source: its entries and the string
/// variables in effect at the end of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bibliography {
    entries: HashMap<String, BibEntry>,
    // IDs in order of their first appearance
    order: Vec<String>,
    strings: HashMap<String, String>,
}

impl Bibliography {
    /// An empty bibliography knowing only the month abbreviations
    pub fn new() -> Bibliography {
        Bibliography {
            entries: HashMap::new(),
            order: Vec::new(),
            strings: MONTHS
                .iter()
                .map(|(name, month)| (name.to_string(), month.to_string()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(&id.to_uppercase())
    }

    pub fn get(&self, id: &str) -> Option<&BibEntry> {
        self.entries.get(&id.to_uppercase())
    }

    /// Entry IDs in order of their first appearance in the source
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Entries in order of their first appearance in the source
    pub fn iter(&self) -> impl Iterator<Item = &BibEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Value of a string variable, e.g. `string("jan")` is “January”
    pub fn string(&self, name: &str) -> Option<&str> {
        self.strings.get(&name.to_uppercase()).map(String::as_str)
    }

    pub(crate) fn define_string(&mut self, name: String, value: String) {
        log::trace!("@STRING {} = {:?}", name, value);
        self.strings.insert(name, value);
    }

    /// File a completely read entry, replacing all fields of an earlier entry with the same ID.
    pub(crate) fn insert(&mut self, entry: BibEntry) {
        match self.entries.entry(entry.id.clone()) {
            hash_map::Entry::Occupied(mut slot) => {
                log::debug!("entry {} redefined, earlier fields are dropped", entry.id);
                slot.insert(entry);
            }
            hash_map::Entry::Vacant(slot) => {
                self.order.push(entry.id.clone());
                slot.insert(entry);
            }
        }
    }
}

impl Default for Bibliography {
    fn default() -> Self {
        Self::new()
    }
}

impl<'b> IntoIterator for &'b Bibliography {
    type Item = &'b BibEntry;
    type IntoIter = Box<dyn Iterator<Item = &'b BibEntry> + 'b>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
