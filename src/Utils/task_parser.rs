/// parse document with structure like
/// ```text
/// # comment
/// title1
/// key1: value1, value2
/// key2: value3
/// title2
/// key3: value4
/// ```
/// into sections of key -> vector of values. Lines are independent: a line is either a section
/// title or a `key: values` entry belonging to the last title above it.
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{alpha1, alphanumeric1, space0},
    combinator::{all_consuming, map, recognize},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, separated_pair},
};
use std::collections::HashMap;
use std::fmt::Display;
use thiserror::Error;

pub type SectionMap = HashMap<String, Vec<Value>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl Value {
    /// Integers are accepted where a float is expected.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Float(val) => write!(f, "{}", val),
            Value::Integer(val) => write!(f, "{}", val),
            Value::Boolean(val) => write!(f, "{}", val),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("line {line}: cannot parse `{text}`")]
    Malformed { line: usize, text: String },
    #[error("line {line}: entry `{key}` appears before any section title")]
    EntryOutsideSection { line: usize, key: String },
    #[error("line {line}: key `{key}` repeated in section `{section}`")]
    DuplicateKey {
        line: usize,
        section: String,
        key: String,
    },
    #[error("unknown section `{0}`")]
    UnknownSection(String),
    #[error("unknown key `{key}` in section `{section}`")]
    UnknownKey { section: String, key: String },
    #[error("`{section}.{key}`: expected {expected}, got `{found}`")]
    WrongType {
        section: String,
        key: String,
        expected: &'static str,
        found: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Title(String),
    Entry(String, Vec<Value>),
}

/// Identifier: a letter or `_` followed by letters, digits and `_`.
fn parse_identifier(input: &str) -> IResult<&str, String> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    map(parser, String::from).parse(input)
}

fn parse_value(input: &str) -> IResult<&str, Value> {
    let raw = take_while1(|c: char| !matches!(c, ',' | ' ' | '\t'));
    map(raw, |s: &str| {
        if let Ok(val) = s.parse::<i64>() {
            Value::Integer(val)
        } else if let Ok(val) = s.parse::<f64>() {
            Value::Float(val)
        } else if let Ok(val) = s.parse::<bool>() {
            Value::Boolean(val)
        } else {
            Value::String(s.to_string())
        }
    })
    .parse(input)
}

fn parse_value_list(input: &str) -> IResult<&str, Vec<Value>> {
    let separator = delimited(space0, tag(","), space0);
    separated_list1(separator, parse_value).parse(input)
}

fn parse_entry(input: &str) -> IResult<&str, (String, Vec<Value>)> {
    let colon = delimited(space0, tag(":"), space0);
    separated_pair(parse_identifier, colon, parse_value_list).parse(input)
}

fn parse_line(input: &str) -> IResult<&str, Line> {
    all_consuming(alt((
        map(parse_entry, |(key, values)| Line::Entry(key, values)),
        map(parse_identifier, Line::Title),
    )))
    .parse(input)
}

/// Drops `#` and `//` comments and surrounding whitespace.
fn strip_comment(line: &str) -> &str {
    let end = [line.find('#'), line.find("//")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    line[..end].trim()
}

/// Parsed keyed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub sections: HashMap<String, SectionMap>,
}

impl Document {
    pub fn parse(input: &str) -> Result<Self, DocumentError> {
        let mut sections: HashMap<String, SectionMap> = HashMap::new();
        let mut current: Option<String> = None;
        for (i, raw_line) in input.lines().enumerate() {
            let line_no = i + 1;
            let text = strip_comment(raw_line);
            if text.is_empty() {
                continue;
            }
            let (_, line) = parse_line(text).map_err(|_| DocumentError::Malformed {
                line: line_no,
                text: text.to_string(),
            })?;
            match line {
                Line::Title(title) => {
                    sections.entry(title.clone()).or_default();
                    current = Some(title);
                }
                Line::Entry(key, values) => {
                    let section = current.as_ref().ok_or_else(|| DocumentError::EntryOutsideSection {
                        line: line_no,
                        key: key.clone(),
                    })?;
                    let entries = sections.entry(section.clone()).or_default();
                    if entries.contains_key(&key) {
                        return Err(DocumentError::DuplicateKey {
                            line: line_no,
                            section: section.clone(),
                            key,
                        });
                    }
                    entries.insert(key, values);
                }
            }
        }
        Ok(Document { sections })
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&[Value]> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(|v| v.as_slice())
    }

    /// Every section and key must appear in `allowed`.
    pub fn check_keys(&self, allowed: &[(&str, &[&str])]) -> Result<(), DocumentError> {
        for (section, keys) in &self.sections {
            let known = allowed
                .iter()
                .find(|(name, _)| *name == section.as_str())
                .ok_or_else(|| DocumentError::UnknownSection(section.clone()))?;
            if let Some(key) = keys.keys().find(|k| !known.1.contains(&k.as_str())) {
                return Err(DocumentError::UnknownKey {
                    section: section.clone(),
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }

    fn wrong_type(section: &str, key: &str, expected: &'static str, values: &[Value]) -> DocumentError {
        DocumentError::WrongType {
            section: section.to_string(),
            key: key.to_string(),
            expected,
            found: values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub fn floats(&self, section: &str, key: &str) -> Result<Option<Vec<f64>>, DocumentError> {
        match self.get(section, key) {
            None => Ok(None),
            Some(values) => values
                .iter()
                .map(|v| v.as_float())
                .collect::<Option<Vec<f64>>>()
                .map(Some)
                .ok_or_else(|| Self::wrong_type(section, key, "numbers", values)),
        }
    }

    pub fn float(&self, section: &str, key: &str) -> Result<Option<f64>, DocumentError> {
        match self.floats(section, key)? {
            None => Ok(None),
            Some(v) if v.len() == 1 => Ok(Some(v[0])),
            Some(_) => Err(Self::wrong_type(
                section,
                key,
                "a single number",
                self.get(section, key).unwrap_or_default(),
            )),
        }
    }

    pub fn count(&self, section: &str, key: &str) -> Result<Option<usize>, DocumentError> {
        match self.get(section, key) {
            None => Ok(None),
            Some([value]) => value
                .as_integer()
                .and_then(|i| usize::try_from(i).ok())
                .map(Some)
                .ok_or_else(|| Self::wrong_type(section, key, "a non-negative integer", &[value.clone()])),
            Some(values) => Err(Self::wrong_type(section, key, "a non-negative integer", values)),
        }
    }

    pub fn counts(&self, section: &str, key: &str) -> Result<Option<Vec<usize>>, DocumentError> {
        match self.get(section, key) {
            None => Ok(None),
            Some(values) => values
                .iter()
                .map(|v| v.as_integer().and_then(|i| usize::try_from(i).ok()))
                .collect::<Option<Vec<usize>>>()
                .map(Some)
                .ok_or_else(|| Self::wrong_type(section, key, "non-negative integers", values)),
        }
    }

    pub fn word(&self, section: &str, key: &str) -> Result<Option<String>, DocumentError> {
        match self.get(section, key) {
            None => Ok(None),
            Some([value]) => Ok(Some(value.to_string())),
            Some(values) => Err(Self::wrong_type(section, key, "a single word", values)),
        }
    }
}
