//! Line parser for `.vmx` descriptor files.
//!
//! The format is one `[section.]key = "value"` assignment per line. Anything
//! else (comments, blank lines, unquoted values) is noise and skipped.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use color_eyre::eyre::{Result, WrapErr};
use regex::Regex;
use serde::Serialize;

use super::value::{Coercion, Value};

/// Match: `ethernet0.connectionType = "nat"` or `displayName = "my-guest"`
static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:(?P<section>[^.]*)\.)?(?P<key>[^ ]+) = "(?P<value>[^"]+)"$"#)
        .expect("Invalid assignment regex")
});

/// A single assignment line, before value coercion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment<'a> {
    pub section: Option<&'a str>,
    pub key: &'a str,
    pub raw: &'a str,
}

/// Split a line into an assignment, or None if the line is noise.
pub fn lex_assignment(line: &str) -> Option<Assignment<'_>> {
    let caps = ASSIGNMENT.captures(line)?;
    Some(Assignment {
        section: caps.name("section").map(|m| m.as_str()),
        key: caps.name("key")?.as_str(),
        raw: caps.name("value")?.as_str(),
    })
}

/// Parsed descriptor: top-level scalars plus named sections
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VmxRecord {
    pub top: BTreeMap<String, Value>,
    pub sections: BTreeMap<String, BTreeMap<String, Value>>,
}

impl VmxRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.top.get(key)
    }

    pub fn section(&self, name: &str) -> Option<&BTreeMap<String, Value>> {
        self.sections.get(name)
    }

    pub fn lookup(&self, section: &str, key: &str) -> Option<&Value> {
        self.sections.get(section)?.get(key)
    }
}

/// Parse descriptor text into a [`VmxRecord`]
pub fn parse_vmx(content: &str, coercion: &Coercion) -> VmxRecord {
    let mut record = VmxRecord::default();

    for line in content.lines() {
        let Some(entry) = lex_assignment(line) else {
            continue;
        };
        let value = coercion.apply(entry.section, entry.raw);
        match entry.section {
            None => {
                record.top.insert(entry.key.to_string(), value);
            }
            Some(section) => {
                record
                    .sections
                    .entry(section.to_string())
                    .or_default()
                    .insert(entry.key.to_string(), value);
            }
        }
    }

    record
}

/// Read and parse a `.vmx` file
pub fn parse_vmx_file(path: &Path, coercion: &Coercion) -> Result<VmxRecord> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read VMX file '{}'", path.display()))?;
    Ok(parse_vmx(&content, coercion))
}
