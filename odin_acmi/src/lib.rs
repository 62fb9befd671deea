/*
 * Copyright © 2025, United States Government, as represented by the Administrator of 
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License"); 
 * you may not use this file except in compliance with the License. You may obtain a copy 
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */
#![allow(unused)]
#![doc = include_str!("../doc/odin_acmi.md")]

use std::{collections::BTreeSet, fmt};
use serde::{Deserialize,Serialize};
use indexmap::IndexMap;
use chrono::{DateTime,Utc};

mod errors;
pub use errors::*;

pub mod geo;
pub mod cam;
pub mod trajectory;

pub mod parser;
pub use parser::*;

pub mod writer;
pub use writer::*;

pub mod converter;
pub use converter::*;

pub mod exporter;
pub use exporter::*;

/// object id that carries document level (global) properties and events
pub const GLOBAL_OBJECT_ID: &str = "0";

pub const FILE_TYPE_HEADER: &str = "FileType=text/acmi/tacview";
pub const FILE_VERSION_PREFIX: &str = "FileVersion=";
pub const FILE_VERSION: &str = "2.2";

/// suffix of ACMI text files
pub const ACMI_FILE_SUFFIX: &str = ".txt.acmi";

/* #region property values ************************************************************************************/

/// the tagged value of a single ACMI property
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
#[serde(untagged)]
pub enum AcmiValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl AcmiValue {

    /// generic coercion of a raw (unquoted or quoted) property token.
    /// Tokens that can't be interpreted as anything else degrade to `Str`
    pub fn coerce (token: &str)->AcmiValue {
        let s = token.trim();

        if s.eq_ignore_ascii_case("true") { return AcmiValue::Bool(true) }
        if s.eq_ignore_ascii_case("false") { return AcmiValue::Bool(false) }
        if s.eq_ignore_ascii_case("null") { return AcmiValue::Null }

        if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
            return AcmiValue::Str( unescape( &s[1..s.len()-1]))
        }

        if looks_numeric(s) {
            if !s.contains(['.','e','E']) {
                if let Ok(i) = s.parse::<i64>() { return AcmiValue::Int(i) }
            }
            if let Ok(f) = s.parse::<f64>() { return AcmiValue::Float(f) }
        }

        AcmiValue::Str( unescape(s))
    }

    pub fn is_null (&self)->bool { matches!(self, AcmiValue::Null) }

    pub fn as_f64 (&self)->Option<f64> {
        match self {
            AcmiValue::Int(i) => Some(*i as f64),
            AcmiValue::Float(f) => Some(*f),
            AcmiValue::Str(s) => s.trim().parse::<f64>().ok(),
            _ => None
        }
    }

    pub fn as_i64 (&self)->Option<i64> {
        match self {
            AcmiValue::Int(i) => Some(*i),
            AcmiValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            AcmiValue::Str(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            }
            _ => None
        }
    }

    pub fn as_bool (&self)->Option<bool> {
        match self {
            AcmiValue::Bool(b) => Some(*b),
            AcmiValue::Int(i) => Some(*i != 0),
            AcmiValue::Float(f) => Some(*f != 0.0),
            AcmiValue::Str(s) => Some( s.trim().eq_ignore_ascii_case("true")),
            AcmiValue::Null => None
        }
    }

    pub fn as_str (&self)->Option<&str> {
        if let AcmiValue::Str(s) = self { Some(s.as_str()) } else { None }
    }

    /// plain text rendering without ACMI quoting (e.g. to use a numeric value as an id)
    pub fn to_text (&self)->String {
        match self {
            AcmiValue::Null => "null".to_string(),
            AcmiValue::Bool(b) => b.to_string(),
            AcmiValue::Int(i) => i.to_string(),
            AcmiValue::Float(f) => f.to_string(),
            AcmiValue::Str(s) => s.clone(),
        }
    }
}

/// the ACMI literal: quoted/escaped strings, lowercase booleans, 6 decimal floats, bare integers
impl fmt::Display for AcmiValue {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcmiValue::Null => write!(f, "null"),
            AcmiValue::Bool(b) => write!(f, "{}", b),
            AcmiValue::Int(i) => write!(f, "{}", i),
            AcmiValue::Float(v) => write!(f, "{:.6}", v),
            AcmiValue::Str(s) => write!(f, "\"{}\"", escape(s)),
        }
    }
}

impl From<f64> for AcmiValue { fn from (v: f64)->Self { AcmiValue::Float(v) } }
impl From<i64> for AcmiValue { fn from (v: i64)->Self { AcmiValue::Int(v) } }
impl From<i32> for AcmiValue { fn from (v: i32)->Self { AcmiValue::Int(v as i64) } }
impl From<bool> for AcmiValue { fn from (v: bool)->Self { AcmiValue::Bool(v) } }
impl From<&str> for AcmiValue { fn from (v: &str)->Self { AcmiValue::Str(v.to_string()) } }
impl From<String> for AcmiValue { fn from (v: String)->Self { AcmiValue::Str(v) } }

fn looks_numeric (s: &str)->bool {
    !s.is_empty() && s.bytes().any(|b| b.is_ascii_digit()) && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E'))
}

/// backslash escapes protect quotes and separators inside of string values
pub fn escape (s: &str)->String {
    let mut buf = String::with_capacity( s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '"' | ',') { buf.push('\\') }
        buf.push(c);
    }
    buf
}

pub fn unescape (s: &str)->String {
    let mut buf = String::with_capacity( s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(c) = chars.next() { buf.push(c) } else { buf.push(c) }
        } else {
            buf.push(c);
        }
    }
    buf
}

/// insertion ordered property bag
pub type PropertyMap = IndexMap<String,AcmiValue>;

/* #endregion property values */

/* #region document ********************************************************************************************/

/// the properties of one object line, with the time of the enclosing frame attached
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct PropertyRecord {
    pub timestamp: f64,
    pub properties: PropertyMap,
}

impl PropertyRecord {
    pub fn new (timestamp: f64, properties: PropertyMap)->Self {
        PropertyRecord { timestamp, properties }
    }

    pub fn get (&self, key: &str)->Option<&AcmiValue> { self.properties.get(key) }

    pub fn get_f64 (&self, key: &str)->Option<f64> { self.properties.get(key).and_then(|v| v.as_f64()) }

    pub fn get_str (&self, key: &str)->Option<&str> { self.properties.get(key).and_then(|v| v.as_str()) }

    pub fn contains (&self, key: &str)->bool { self.properties.contains_key(key) }

    /// does this record carry any decoded transform position component
    pub fn has_position (&self)->bool {
        self.contains("Longitude") || self.contains("Latitude") || self.contains("Altitude")
    }

    /// does this record carry any decoded transform field (position, attitude, U/V or heading).
    /// Records without are pure property updates
    pub fn has_transform (&self)->bool {
        parser::TRANSFORM_KEYS.iter().any(|k| self.contains(k))
    }
}

#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct AcmiEvent {
    pub timestamp: f64,
    pub event_type: String,
    pub target: Option<String>,
    pub message: Option<String>,

    /// the other properties set on the same global line
    pub properties: PropertyMap,
}

/// the generic result of parsing an ACMI text document
#[derive(Debug,Clone,Default,PartialEq,Serialize,Deserialize)]
pub struct AcmiDocument {
    pub global_properties: PropertyMap,
    pub objects: IndexMap<String,Vec<PropertyRecord>>,
    pub events: Vec<AcmiEvent>,
}

impl AcmiDocument {
    pub fn file_version (&self)->Option<&str> {
        self.global_properties.get("FileVersion").and_then(|v| v.as_str())
    }

    pub fn reference_time (&self)->Option<DateTime<Utc>> {
        let s = self.global_properties.get("ReferenceTime")?.to_text();
        DateTime::parse_from_rfc3339( s.trim()).ok().map(|dt| dt.with_timezone(&Utc))
    }

    fn first_name (records: &[PropertyRecord])->Option<&str> {
        records.first().and_then(|r| r.get_str("Name"))
    }

    /// the first object whose first record has a matching `Name`
    pub fn object_by_name (&self, name: &str)->Option<(&str,&[PropertyRecord])> {
        self.objects.iter()
            .find( |(_,records)| Self::first_name(records) == Some(name))
            .map( |(id,records)| (id.as_str(), records.as_slice()))
    }

    /// object id -> name for all objects that have a `Name` in their first record
    pub fn object_names (&self)->IndexMap<String,String> {
        self.objects.iter()
            .filter_map( |(id,records)| Self::first_name(records).map( |name| (id.clone(), name.to_string())))
            .collect()
    }

    /// all agent metadata keys used by object records
    pub fn cam_keys (&self)->BTreeSet<String> {
        self.objects.values()
            .flat_map( |records| records.iter())
            .flat_map( |r| r.properties.keys())
            .filter( |k| cam::is_cam_key(k))
            .cloned()
            .collect()
    }

    pub fn record_count (&self)->usize {
        self.objects.values().map(|records| records.len()).sum()
    }

    /// non-fatal structural warnings about the document content
    pub fn validate (&self)->Vec<String> {
        let mut warnings = Vec::new();

        if self.objects.is_empty() {
            warnings.push("no objects found".to_string());
        }
        for (id,records) in &self.objects {
            if records.is_empty() {
                warnings.push( format!("object {id} has no records"));
            } else if !records.iter().any(|r| r.has_position()) {
                warnings.push( format!("object {id} has no position data"));
            }
        }
        warnings
    }
}

/* #endregion document */
