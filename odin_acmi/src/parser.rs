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

use std::{fmt, fs::File, io::{self,BufRead,BufReader}, path::Path};
use tracing::{debug,warn};

use crate::{AcmiDocument, AcmiEvent, AcmiValue, PropertyMap, PropertyRecord};
use crate::{FILE_TYPE_HEADER, FILE_VERSION_PREFIX, GLOBAL_OBJECT_ID};
use crate::errors::{OdinAcmiError, Result, header_error, parse_error};

/// the record keys a `T=..` transform value is decoded into, in field order
pub const TRANSFORM_KEYS: [&str;9] = ["Longitude", "Latitude", "Altitude", "Roll", "Pitch", "Yaw", "U", "V", "Heading"];

const FLAT_TRANSFORM_KEYS: [&str;5] = ["Longitude", "Latitude", "Altitude", "U", "V"];

const BOM: char = '\u{feff}';

/// a recoverable problem with a single input line. Malformed lines are skipped, out of order
/// time frames are kept
#[derive(Debug,Clone,PartialEq)]
pub struct LineDiagnostic {
    pub line: usize, // 1-based
    pub content: String,
    pub message: String,
}

impl fmt::Display for LineDiagnostic {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} ('{}')", self.line, self.message, self.content)
    }
}

#[derive(Debug,Clone,Default)]
pub struct ParseOutput {
    pub document: AcmiDocument,
    pub diagnostics: Vec<LineDiagnostic>,
}

/// line oriented ACMI text parser. The parser does not know about agent metadata, it only
/// produces a generic [`AcmiDocument`].
///
/// Each `parse_..` call starts from a clean state. Use one parser per concurrent parse.
#[derive(Debug,Default)]
pub struct AcmiParser {
    current_time: f64,
    document: AcmiDocument,
    diagnostics: Vec<LineDiagnostic>,
}

impl AcmiParser {
    pub fn new ()->Self { AcmiParser::default() }

    pub fn parse_file<P: AsRef<Path>> (&mut self, path: P)->Result<ParseOutput> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err( OdinAcmiError::FileNotFound( path.display().to_string()))
        }

        debug!("parsing ACMI file {:?}", path);
        let file = File::open(path)?;
        self.parse_reader( BufReader::new(file))
    }

    pub fn parse_str (&mut self, text: &str)->Result<ParseOutput> {
        self.parse_reader( text.as_bytes())
    }

    pub fn parse_reader<R: BufRead> (&mut self, reader: R)->Result<ParseOutput> {
        self.reset();

        let mut lines = reader.split(b'\n');
        self.parse_header( &mut lines)?;

        let mut line_no = 2;
        for bytes in lines {
            line_no += 1;
            let bytes = bytes?;

            match String::from_utf8(bytes) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with("//") { continue }

                    if let Err(e) = self.parse_line( line_no, line) {
                        self.add_diagnostic( line_no, line, e);
                    }
                }
                Err(e) => {
                    let line = String::from_utf8_lossy( e.as_bytes()).trim().to_string();
                    self.add_diagnostic( line_no, &line, parse_error!("invalid UTF-8"));
                }
            }
        }

        debug!("parsed {} objects with {} records, {} events, {} diagnostics",
               self.document.objects.len(), self.document.record_count(), self.document.events.len(), self.diagnostics.len());

        Ok( ParseOutput {
            document: std::mem::take( &mut self.document),
            diagnostics: std::mem::take( &mut self.diagnostics)
        })
    }

    fn reset (&mut self) {
        self.current_time = 0.0;
        self.document = AcmiDocument::default();
        self.diagnostics.clear();
    }

    fn add_diagnostic (&mut self, line: usize, content: &str, e: OdinAcmiError) {
        warn!("skipping ACMI line {line}: {e}");
        self.diagnostics.push( LineDiagnostic { line, content: content.to_string(), message: e.to_string() });
    }

    fn parse_header<I> (&mut self, lines: &mut I)->Result<()> where I: Iterator<Item=io::Result<Vec<u8>>> {
        let line = next_header_line( lines)?;
        let line = line.trim_start_matches(BOM).trim();
        if line != FILE_TYPE_HEADER {
            return Err( header_error!("expected '{FILE_TYPE_HEADER}', got: '{line}'"))
        }

        let line = next_header_line( lines)?;
        let line = line.trim();
        if let Some(version) = line.strip_prefix(FILE_VERSION_PREFIX) {
            debug!("ACMI file version {version}");
            self.document.global_properties.insert( "FileVersion".to_string(), AcmiValue::Str( version.trim().to_string()));
            Ok(())
        } else {
            Err( header_error!("expected '{FILE_VERSION_PREFIX}<version>', got: '{line}'"))
        }
    }

    fn parse_line (&mut self, line_no: usize, line: &str)->Result<()> {
        if let Some(s) = line.strip_prefix('#') {
            let t = s.trim().parse::<f64>().ok().filter(|t| t.is_finite()).ok_or_else(|| parse_error!("invalid time frame"))?;
            if t < self.current_time {
                let message = format!("time frame {t} precedes current time {}", self.current_time);
                warn!("ACMI line {line_no}: {message}");
                self.diagnostics.push( LineDiagnostic { line: line_no, content: line.to_string(), message });
            }
            self.current_time = t;
            return Ok(())
        }

        if let Some(id) = line.strip_prefix('-') {
            // removal has no effect on the parsed document, the object keeps its records
            debug!("object {} removed at {}", id.trim(), self.current_time);
            return Ok(())
        }

        if let Some((id,props)) = line.split_once(',') {
            let id = id.trim();
            if id.is_empty() {
                return Err( parse_error!("missing object id"))
            }

            let mut props = parse_properties( props)?;

            if id == GLOBAL_OBJECT_ID {
                if let Some(event) = props.shift_remove("Event") {
                    let event = parse_event( &event, self.current_time, props.clone());
                    debug!("event {} at {}", event.event_type, event.timestamp);
                    self.document.events.push( event);
                }
                self.document.global_properties.extend( props);

            } else {
                self.document.objects.entry( id.to_string()).or_default().push( PropertyRecord::new( self.current_time, props));
            }
            Ok(())

        } else {
            Err( parse_error!("unrecognized line"))
        }
    }
}

fn next_header_line<I> (lines: &mut I)->Result<String> where I: Iterator<Item=io::Result<Vec<u8>>> {
    match lines.next() {
        Some(bytes) => String::from_utf8( bytes?).map_err(|_| header_error!("header is not valid UTF-8")),
        None => Err( header_error!("missing header line"))
    }
}

/// split a property list on separators that are neither quoted nor escaped
pub fn split_properties (s: &str)->Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i,c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push( &s[start..i]);
                start = i+1;
            }
            _ => {}
        }
    }
    parts.push( &s[start..]);
    parts
}

pub fn parse_properties (s: &str)->Result<PropertyMap> {
    let mut props = PropertyMap::new();

    for part in split_properties(s) {
        let part = part.trim();
        if let Some((key,value)) = part.split_once('=') {
            let key = key.trim();
            let value = value.trim();

            if key == "T" {
                parse_transform( value, &mut props)?;
            } else if !key.is_empty() {
                props.insert( key.to_string(), AcmiValue::coerce(value));
            }
        }
    }

    Ok(props)
}

/// decode `lon|lat|alt[|roll|pitch|yaw[|u|v[|heading]]]` (or the flat `lon|lat|alt|u|v`) into named
/// record fields. Empty fields mean "unchanged" and are not set
pub fn parse_transform (value: &str, props: &mut PropertyMap)->Result<()> {
    let fields: Vec<&str> = value.split('|').collect();

    let keys: &[&str] = match fields.len() {
        0..=2 => return Err( parse_error!("transform needs at least 3 fields, got '{value}'")),
        3 | 4 => &TRANSFORM_KEYS[..3],
        5 => &FLAT_TRANSFORM_KEYS[..],
        6 | 7 => &TRANSFORM_KEYS[..6],
        8 => &TRANSFORM_KEYS[..8],
        _ => &TRANSFORM_KEYS[..]
    };

    for (key,field) in keys.iter().zip( fields.iter()) {
        let field = field.trim();
        if !field.is_empty() {
            let v = field.parse::<f64>().map_err(|_| parse_error!("invalid transform field {key}='{field}'"))?;
            props.insert( key.to_string(), AcmiValue::Float(v));
        }
    }

    Ok(())
}

/// `type[|target]|message` - a single segment after the type is the message. The message is the
/// remainder of the value and can contain `|` itself
fn parse_event (value: &AcmiValue, timestamp: f64, properties: PropertyMap)->AcmiEvent {
    let text = value.to_text();
    let segments: Vec<&str> = text.splitn( 3, '|').collect();
    let non_empty = |s: &str| { let s = s.trim(); if s.is_empty() { None } else { Some(s.to_string()) } };

    let event_type = non_empty( segments[0]).unwrap_or_else(|| "Unknown".to_string());
    let (target, message) = match segments.as_slice() {
        [_, msg] => (None, non_empty( msg)),
        [_, target, msg] => (non_empty( target), non_empty( msg)),
        _ => (None, None)
    };

    AcmiEvent { timestamp, event_type, target, message, properties }
}
