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

use std::path::{Path,PathBuf};
use tracing::debug;

use crate::{AcmiDocument, AcmiEvent, PropertyMap, PropertyRecord};
use crate::cam::{self, keys};
use crate::errors::Result;
use crate::geo::{self, GeodeticPoint, ReferenceOrigin, DEFAULT_ORIGIN};
use crate::parser::{AcmiParser, LineDiagnostic};
use crate::trajectory::{FlightDataPoint, FlightEpisode, FlightEvent, Orientation, Telemetry};
use crate::writer::AcmiWriter;

pub const DEFAULT_TERMINATION_REASON: &str = "completed";
pub const DEFAULT_EVENT_SEVERITY: &str = "info";

/// how the geodetic anchor of the cartesian trajectory frame is obtained
#[derive(Debug,Clone,Copy,PartialEq)]
pub enum OriginPolicy {
    Fixed(ReferenceOrigin),

    /// use the position of the first positioned record in the document. The origin is
    /// derived once per conversion and shared by all objects of that document
    AutoFromFirstSample,
}

/// the result of importing an ACMI file
#[derive(Debug,Clone)]
pub struct ImportResult {
    pub episodes: Vec<FlightEpisode>,
    pub origin: Option<ReferenceOrigin>,
    pub diagnostics: Vec<LineDiagnostic>,
}

/// maps between parsed ACMI documents and flight episodes (one episode per ACMI object).
///
/// Records without any transform field are treated as metadata records (they contribute to
/// episode metadata but are not trajectory samples). Cumulative rewards are taken from the
/// record if present, otherwise accumulated from instantaneous rewards.
#[derive(Debug,Clone)]
pub struct AcmiConverter {
    origin_policy: OriginPolicy,
}

impl Default for AcmiConverter {
    fn default()->Self { AcmiConverter::new( OriginPolicy::AutoFromFirstSample) }
}

impl AcmiConverter {
    pub fn new (origin_policy: OriginPolicy)->Self { AcmiConverter { origin_policy } }

    pub fn with_origin (origin: ReferenceOrigin)->Self { AcmiConverter::new( OriginPolicy::Fixed(origin)) }

    pub fn origin_policy (&self)->OriginPolicy { self.origin_policy }

    /// the origin used for converting `doc`, None if the policy is automatic and there are no positions
    pub fn resolve_origin (&self, doc: &AcmiDocument)->Option<ReferenceOrigin> {
        match self.origin_policy {
            OriginPolicy::Fixed(origin) => Some(origin),
            OriginPolicy::AutoFromFirstSample => {
                doc.objects.values()
                    .flat_map( |records| records.iter())
                    .find( |r| r.has_position())
                    .map( |r| GeodeticPoint {
                        lat: r.get_f64("Latitude").unwrap_or( DEFAULT_ORIGIN.lat),
                        lon: r.get_f64("Longitude").unwrap_or( DEFAULT_ORIGIN.lon),
                        alt: r.get_f64("Altitude").unwrap_or( DEFAULT_ORIGIN.alt),
                    })
            }
        }
    }

    pub fn document_to_episodes (&self, doc: &AcmiDocument)->Vec<FlightEpisode> {
        let Some(origin) = self.resolve_origin( doc) else {
            debug!("document has no positioned records, no episodes");
            return Vec::new()
        };
        debug!("converting {} objects with reference origin {}", doc.objects.len(), origin);

        doc.objects.iter()
            .filter_map( |(obj_id,records)| object_to_episode( obj_id, records, &doc.events, &origin))
            .collect()
    }

    pub fn file_to_episodes<P: AsRef<Path>> (&self, path: P)->Result<ImportResult> {
        let output = AcmiParser::new().parse_file( path)?;
        let origin = self.resolve_origin( &output.document);
        let episodes = self.document_to_episodes( &output.document);

        Ok( ImportResult { episodes, origin, diagnostics: output.diagnostics })
    }

    /// ACMI text for `episode`. An explicit `origin` overrides a fixed converter origin, if neither
    /// is set the default origin is used
    pub fn episode_to_document (&self, episode: &FlightEpisode, origin: Option<ReferenceOrigin>)->Result<String> {
        self.writer_for( origin).episode_to_string( episode)
    }

    pub fn episode_to_file<P: AsRef<Path>> (&self, episode: &FlightEpisode, path: P, origin: Option<ReferenceOrigin>)->Result<PathBuf> {
        self.writer_for( origin).write_episode_file( episode, path)
    }

    fn writer_for (&self, origin: Option<ReferenceOrigin>)->AcmiWriter {
        let origin = origin.unwrap_or_else( || match self.origin_policy {
            OriginPolicy::Fixed(o) => o,
            OriginPolicy::AutoFromFirstSample => DEFAULT_ORIGIN
        });
        AcmiWriter::new( origin)
    }
}

fn object_to_episode (obj_id: &str, records: &[PropertyRecord], events: &[AcmiEvent], origin: &ReferenceOrigin)->Option<FlightEpisode> {
    let (first,last) = match (records.first(), records.last()) {
        (Some(first),Some(last)) => (first,last),
        _ => { debug!("object {obj_id} has no records, skipped"); return None }
    };

    let samples: Vec<&PropertyRecord> = records.iter().filter(|r| r.has_transform()).collect();
    if !samples.iter().any(|r| r.has_position()) {
        debug!("object {obj_id} has no position data, skipped");
        return None
    }

    let mut md = cam::decode_episode_metadata( &first.properties);
    md.merge( cam::decode_episode_metadata( &last.properties));

    let agent_id = records.iter()
        .find_map( |r| r.get("Name").filter(|v| !v.is_null()).map(|v| v.to_text()))
        .unwrap_or_else( || obj_id.to_string());

    let mut trajectory: Vec<FlightDataPoint> = Vec::with_capacity( samples.len());
    let mut cumulative_reward = 0.0;
    let mut last_pos: Option<GeodeticPoint> = None;
    let mut last_orientation = Orientation::default();

    for (step,rec) in samples.iter().enumerate() {
        let dp = record_to_data_point( step, rec, origin, &mut last_pos, &mut last_orientation, cumulative_reward);
        if let Some(m) = &dp.rl_metrics { cumulative_reward = m.cumulative_reward }
        trajectory.push( dp);
    }

    attach_events( obj_id, events, &mut trajectory);

    let start_time = samples[0].timestamp;
    let duration = samples[samples.len()-1].timestamp - start_time;

    Some( FlightEpisode {
        episode_id: md.episode_id.unwrap_or_else( || format!("acmi_{obj_id}")),
        agent_id,
        episode_number: md.episode_number.unwrap_or(0),
        start_time,
        duration,
        total_steps: trajectory.len(),
        total_reward: cumulative_reward,
        success: md.success.unwrap_or(true),
        termination_reason: md.termination_reason.unwrap_or_else( || DEFAULT_TERMINATION_REASON.to_string()),
        trajectory,
        config: md.config,
        tags: md.tags,
    })
}

fn record_to_data_point (step: usize, rec: &PropertyRecord, origin: &ReferenceOrigin,
                         last_pos: &mut Option<GeodeticPoint>, last_orientation: &mut Orientation, prev_cumulative: f64)->FlightDataPoint {
    let props = &rec.properties;

    // empty transform fields keep their previous value
    let prev = last_pos.unwrap_or(*origin);
    let pos = GeodeticPoint {
        lat: rec.get_f64("Latitude").unwrap_or( prev.lat),
        lon: rec.get_f64("Longitude").unwrap_or( prev.lon),
        alt: rec.get_f64("Altitude").unwrap_or( prev.alt),
    };
    *last_pos = Some(pos);

    let roll = rec.get_f64("Roll").unwrap_or( last_orientation.roll);
    let pitch = rec.get_f64("Pitch").unwrap_or( last_orientation.pitch);
    let yaw = rec.get_f64("Yaw").or_else(|| rec.get_f64("Heading")).unwrap_or( last_orientation.yaw);
    *last_orientation = Orientation { roll, pitch, yaw };

    let airspeed = rec.get_f64("IAS").unwrap_or(0.0);
    let velocity = geo::velocity_from_airspeed( airspeed, pitch, yaw);

    let mut telemetry = Telemetry {
        airspeed,
        altitude: pos.alt,
        g_force: cam::decode_g_force( props),
        throttle: rec.get_f64("Throttle").unwrap_or(0.5),
        aoa: rec.get_f64("AOA").unwrap_or(0.0),
        aos: rec.get_f64("AOS").unwrap_or(0.0),
        heading: yaw,
        vertical_speed: velocity.vz,
        turn_rate: rec.get_f64("TurnRate").unwrap_or(0.0),
        bank_angle: roll,
        ..Telemetry::default()
    };
    telemetry.set_control_surfaces( cam::decode_control_surfaces( props));

    let mut rl_metrics = cam::decode_rl_metrics( props);
    if !cam::has_cumulative_reward( props) {
        rl_metrics.cumulative_reward = prev_cumulative + rl_metrics.reward;
    }

    FlightDataPoint {
        timestamp: rec.timestamp,
        step,
        position: geo::to_cartesian( &pos, origin),
        orientation: Some( Orientation { roll, pitch, yaw }),
        velocity,
        angular_velocity: Some( cam::decode_angular_velocity( props)),
        telemetry,
        rl_metrics: Some( rl_metrics),
        events: None,
    }
}

/// events that target this object go to the latest data point at or before the event time
fn attach_events (obj_id: &str, events: &[AcmiEvent], trajectory: &mut [FlightDataPoint]) {
    if trajectory.is_empty() { return }

    for e in events.iter().filter(|e| e.target.as_deref() == Some(obj_id)) {
        let idx = trajectory.iter().rposition(|dp| dp.timestamp <= e.timestamp).unwrap_or(0);

        let mut metadata = e.properties.clone();
        let severity = metadata.shift_remove( keys::EVENT_SEVERITY)
            .filter(|v| !v.is_null())
            .map(|v| v.to_text())
            .unwrap_or_else( || DEFAULT_EVENT_SEVERITY.to_string());

        let event = FlightEvent {
            timestamp: e.timestamp,
            event_type: e.event_type.clone(),
            severity,
            message: e.message.clone().unwrap_or_default(),
            metadata: if metadata.is_empty() { None } else { Some(metadata) },
        };
        trajectory[idx].events.get_or_insert_with( Vec::new).push( event);
    }
}
