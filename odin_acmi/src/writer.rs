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

use std::{fs::{self,File}, io::{self,BufWriter,Write}, path::{Path,PathBuf}};
use chrono::{DateTime,Utc};
use tracing::{debug,info};

use crate::{AcmiValue, PropertyMap, ACMI_FILE_SUFFIX, FILE_TYPE_HEADER, FILE_VERSION, FILE_VERSION_PREFIX, GLOBAL_OBJECT_ID};
use crate::cam::{self, keys, PolicyInfo};
use crate::errors::Result;
use crate::geo::{self, ReferenceOrigin, DEFAULT_ORIGIN};
use crate::trajectory::{FlightDataPoint, FlightEpisode, FlightEvent};

pub const DEFAULT_AUTHOR: &str = "odin_acmi";

/// the hash function used to derive object ids from agent ids
pub const OBJECT_ID_HASH: &str = "fnv1a32";

const FNV_OFFSET_BASIS: u32 = 0x811c9dc5;
const FNV_PRIME: u32 = 0x01000193;

/// time offset of the record that carries the episode termination properties
pub const TERMINATION_OFFSET: f64 = 0.001;

/// time offset of the object removal
pub const REMOVAL_OFFSET: f64 = 0.1;

/// number of frames between blank separator lines
pub const FRAME_GROUP_SIZE: usize = 10;

/// AOA/AOS below this magnitude are not written
const ANGLE_EPSILON: f64 = 0.01;

const REFERENCE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn fnv1a_32 (bytes: &[u8])->u32 {
    bytes.iter().fold( FNV_OFFSET_BASIS, |h,b| (h ^ *b as u32).wrapping_mul(FNV_PRIME))
}

/// 8 lowercase hex digits. This is stable across runs and platforms
pub fn object_id_for_agent (agent_id: &str)->String {
    format!("{:08x}", fnv1a_32( agent_id.as_bytes()))
}

/// make sure the path ends with `.txt.acmi`
pub fn acmi_path<P: AsRef<Path>> (path: P)->PathBuf {
    let path = path.as_ref();
    if path.to_string_lossy().ends_with(ACMI_FILE_SUFFIX) {
        path.to_path_buf()
    } else {
        path.with_extension( &ACMI_FILE_SUFFIX[1..])
    }
}

/// `<prefix>_<NNNN>.txt.acmi`
pub fn batch_file_name (prefix: &str, idx: usize)->String {
    format!("{prefix}_{idx:04}{ACMI_FILE_SUFFIX}")
}

/// serializes single [`FlightEpisode`]s as ACMI text, with agent metadata in the `Agent.*` namespace.
/// The writer does not validate its input.
#[derive(Debug,Clone)]
pub struct AcmiWriter {
    origin: ReferenceOrigin,
    reference_time: Option<DateTime<Utc>>, // None -> time of writing
    author: String,
}

impl Default for AcmiWriter {
    fn default()->Self { AcmiWriter::new( DEFAULT_ORIGIN) }
}

impl AcmiWriter {
    pub fn new (origin: ReferenceOrigin)->Self {
        AcmiWriter { origin, reference_time: None, author: DEFAULT_AUTHOR.to_string() }
    }

    pub fn with_reference_time (mut self, reference_time: DateTime<Utc>)->Self {
        self.reference_time = Some(reference_time);
        self
    }

    pub fn with_author (mut self, author: impl ToString)->Self {
        self.author = author.to_string();
        self
    }

    pub fn origin (&self)->&ReferenceOrigin { &self.origin }

    pub fn set_origin (&mut self, origin: ReferenceOrigin) { self.origin = origin }

    pub fn write_episode<W: Write> (&self, episode: &FlightEpisode, w: &mut W)->Result<()> {
        let obj_id = object_id_for_agent( &episode.agent_id);

        self.write_header( episode, w)?;
        self.write_declaration( episode, &obj_id, w)?;

        for (i,dp) in episode.trajectory.iter().enumerate() {
            self.write_data_point( dp, &obj_id, w)?;
            if i % FRAME_GROUP_SIZE == FRAME_GROUP_SIZE-1 {
                writeln!(w)?;
            }
        }

        self.write_footer( episode, &obj_id, w)?;
        Ok(())
    }

    pub fn episode_to_string (&self, episode: &FlightEpisode)->Result<String> {
        let mut buf: Vec<u8> = Vec::new();
        self.write_episode( episode, &mut buf)?;
        Ok( String::from_utf8(buf).map_err(|e| io::Error::new( io::ErrorKind::InvalidData, e))? )
    }

    /// write to `path` (with enforced `.txt.acmi` suffix), creating parent dirs as needed
    pub fn write_episode_file<P: AsRef<Path>> (&self, episode: &FlightEpisode, path: P)->Result<PathBuf> {
        let path = acmi_path( path);
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() { fs::create_dir_all(dir)? }
        }

        let mut w = BufWriter::new( File::create(&path)?);
        self.write_episode( episode, &mut w)?;
        w.flush()?;

        info!("wrote {} data points of episode {} to {:?}", episode.trajectory.len(), episode.episode_id, path);
        Ok(path)
    }

    fn write_header<W: Write> (&self, episode: &FlightEpisode, w: &mut W)->Result<()> {
        writeln!(w, "{FILE_TYPE_HEADER}")?;
        writeln!(w, "{FILE_VERSION_PREFIX}{FILE_VERSION}")?;
        writeln!(w)?;

        let ref_time = self.reference_time.unwrap_or_else( Utc::now);
        write!(w, "{GLOBAL_OBJECT_ID},ReferenceTime={}", ref_time.format(REFERENCE_TIME_FORMAT))?;

        let mut props = PropertyMap::new();
        props.insert( "Title".to_string(), episode.episode_id.as_str().into());
        props.insert( "Author".to_string(), self.author.as_str().into());
        props.insert( "Comments".to_string(), format!("RL Episode {} - {}", episode.episode_number, episode.agent_id).into());
        if let Some(policy) = episode.policy() {
            let info = PolicyInfo { policy: Some(policy.to_text()), ..Default::default() };
            props.extend( cam::encode_policy( &info));
        }
        write_properties( &props, w)?;
        writeln!(w)?;
        writeln!(w)?;
        Ok(())
    }

    fn write_declaration<W: Write> (&self, episode: &FlightEpisode, obj_id: &str, w: &mut W)->Result<()> {
        writeln!(w, "#0.0")?;
        write!(w, "{obj_id},Type=Air+FixedWing,Name={},Pilot=\"RL_Agent\",Coalition=Blue,Color=Blue", AcmiValue::from( episode.agent_id.as_str()))?;
        write_properties( &cam::encode_episode_metadata( episode), w)?;
        writeln!(w)?;
        writeln!(w)?;
        Ok(())
    }

    fn write_data_point<W: Write> (&self, dp: &FlightDataPoint, obj_id: &str, w: &mut W)->Result<()> {
        writeln!(w, "#{:.3}", dp.timestamp)?;

        let pos = geo::to_geodetic( &dp.position, &self.origin);
        write!(w, "{obj_id},T={:.7}|{:.7}|{:.2}", pos.lon, pos.lat, pos.alt)?;
        if let Some(o) = &dp.orientation {
            write!(w, "|{:.2}|{:.2}|{:.2}", o.roll, o.pitch, o.yaw)?;
        }

        let tm = &dp.telemetry;
        write!(w, ",IAS={:.2},Throttle={:.3}", tm.airspeed, tm.throttle)?;
        if tm.aoa.abs() > ANGLE_EPSILON { write!(w, ",AOA={:.2}", tm.aoa)?; }
        if tm.aos.abs() > ANGLE_EPSILON { write!(w, ",AOS={:.2}", tm.aos)?; }
        if dp.orientation.is_some() { write!(w, ",Heading={:.2}", tm.heading)?; }

        write_properties( &cam::encode_g_force( tm.g_force), w)?;
        if let Some(av) = &dp.angular_velocity {
            write_properties( &cam::encode_angular_velocity( av), w)?;
        }
        write_properties( &cam::encode_control_surfaces( &tm.control_surfaces()), w)?;
        if let Some(m) = &dp.rl_metrics {
            write_properties( &cam::encode_rl_metrics( m), w)?;
        }
        writeln!(w)?;

        if let Some(events) = &dp.events {
            for e in events {
                write_event( e, obj_id, w)?;
            }
        }
        Ok(())
    }

    fn write_footer<W: Write> (&self, episode: &FlightEpisode, obj_id: &str, w: &mut W)->Result<()> {
        if let Some(last) = episode.last_timestamp() {
            writeln!(w)?;
            writeln!(w, "#{:.3}", last + TERMINATION_OFFSET)?;
            write!(w, "{obj_id}")?;
            write_properties( &cam::encode_episode_termination( episode), w)?;
            writeln!(w)?;

            writeln!(w)?;
            writeln!(w, "#{:.3}", last + REMOVAL_OFFSET)?;
            writeln!(w, "-{obj_id}")?;
        } else {
            debug!("episode {} has no data points, no footer written", episode.episode_id);
        }
        Ok(())
    }
}

fn write_properties<W: Write> (props: &PropertyMap, w: &mut W)->Result<()> {
    for (k,v) in props {
        write!(w, ",{k}={v}")?;
    }
    Ok(())
}

/// point events become global `Event` lines that target the agent object
fn write_event<W: Write> (e: &FlightEvent, obj_id: &str, w: &mut W)->Result<()> {
    let value = AcmiValue::Str( format!("{}|{}|{}", e.event_type, obj_id, e.message));
    write!(w, "{GLOBAL_OBJECT_ID},Event={value},{}={}", keys::EVENT_SEVERITY, AcmiValue::from( e.severity.as_str()))?;
    if let Some(metadata) = &e.metadata {
        write_properties( metadata, w)?;
    }
    writeln!(w)?;
    Ok(())
}

/// write each episode to `<dir>/<prefix>_<NNNN>.txt.acmi`, returning the written paths
pub fn write_episodes<P: AsRef<Path>> (writer: &AcmiWriter, episodes: &[FlightEpisode], dir: P, prefix: &str)->Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut paths = Vec::with_capacity( episodes.len());
    for (i,episode) in episodes.iter().enumerate() {
        let path = writer.write_episode_file( episode, dir.join( batch_file_name( prefix, i)))?;
        paths.push(path);
    }
    Ok(paths)
}
