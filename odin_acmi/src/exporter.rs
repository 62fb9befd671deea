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

use std::{fs, path::{Path,PathBuf}};
use serde::{Deserialize,Serialize};
use tracing::{debug,info};

use crate::ACMI_FILE_SUFFIX;
use crate::errors::Result;
use crate::geo::{GeodeticPoint, ReferenceOrigin, DEFAULT_ORIGIN};
use crate::trajectory::FlightEpisode;
use crate::writer::{batch_file_name, AcmiWriter};

/// configuration for exporting completed episodes as ACMI files, e.g.
/// ```ron
/// AcmiExportConfig(
///     acmi_dir: "runs/training/acmi",
///     prefix: "episode",
///     export_interval: 10,
///     reference_origin: Some((lat: 34.9054, lon: -117.8839, alt: 700.0)),
/// )
/// ```
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct AcmiExportConfig {
    pub acmi_dir: PathBuf,

    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// export every Nth episode (1 = all). 0 disables export
    #[serde(default = "default_export_interval")]
    pub export_interval: usize,

    #[serde(default)]
    pub reference_origin: Option<GeodeticPoint>,

    #[serde(default)]
    pub author: Option<String>,
}

fn default_prefix ()->String { "episode".to_string() }
fn default_export_interval ()->usize { 1 }

impl Default for AcmiExportConfig {
    fn default()->Self {
        AcmiExportConfig {
            acmi_dir: PathBuf::from("acmi"),
            prefix: default_prefix(),
            export_interval: default_export_interval(),
            reference_origin: None,
            author: None,
        }
    }
}

/// read a RON config file
pub fn load_config<C,P> (path: P)->Result<C> where C: for <'a> Deserialize<'a>, P: AsRef<Path> {
    let data = fs::read( path.as_ref())?;
    Ok( ron::de::from_bytes( data.as_slice())? )
}

/// writes every `export_interval`-th completed episode to `<acmi_dir>/<prefix>_<NNNN>.txt.acmi`,
/// NNNN being the running episode count
#[derive(Debug)]
pub struct AcmiExporter {
    config: AcmiExportConfig,
    writer: AcmiWriter,
    episode_count: usize,
}

impl AcmiExporter {
    pub fn new (config: AcmiExportConfig)->Result<Self> {
        if config.export_interval > 0 {
            fs::create_dir_all( &config.acmi_dir)?;
        }

        let mut writer = AcmiWriter::new( config.reference_origin.unwrap_or( DEFAULT_ORIGIN));
        if let Some(author) = &config.author {
            writer = writer.with_author( author);
        }

        Ok( AcmiExporter { config, writer, episode_count: 0 })
    }

    pub fn from_config_file<P: AsRef<Path>> (path: P)->Result<Self> {
        AcmiExporter::new( load_config( path)?)
    }

    pub fn config (&self)->&AcmiExportConfig { &self.config }

    pub fn episode_count (&self)->usize { self.episode_count }

    pub fn set_reference_origin (&mut self, origin: ReferenceOrigin) {
        self.writer.set_origin( origin);
    }

    /// to be called once per completed episode. Returns the path of the written file if the
    /// episode was exported
    pub fn export_episode (&mut self, episode: &FlightEpisode)->Result<Option<PathBuf>> {
        let idx = self.episode_count;
        self.episode_count += 1;

        let interval = self.config.export_interval;
        if interval == 0 || idx % interval != 0 {
            debug!("episode {} not exported", episode.episode_id);
            return Ok(None)
        }

        let path = self.config.acmi_dir.join( batch_file_name( &self.config.prefix, idx));
        let path = self.writer.write_episode_file( episode, path)?;
        Ok( Some(path))
    }

    /// all ACMI files in the export dir that match our prefix, sorted by name
    pub fn exported_files (&self)->Result<Vec<PathBuf>> {
        let dir = &self.config.acmi_dir;
        if !dir.is_dir() {
            return Ok( Vec::new())
        }

        let name_prefix = format!("{}_", self.config.prefix);
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with(&name_prefix) && name.ends_with(ACMI_FILE_SUFFIX) {
                    files.push( path);
                }
            }
        }
        files.sort();
        Ok(files)
    }
}
