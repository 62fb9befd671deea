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

use thiserror::Error;

pub type Result<T> = std::result::Result<T,OdinAcmiError>;

#[derive(Error,Debug)]
pub enum OdinAcmiError {

    /// fatal - the input does not start with a valid ACMI text header
    #[error("invalid ACMI header: {0}")]
    HeaderError(String),

    #[error("ACMI file not found: {0}")]
    FileNotFound(String),

    /// line level error, the parser turns these into diagnostics and continues
    #[error("parse error {0}")]
    ParseError(String),

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("config error {0}")]
    ConfigError( #[from] ron::error::SpannedError),
}

impl OdinAcmiError {
    /// true for errors that abort parsing before any record is produced
    pub fn is_fatal (&self)->bool {
        !matches!( self, OdinAcmiError::ParseError(_))
    }
}

macro_rules! parse_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        OdinAcmiError::ParseError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use parse_error;

macro_rules! header_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        OdinAcmiError::HeaderError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use header_error;
