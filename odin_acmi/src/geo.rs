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

//! flat earth (equirectangular) conversions between geodetic coordinates and a local East-North-Up
//! cartesian frame. This is only accurate over short distances from the reference origin, there is
//! no ellipsoid correction

use std::fmt;
use serde::{Deserialize,Serialize};

/// mean earth radius in meters
pub const MEAN_EARTH_RADIUS: f64 = 6371000.0;

/// Edwards AFB, used if no other reference origin is known
pub const DEFAULT_ORIGIN: GeodeticPoint = GeodeticPoint { lat: 34.9054, lon: -117.8839, alt: 700.0 };

pub const MIN_ALTITUDE: f64 = -1000.0;
pub const MAX_ALTITUDE: f64 = 100000.0;

/// degrees / meters above MSL
#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
pub struct GeodeticPoint {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

impl GeodeticPoint {
    pub const fn new (lat: f64, lon: f64, alt: f64)->Self { GeodeticPoint { lat, lon, alt } }
}

impl fmt::Display for GeodeticPoint {
    fn fmt (&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.7},{:.7},{:.2}m)", self.lat, self.lon, self.alt)
    }
}

/// the geodetic anchor of a local cartesian frame
pub type ReferenceOrigin = GeodeticPoint;

/// local ENU coordinates in meters (x = east, y = north, z = up)
#[derive(Debug,Clone,Copy,Default,PartialEq,Serialize,Deserialize)]
pub struct CartesianPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CartesianPoint {
    pub const fn new (x: f64, y: f64, z: f64)->Self { CartesianPoint { x, y, z } }
}

/// ENU velocity in m/s
#[derive(Debug,Clone,Copy,Default,PartialEq,Serialize,Deserialize)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
}

impl Velocity {
    pub const fn new (vx: f64, vy: f64, vz: f64)->Self { Velocity { vx, vy, vz } }

    pub fn magnitude (&self)->f64 {
        (self.vx*self.vx + self.vy*self.vy + self.vz*self.vz).sqrt()
    }
}

/// airspeed (m/s), flight path pitch (deg) and heading (deg, [0,360))
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct AirData {
    pub airspeed: f64,
    pub pitch: f64,
    pub heading: f64,
}

pub fn to_cartesian (p: &GeodeticPoint, origin: &ReferenceOrigin)->CartesianPoint {
    let d_lat = (p.lat - origin.lat).to_radians();
    let d_lon = (p.lon - origin.lon).to_radians();

    CartesianPoint {
        x: MEAN_EARTH_RADIUS * origin.lat.to_radians().cos() * d_lon,
        y: MEAN_EARTH_RADIUS * d_lat,
        z: p.alt - origin.alt,
    }
}

/// the algebraic inverse of [`to_cartesian`]
pub fn to_geodetic (p: &CartesianPoint, origin: &ReferenceOrigin)->GeodeticPoint {
    let d_lat = p.y / MEAN_EARTH_RADIUS;
    let d_lon = p.x / (MEAN_EARTH_RADIUS * origin.lat.to_radians().cos());

    GeodeticPoint {
        lat: origin.lat + d_lat.to_degrees(),
        lon: origin.lon + d_lon.to_degrees(),
        alt: origin.alt + p.z,
    }
}

/// decompose airspeed into ENU velocity components, assuming no wind
pub fn velocity_from_airspeed (airspeed: f64, pitch: f64, heading: f64)->Velocity {
    let pitch = pitch.to_radians();
    let heading = heading.to_radians();

    let v_horizontal = airspeed * pitch.cos();
    Velocity {
        vx: v_horizontal * heading.sin(),
        vy: v_horizontal * heading.cos(),
        vz: airspeed * pitch.sin(),
    }
}

/// inverse of [`velocity_from_airspeed`]. Heading is reported as 0 if there is no horizontal motion
pub fn airspeed_from_velocity (v: &Velocity)->AirData {
    let airspeed = v.magnitude();
    let v_horizontal = v.vx.hypot(v.vy);

    let pitch = if airspeed > 0.0 { v.vz.atan2(v_horizontal).to_degrees() } else { 0.0 };
    let heading = if v_horizontal > 0.0 { normalize_heading( v.vx.atan2(v.vy).to_degrees()) } else { 0.0 };

    AirData { airspeed, pitch, heading }
}

/// map heading into [0,360)
#[inline]
pub fn normalize_heading (d: f64)->f64 {
    let x = d % 360.0;
    let x = if x < 0.0 { 360.0 + x } else { x };
    if x >= 360.0 { 0.0 } else { x }
}

/// map longitude into [-180,180]
#[inline]
pub fn normalize_longitude (d: f64)->f64 {
    let x = d % 360.0;

    if x < -180.0 { 360.0 + x }
    else if x > 180.0 { x - 360.0 }
    else { x }
}

pub fn validate_geodetic (p: &GeodeticPoint)->bool {
    (-90.0..=90.0).contains(&p.lat)
        && (-180.0..=180.0).contains(&p.lon)
        && (MIN_ALTITUDE..=MAX_ALTITUDE).contains(&p.alt)
}
