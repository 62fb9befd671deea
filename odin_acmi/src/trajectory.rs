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

//! the flight trajectory model that is exchanged with episode producers and consumers

use serde::{Deserialize,Serialize};
use indexmap::IndexMap;
use crate::AcmiValue;
use crate::geo::{CartesianPoint,Velocity};

/// degrees
#[derive(Debug,Clone,Copy,Default,PartialEq,Serialize,Deserialize)]
pub struct Orientation {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// body rates in rad/s
#[derive(Debug,Clone,Copy,Default,PartialEq,Serialize,Deserialize)]
pub struct AngularVelocity {
    pub p: f64,
    pub q: f64,
    pub r: f64,
}

#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct Telemetry {
    pub airspeed: f64,       // m/s
    pub altitude: f64,       // m MSL
    pub g_force: f64,
    pub throttle: f64,       // 0..1
    pub aoa: f64,            // deg
    pub aos: f64,            // deg
    pub heading: f64,        // deg
    pub vertical_speed: f64, // m/s
    pub turn_rate: f64,      // deg/s
    pub bank_angle: f64,     // deg

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aileron: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevator: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rudder: Option<f64>,
}

impl Default for Telemetry {
    fn default()->Self {
        Telemetry {
            airspeed: 0.0, altitude: 0.0, g_force: 1.0, throttle: 0.5, aoa: 0.0, aos: 0.0,
            heading: 0.0, vertical_speed: 0.0, turn_rate: 0.0, bank_angle: 0.0,
            aileron: None, elevator: None, rudder: None
        }
    }
}

/// aileron/elevator/rudder deflections, each only if known
#[derive(Debug,Clone,Copy,Default,PartialEq)]
pub struct ControlSurfaces {
    pub aileron: Option<f64>,
    pub elevator: Option<f64>,
    pub rudder: Option<f64>,
}

impl Telemetry {
    pub fn control_surfaces (&self)->ControlSurfaces {
        ControlSurfaces { aileron: self.aileron, elevator: self.elevator, rudder: self.rudder }
    }

    pub fn set_control_surfaces (&mut self, cs: ControlSurfaces) {
        self.aileron = cs.aileron;
        self.elevator = cs.elevator;
        self.rudder = cs.rudder;
    }
}

#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct RlMetrics {
    pub reward: f64,
    pub cumulative_reward: f64,
    pub action: Vec<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_logprob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_estimate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advantage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_components: Option<IndexMap<String,f64>>,
}

impl RlMetrics {
    pub fn new (reward: f64, cumulative_reward: f64, action: Vec<f64>)->Self {
        RlMetrics {
            reward, cumulative_reward, action,
            policy_logprob: None, value_estimate: None, advantage: None, entropy: None, reward_components: None
        }
    }
}

#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct FlightEvent {
    pub timestamp: f64,
    pub event_type: String,
    pub severity: String,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<IndexMap<String,AcmiValue>>,
}

#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct FlightDataPoint {
    pub timestamp: f64,
    pub step: usize,
    pub position: CartesianPoint,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,

    pub velocity: Velocity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angular_velocity: Option<AngularVelocity>,

    pub telemetry: Telemetry,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rl_metrics: Option<RlMetrics>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<FlightEvent>>,
}

#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct FlightEpisode {
    pub episode_id: String,
    pub agent_id: String,
    pub episode_number: i64,
    pub start_time: f64,
    pub duration: f64,
    pub total_steps: usize,
    pub total_reward: f64,
    pub success: bool,
    pub termination_reason: String,
    pub trajectory: Vec<FlightDataPoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<IndexMap<String,AcmiValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl FlightEpisode {
    pub fn first_timestamp (&self)->Option<f64> { self.trajectory.first().map(|dp| dp.timestamp) }

    pub fn last_timestamp (&self)->Option<f64> { self.trajectory.last().map(|dp| dp.timestamp) }

    /// the configured policy name, if any
    pub fn policy (&self)->Option<&AcmiValue> {
        self.config.as_ref().and_then(|cfg| cfg.get("policy"))
    }
}
