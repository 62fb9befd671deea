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

//! Custom Agent Metadata (CAM): the `Agent.*` property namespace that carries reinforcement learning
//! data inside of ACMI object records. Standard ACMI viewers ignore these keys.
//!
//! There are three kinds of keys:
//!   - fixed scalar keys (e.g. `Agent.Reward.Instant`)
//!   - indexed keys for the action vector (`Agent.Action.0`, `Agent.Action.1`, ..)
//!   - dynamic keys for named reward components (`Agent.Reward.<canonical-name>`)
//!
//! Reward component names are stored in canonical form (lowercase, non-alphanumeric chars removed),
//! i.e. a round trip preserves the components only up to that canonical form.

use indexmap::IndexMap;
use tracing::debug;

use crate::{AcmiValue, PropertyMap};
use crate::trajectory::{AngularVelocity, ControlSurfaces, FlightEpisode, RlMetrics};

pub const NAMESPACE: &str = "Agent";

pub mod keys {
    // RL metrics
    pub const REWARD_INSTANT: &str = "Agent.Reward.Instant";
    pub const REWARD_CUM: &str = "Agent.Reward.Cum";
    pub const VALUE: &str = "Agent.Value";
    pub const LOG_PROB: &str = "Agent.LogProb";
    pub const ADVANTAGE: &str = "Agent.Advantage";
    pub const ENTROPY: &str = "Agent.Entropy";

    /// `Agent.Action.<index>`
    pub const ACTION_PREFIX: &str = "Agent.Action";

    /// `Agent.Reward.<component>`
    pub const REWARD_COMPONENT_PREFIX: &str = "Agent.Reward";

    // control surfaces
    pub const CONTROL_AILERON: &str = "Agent.Control.Aileron";
    pub const CONTROL_ELEVATOR: &str = "Agent.Control.Elevator";
    pub const CONTROL_RUDDER: &str = "Agent.Control.Rudder";

    // body rates (rad/s)
    pub const ANGULAR_VEL_P: &str = "Agent.AngularVel.P";
    pub const ANGULAR_VEL_Q: &str = "Agent.AngularVel.Q";
    pub const ANGULAR_VEL_R: &str = "Agent.AngularVel.R";

    pub const G_FORCE: &str = "Agent.GForce";

    // episode metadata (only on declaration and termination records)
    pub const EPISODE_ID: &str = "Agent.EpisodeID";
    pub const EPISODE_NUM: &str = "Agent.EpisodeNum";
    pub const SUCCESS: &str = "Agent.Success";
    pub const TERM_REASON: &str = "Agent.TermReason";
    pub const TAGS: &str = "Agent.Tags";

    /// `Agent.Config.<key>`
    pub const CONFIG_PREFIX: &str = "Agent.Config";

    // policy/model versioning
    pub const POLICY: &str = "Agent.Policy";
    pub const POLICY_VER: &str = "Agent.PolicyVer";
    pub const MODEL_SHA: &str = "Agent.ModelSHA";

    pub const EVENT_SEVERITY: &str = "Agent.Event.Severity";

    // hierarchical control
    pub const STRATEGY: &str = "Agent.Strategy";
    pub const PLAN_L1: &str = "Agent.Plan.L1";
    pub const PLAN_L2: &str = "Agent.Plan.L2";
    pub const PLAN_L3: &str = "Agent.Plan.L3";
    pub const PLAN_PATH: &str = "Agent.Plan.Path";

    // uncertainty aware agents
    pub const CONFIDENCE: &str = "Agent.Confidence";
    pub const CONFIDENCE_STD: &str = "Agent.ConfidenceStd";
}

use keys::*;

/// action vector used if a record does not have any indexed action keys
pub const DEFAULT_ACTION: [f64;4] = [0.0, 0.0, 0.0, 0.5];

pub const DEFAULT_G_FORCE: f64 = 1.0;

pub fn is_cam_key (key: &str)->bool {
    key.strip_prefix(NAMESPACE).is_some_and(|rest| rest.starts_with('.'))
}

pub fn canonical_component_name (name: &str)->String {
    name.chars().filter(|c| c.is_alphanumeric()).flat_map(|c| c.to_lowercase()).collect()
}

pub fn action_key (idx: usize)->String { format!("{ACTION_PREFIX}.{idx}") }

pub fn reward_component_key (name: &str)->String {
    format!("{REWARD_COMPONENT_PREFIX}.{}", canonical_component_name(name))
}

pub fn config_key (name: &str)->String { format!("{CONFIG_PREFIX}.{name}") }

fn get_f64 (props: &PropertyMap, key: &str)->Option<f64> {
    props.get(key).and_then(|v| v.as_f64())
}

/* #region RL metrics ******************************************************************************************/

pub fn encode_rl_metrics (m: &RlMetrics)->PropertyMap {
    let mut props = PropertyMap::new();

    props.insert( REWARD_INSTANT.to_string(), m.reward.into());
    props.insert( REWARD_CUM.to_string(), m.cumulative_reward.into());

    for (i,a) in m.action.iter().enumerate() {
        props.insert( action_key(i), (*a).into());
    }

    if let Some(v) = m.value_estimate { props.insert( VALUE.to_string(), v.into()); }
    if let Some(v) = m.policy_logprob { props.insert( LOG_PROB.to_string(), v.into()); }
    if let Some(v) = m.advantage { props.insert( ADVANTAGE.to_string(), v.into()); }
    if let Some(v) = m.entropy { props.insert( ENTROPY.to_string(), v.into()); }

    if let Some(components) = &m.reward_components {
        for (name,v) in components {
            props.insert( reward_component_key(name), (*v).into());
        }
    }

    props
}

pub fn decode_rl_metrics (props: &PropertyMap)->RlMetrics {
    let reward = get_f64( props, REWARD_INSTANT).unwrap_or(0.0);
    let cumulative_reward = get_f64( props, REWARD_CUM).unwrap_or(0.0);

    let mut action: Vec<f64> = Vec::new();
    while let Some(a) = get_f64( props, &action_key(action.len())) {
        action.push(a);
    }
    if action.is_empty() {
        action = DEFAULT_ACTION.to_vec();
    }

    let mut m = RlMetrics::new( reward, cumulative_reward, action);
    m.value_estimate = get_f64( props, VALUE);
    m.policy_logprob = get_f64( props, LOG_PROB);
    m.advantage = get_f64( props, ADVANTAGE);
    m.entropy = get_f64( props, ENTROPY);

    let mut components: IndexMap<String,f64> = IndexMap::new();
    for (key,value) in props {
        if key == REWARD_INSTANT || key == REWARD_CUM { continue }

        if let Some(name) = key.strip_prefix(REWARD_COMPONENT_PREFIX).and_then(|rest| rest.strip_prefix('.')) {
            if let Some(v) = value.as_f64() {
                components.insert( canonical_component_name(name), v);
            } else {
                debug!("ignoring non-numeric reward component {key}={value}");
            }
        }
    }
    if !components.is_empty() {
        m.reward_components = Some(components);
    }

    m
}

/// does the record carry an explicit cumulative reward
pub fn has_cumulative_reward (props: &PropertyMap)->bool {
    get_f64( props, REWARD_CUM).is_some()
}

/* #endregion RL metrics */

/* #region flight state ****************************************************************************************/

pub fn encode_control_surfaces (cs: &ControlSurfaces)->PropertyMap {
    let mut props = PropertyMap::new();
    if let Some(v) = cs.aileron { props.insert( CONTROL_AILERON.to_string(), v.into()); }
    if let Some(v) = cs.elevator { props.insert( CONTROL_ELEVATOR.to_string(), v.into()); }
    if let Some(v) = cs.rudder { props.insert( CONTROL_RUDDER.to_string(), v.into()); }
    props
}

pub fn decode_control_surfaces (props: &PropertyMap)->ControlSurfaces {
    ControlSurfaces {
        aileron: get_f64( props, CONTROL_AILERON),
        elevator: get_f64( props, CONTROL_ELEVATOR),
        rudder: get_f64( props, CONTROL_RUDDER),
    }
}

pub fn encode_angular_velocity (av: &AngularVelocity)->PropertyMap {
    let mut props = PropertyMap::new();
    props.insert( ANGULAR_VEL_P.to_string(), av.p.into());
    props.insert( ANGULAR_VEL_Q.to_string(), av.q.into());
    props.insert( ANGULAR_VEL_R.to_string(), av.r.into());
    props
}

/// note that unlike control surfaces this always returns all axes, missing ones are 0.0
pub fn decode_angular_velocity (props: &PropertyMap)->AngularVelocity {
    AngularVelocity {
        p: get_f64( props, ANGULAR_VEL_P).unwrap_or(0.0),
        q: get_f64( props, ANGULAR_VEL_Q).unwrap_or(0.0),
        r: get_f64( props, ANGULAR_VEL_R).unwrap_or(0.0),
    }
}

pub fn encode_g_force (g: f64)->PropertyMap {
    let mut props = PropertyMap::new();
    props.insert( G_FORCE.to_string(), g.into());
    props
}

pub fn decode_g_force (props: &PropertyMap)->f64 {
    get_f64( props, G_FORCE).unwrap_or(DEFAULT_G_FORCE)
}

/* #endregion flight state */

/* #region episode metadata ************************************************************************************/

/// the episode level fields that could be found in a single record
#[derive(Debug,Clone,Default,PartialEq)]
pub struct EpisodeMetadata {
    pub episode_id: Option<String>,
    pub episode_number: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub config: Option<IndexMap<String,AcmiValue>>,
    pub success: Option<bool>,
    pub termination_reason: Option<String>,
}

impl EpisodeMetadata {
    /// fields set in `other` replace ours
    pub fn merge (&mut self, other: EpisodeMetadata) {
        if other.episode_id.is_some() { self.episode_id = other.episode_id }
        if other.episode_number.is_some() { self.episode_number = other.episode_number }
        if other.tags.is_some() { self.tags = other.tags }
        if other.config.is_some() { self.config = other.config }
        if other.success.is_some() { self.success = other.success }
        if other.termination_reason.is_some() { self.termination_reason = other.termination_reason }
    }
}

/// the properties of the episode start (declaration) record
pub fn encode_episode_metadata (episode: &FlightEpisode)->PropertyMap {
    let mut props = PropertyMap::new();

    props.insert( EPISODE_ID.to_string(), episode.episode_id.as_str().into());
    props.insert( EPISODE_NUM.to_string(), episode.episode_number.into());

    if let Some(tags) = &episode.tags {
        if !tags.is_empty() {
            props.insert( TAGS.to_string(), tags.join(",").into());
        }
    }

    if let Some(config) = &episode.config {
        for (k,v) in config {
            props.insert( config_key(k), v.clone());
        }
    }

    props
}

/// the properties of the episode end record
pub fn encode_episode_termination (episode: &FlightEpisode)->PropertyMap {
    let mut props = PropertyMap::new();
    props.insert( SUCCESS.to_string(), episode.success.into());
    props.insert( TERM_REASON.to_string(), episode.termination_reason.as_str().into());
    props
}

fn unquoted_text (v: &AcmiValue)->String {
    v.to_text().trim().trim_matches('"').to_string()
}

pub fn decode_episode_metadata (props: &PropertyMap)->EpisodeMetadata {
    let mut md = EpisodeMetadata::default();

    md.episode_id = props.get(EPISODE_ID).filter(|v| !v.is_null()).map( unquoted_text);
    md.episode_number = props.get(EPISODE_NUM).and_then(|v| v.as_i64());

    md.tags = props.get(TAGS).filter(|v| !v.is_null()).map( |v| {
        unquoted_text(v).split(',').map(|t| t.trim()).filter(|t| !t.is_empty()).map(|t| t.to_string()).collect()
    });

    let mut config: IndexMap<String,AcmiValue> = IndexMap::new();
    for (key,value) in props {
        if let Some(name) = key.strip_prefix(CONFIG_PREFIX).and_then(|rest| rest.strip_prefix('.')) {
            config.insert( name.to_string(), value.clone());
        }
    }
    if !config.is_empty() {
        md.config = Some(config);
    }

    md.success = props.get(SUCCESS).and_then(|v| v.as_bool());
    md.termination_reason = props.get(TERM_REASON).filter(|v| !v.is_null()).map( unquoted_text);

    md
}

/* #endregion episode metadata */

/* #region policy **********************************************************************************************/

#[derive(Debug,Clone,Default,PartialEq)]
pub struct PolicyInfo {
    pub policy: Option<String>,
    pub version: Option<String>,
    pub model_sha: Option<String>,
}

pub fn encode_policy (info: &PolicyInfo)->PropertyMap {
    let mut props = PropertyMap::new();
    if let Some(s) = &info.policy { props.insert( POLICY.to_string(), s.as_str().into()); }
    if let Some(s) = &info.version { props.insert( POLICY_VER.to_string(), s.as_str().into()); }
    if let Some(s) = &info.model_sha { props.insert( MODEL_SHA.to_string(), s.as_str().into()); }
    props
}

pub fn decode_policy (props: &PropertyMap)->PolicyInfo {
    let text = |key: &str| props.get(key).filter(|v| !v.is_null()).map( unquoted_text);
    PolicyInfo {
        policy: text(POLICY),
        version: text(POLICY_VER),
        model_sha: text(MODEL_SHA),
    }
}

/* #endregion policy */
