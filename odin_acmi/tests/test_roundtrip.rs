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

use std::fs;
use indexmap::IndexMap;
use odin_acmi::{AcmiConverter, AcmiParser, AcmiValue, OriginPolicy, object_id_for_agent};
use odin_acmi::geo::{self, CartesianPoint, GeodeticPoint, Velocity, DEFAULT_ORIGIN};
use odin_acmi::trajectory::*;

/// episode -> ACMI text -> episode conversion tests
/// run with "cargo test --test test_roundtrip -- --nocapture"

const N_POINTS: usize = 25;

fn data_point (i: usize)->FlightDataPoint {
    let t = i as f64 * 0.1;
    let yaw = 45.0 + i as f64;
    let pitch = 2.0;
    let airspeed = 60.0 + i as f64 * 0.5;

    let mut components = IndexMap::new();
    components.insert( "altitude_hold".to_string(), 0.1 * i as f64);
    components.insert( "heading".to_string(), -0.05);

    let mut rl = RlMetrics::new( 0.5, 0.5 * (i+1) as f64, vec![0.1, -0.2, 0.3 * (i % 3) as f64, 0.8]);
    rl.value_estimate = Some( 12.0 - i as f64 * 0.1);
    rl.policy_logprob = Some(-1.5);
    rl.reward_components = Some(components);

    FlightDataPoint {
        timestamp: t,
        step: i,
        position: CartesianPoint::new( 100.0 * i as f64, 50.0 * i as f64, 300.0 + i as f64),
        orientation: Some( Orientation { roll: 10.0, pitch, yaw }),
        velocity: geo::velocity_from_airspeed( airspeed, pitch, yaw),
        angular_velocity: Some( AngularVelocity { p: 0.01, q: -0.02, r: 0.03 }),
        telemetry: Telemetry {
            airspeed,
            altitude: 1000.0 + i as f64,
            g_force: 1.0 + 0.01 * i as f64,
            throttle: 0.75,
            aoa: if i % 2 == 0 { 3.25 } else { 0.004 },
            aos: 0.0,
            heading: yaw,
            vertical_speed: 0.0,
            turn_rate: 0.0,
            bank_angle: 10.0,
            aileron: Some(0.05),
            elevator: Some(-0.1),
            rudder: None,
        },
        rl_metrics: Some(rl),
        events: None,
    }
}

fn episode ()->FlightEpisode {
    let mut config = IndexMap::new();
    config.insert( "policy".to_string(), AcmiValue::from("PPO"));
    config.insert( "seed".to_string(), AcmiValue::Int(42));
    config.insert( "deterministic".to_string(), AcmiValue::Bool(true));

    let mut trajectory: Vec<FlightDataPoint> = (0..N_POINTS).map( data_point).collect();
    trajectory[5].events = Some( vec![
        FlightEvent { timestamp: 0.5, event_type: "Checkpoint".into(), severity: "warning".into(), message: "gate 1".into(), metadata: None }
    ]);

    FlightEpisode {
        episode_id: "ep_0042".to_string(),
        agent_id: "agent_7".to_string(),
        episode_number: 42,
        start_time: 0.0,
        duration: (N_POINTS-1) as f64 * 0.1,
        total_steps: N_POINTS,
        total_reward: 0.5 * N_POINTS as f64,
        success: false,
        termination_reason: "altitude_violation".to_string(),
        trajectory,
        config: Some(config),
        tags: Some( vec!["sim".to_string(), "eval".to_string()]),
    }
}

fn close (a: f64, b: f64, eps: f64)->bool { (a - b).abs() <= eps }

#[test]
fn test_episode_roundtrip () {
    let origin = GeodeticPoint::new( 37.0, -122.0, 10.0);
    let converter = AcmiConverter::with_origin( origin);

    let ep1 = episode();
    let text = converter.episode_to_document( &ep1, None).unwrap();

    let output = AcmiParser::new().parse_str( &text).unwrap();
    assert!( output.diagnostics.is_empty());

    let episodes = converter.document_to_episodes( &output.document);
    assert_eq!( episodes.len(), 1);
    let ep2 = &episodes[0];

    println!("-- episode level");
    assert_eq!( ep2.trajectory.len(), ep1.trajectory.len());
    assert_eq!( ep2.total_steps, N_POINTS);
    assert_eq!( ep2.episode_id, ep1.episode_id);
    assert_eq!( ep2.agent_id, ep1.agent_id);
    assert_eq!( ep2.episode_number, 42);
    assert_eq!( ep2.success, false);
    assert_eq!( ep2.termination_reason, "altitude_violation");
    assert_eq!( ep2.tags, ep1.tags);
    assert_eq!( ep2.config, ep1.config);
    assert!( close( ep2.start_time, 0.0, 1e-9));
    assert!( close( ep2.duration, ep1.duration, 1e-3));
    assert!( close( ep2.total_reward, ep1.total_reward, 1e-6));

    println!("-- data points");
    for (a,b) in ep1.trajectory.iter().zip( ep2.trajectory.iter()) {
        assert_eq!( a.step, b.step);
        assert!( close( a.timestamp, b.timestamp, 1e-3));

        assert!( close( a.position.x, b.position.x, 0.05));
        assert!( close( a.position.y, b.position.y, 0.05));
        assert!( close( a.position.z, b.position.z, 0.01));

        let (oa, ob) = (a.orientation.unwrap(), b.orientation.unwrap());
        assert!( close( oa.roll, ob.roll, 0.005) && close( oa.pitch, ob.pitch, 0.005) && close( oa.yaw, ob.yaw, 0.005));

        let (ta, tb) = (&a.telemetry, &b.telemetry);
        assert!( close( ta.airspeed, tb.airspeed, 0.005));
        assert!( close( ta.throttle, tb.throttle, 0.0005));
        assert!( close( ta.g_force, tb.g_force, 1e-6));
        assert!( close( ta.aoa, tb.aoa, 0.01));
        assert!( close( ta.heading, tb.heading, 0.005));
        assert!( close( ta.bank_angle, tb.bank_angle, 0.005));
        assert_eq!( tb.aileron, Some(0.05));
        assert_eq!( tb.elevator, Some(-0.1));
        assert_eq!( tb.rudder, None);

        let av = b.angular_velocity.unwrap();
        assert!( close( av.p, 0.01, 1e-6) && close( av.q, -0.02, 1e-6) && close( av.r, 0.03, 1e-6));

        // velocity is re-derived from airspeed, pitch and heading
        assert!( close( a.velocity.magnitude(), b.velocity.magnitude(), 0.01));

        let (ma, mb) = (a.rl_metrics.as_ref().unwrap(), b.rl_metrics.as_ref().unwrap());
        assert!( close( ma.reward, mb.reward, 1e-6));
        assert!( close( ma.cumulative_reward, mb.cumulative_reward, 1e-6));
        assert_eq!( ma.action.len(), mb.action.len());
        for (x,y) in ma.action.iter().zip( mb.action.iter()) { assert!( close( *x, *y, 1e-6)) }
        assert!( close( ma.value_estimate.unwrap(), mb.value_estimate.unwrap(), 1e-6));
        assert_eq!( mb.policy_logprob, Some(-1.5));
        assert_eq!( mb.advantage, None);

        let rc = mb.reward_components.as_ref().unwrap();
        assert_eq!( rc.len(), 2);
        assert!( close( rc["altitudehold"], ma.reward_components.as_ref().unwrap()["altitude_hold"], 1e-6));
        assert!( close( rc["heading"], -0.05, 1e-6));
    }

    println!("-- events");
    let events = ep2.trajectory[5].events.as_ref().unwrap();
    assert_eq!( events.len(), 1);
    assert_eq!( events[0].event_type, "Checkpoint");
    assert_eq!( events[0].severity, "warning");
    assert_eq!( events[0].message, "gate 1");
    assert!( ep2.trajectory.iter().enumerate().all( |(i,dp)| i == 5 || dp.events.is_none()));
    println!("✅");
}

#[test]
fn test_auto_origin () {
    let ep1 = episode();
    let origin = GeodeticPoint::new( 47.5, 8.5, 400.0);

    // write with one origin, read back with an automatically derived one
    let text = AcmiConverter::with_origin( origin).episode_to_document( &ep1, None).unwrap();
    let output = AcmiParser::new().parse_str( &text).unwrap();

    let converter = AcmiConverter::default();
    assert_eq!( converter.origin_policy(), OriginPolicy::AutoFromFirstSample);

    let auto_origin = converter.resolve_origin( &output.document).unwrap();
    println!("derived origin: {auto_origin}");
    assert!( close( auto_origin.lat, origin.lat, 1e-6));
    assert!( close( auto_origin.lon, origin.lon, 1e-6));
    assert!( close( auto_origin.alt, origin.alt + 300.0, 0.01));

    let ep2 = &converter.document_to_episodes( &output.document)[0];
    let p0 = ep2.trajectory[0].position;
    assert!( p0.x.abs() < 1e-6 && p0.y.abs() < 1e-6 && p0.z.abs() < 1e-6);

    // relative positions are preserved
    let p = ep2.trajectory[10].position;
    assert!( close( p.x, 1000.0, 0.1) && close( p.y, 500.0, 0.1) && close( p.z, 10.0, 0.01));
}

#[test]
fn test_origin_override () {
    let ep = episode();
    let converter = AcmiConverter::with_origin( GeodeticPoint::new( 10.0, 10.0, 0.0));

    let text = converter.episode_to_document( &ep, Some(DEFAULT_ORIGIN)).unwrap();
    let output = AcmiParser::new().parse_str( &text).unwrap();
    let r = output.document.objects.values().next().unwrap().iter().find(|r| r.has_position()).unwrap();

    assert!( close( r.get_f64("Latitude").unwrap(), DEFAULT_ORIGIN.lat, 1e-7));
    assert!( close( r.get_f64("Longitude").unwrap(), DEFAULT_ORIGIN.lon, 1e-7));
}

const HEADER: &str = "FileType=text/acmi/tacview\nFileVersion=2.2\n\n";

#[test]
fn test_cumulative_reward () {
    let input = format!("{HEADER}{}", concat!(
        "#0\n",
        "a1,T=-117.9|34.9|1000,Agent.Reward.Instant=1.0\n",
        "#1\n",
        "a1,T=-117.9|34.9|1000,Agent.Reward.Instant=2.0\n",
        "#2\n",
        "a1,T=-117.9|34.9|1000,Agent.Reward.Instant=0.5,Agent.Reward.Cum=10.0\n",
        "#3\n",
        "a1,T=-117.9|34.9|1000,Agent.Reward.Instant=1.5\n",
    ));
    let output = AcmiParser::new().parse_str( &input).unwrap();
    let ep = &AcmiConverter::default().document_to_episodes( &output.document)[0];

    let cum: Vec<f64> = ep.trajectory.iter().map( |dp| dp.rl_metrics.as_ref().unwrap().cumulative_reward).collect();
    println!("cumulative rewards: {:?}", cum);
    assert_eq!( cum, vec![1.0, 3.0, 10.0, 11.5]);
    assert_eq!( ep.total_reward, 11.5);
}

#[test]
fn test_foreign_document () {
    // records without metadata, partial transforms and a metadata-only object
    let input = format!("{HEADER}{}", concat!(
        "0,ReferenceTime=2024-06-01T08:00:00Z\n",
        "#10\n",
        "b2,Name=\"Viper 1\",Type=Air+FixedWing\n",
        "b2,T=-117.9|34.9|2000|5|-3||,IAS=200\n",
        "c3,Type=Ground+Static+Building,Name=\"Tower\"\n",
        "#11\n",
        "b2,T=||2100,Heading=270\n",
        "#12.5\n",
        "b2,T=-117.89|34.91|2200|0|0|180\n",
        "0,Event=Destroyed|b2|\n",
    ));
    let output = AcmiParser::new().parse_str( &input).unwrap();
    assert!( output.diagnostics.is_empty());

    let episodes = AcmiConverter::default().document_to_episodes( &output.document);
    assert_eq!( episodes.len(), 1); // the static object has no positions

    let ep = &episodes[0];
    println!("{:?}", ep.trajectory[1]);
    assert_eq!( ep.agent_id, "Viper 1");
    assert_eq!( ep.episode_id, "acmi_b2");
    assert_eq!( ep.episode_number, 0);
    assert!( ep.success);
    assert_eq!( ep.termination_reason, "completed");
    assert_eq!( ep.trajectory.len(), 3);
    assert_eq!( ep.start_time, 10.0);
    assert_eq!( ep.duration, 2.5);
    assert!( ep.config.is_none() && ep.tags.is_none());

    let dp0 = &ep.trajectory[0];
    assert_eq!( dp0.telemetry.airspeed, 200.0);
    assert_eq!( dp0.telemetry.throttle, 0.5);
    assert_eq!( dp0.telemetry.g_force, 1.0);
    assert_eq!( dp0.orientation.unwrap().roll, 5.0);
    assert_eq!( dp0.rl_metrics.as_ref().unwrap().action, vec![0.0, 0.0, 0.0, 0.5]);

    // missing transform fields carry over, yaw falls back to heading
    let dp1 = &ep.trajectory[1];
    assert!( dp1.position.x.abs() < 1e-6 && dp1.position.y.abs() < 1e-6);
    assert!( close( dp1.position.z, 100.0, 1e-9));
    let o1 = dp1.orientation.unwrap();
    assert_eq!( (o1.roll, o1.pitch, o1.yaw), (5.0, -3.0, 270.0));
    assert_eq!( dp1.telemetry.heading, 270.0);
    assert_eq!( dp1.telemetry.bank_angle, 5.0);

    let events = ep.trajectory[2].events.as_ref().unwrap();
    assert_eq!( events[0].event_type, "Destroyed");
    assert_eq!( events[0].severity, "info");
    assert_eq!( events[0].message, "");
}

#[test]
fn test_partial_transforms () {
    let input = format!("{HEADER}{}", concat!(
        "#0\n",
        "a1,T=-117.88|34.91|1000|0|5|90,IAS=50,Agent.Reward.Instant=1\n",
        "#1\n",
        "a1,T=|||10.0|6.0|95.0,IAS=51,Agent.Reward.Instant=1\n",   // attitude only
        "#2\n",
        "a1,T=-117.87||,IAS=52,Agent.Reward.Instant=1\n",           // longitude only
        "#3\n",
        "a1,Agent.Success=false\n",                                   // no transform
    ));
    let output = AcmiParser::new().parse_str( &input).unwrap();
    assert!( output.diagnostics.is_empty());

    let ep = &AcmiConverter::default().document_to_episodes( &output.document)[0];
    for dp in &ep.trajectory { println!("t={} orientation={:?} ias={}", dp.timestamp, dp.orientation, dp.telemetry.airspeed) }

    assert_eq!( ep.trajectory.len(), 3);
    assert_eq!( ep.success, false);
    assert_eq!( ep.total_reward, 3.0);

    let dp1 = &ep.trajectory[1];
    assert_eq!( dp1.timestamp, 1.0);
    assert_eq!( dp1.telemetry.airspeed, 51.0);
    assert_eq!( dp1.orientation, Some( Orientation { roll: 10.0, pitch: 6.0, yaw: 95.0 }));
    assert!( dp1.position.x.abs() < 1e-6 && dp1.position.y.abs() < 1e-6 && dp1.position.z.abs() < 1e-6);

    // attitude carries over, velocity follows the carried heading
    let dp2 = &ep.trajectory[2];
    assert_eq!( dp2.orientation, Some( Orientation { roll: 10.0, pitch: 6.0, yaw: 95.0 }));
    assert_eq!( dp2.telemetry.heading, 95.0);
    assert!( dp2.velocity.vx > 0.0);
    assert!( dp2.position.x > 0.0 && dp2.position.y.abs() < 1e-6);
}

#[test]
fn test_event_message_with_separator () {
    let mut ep = episode();
    ep.trajectory[3].events = Some( vec![
        FlightEvent { timestamp: 0.3, event_type: "Message".into(), severity: "info".into(), message: "phase 2|gate 3".into(), metadata: None }
    ]);

    let converter = AcmiConverter::with_origin( DEFAULT_ORIGIN);
    let text = converter.episode_to_document( &ep, None).unwrap();
    let output = AcmiParser::new().parse_str( &text).unwrap();
    let ep2 = &converter.document_to_episodes( &output.document)[0];

    let events = ep2.trajectory[3].events.as_ref().unwrap();
    println!("{:?}", events);
    assert_eq!( events[0].event_type, "Message");
    assert_eq!( events[0].message, "phase 2|gate 3");
}

#[test]
fn test_empty_document () {
    let output = AcmiParser::new().parse_str( HEADER).unwrap();
    assert!( AcmiConverter::default().document_to_episodes( &output.document).is_empty());
    assert!( AcmiConverter::default().resolve_origin( &output.document).is_none());
}

#[test]
fn test_file_roundtrip () {
    let dir = std::env::temp_dir().join("odin_acmi_test_file_roundtrip");
    if dir.is_dir() { fs::remove_dir_all(&dir).unwrap() }

    let ep1 = episode();
    let converter = AcmiConverter::with_origin( DEFAULT_ORIGIN);
    let path = converter.episode_to_file( &ep1, dir.join("flight"), None).unwrap();
    assert!( path.to_string_lossy().ends_with("flight.txt.acmi"));

    let result = converter.file_to_episodes( &path).unwrap();
    assert!( result.diagnostics.is_empty());
    assert_eq!( result.origin, Some(DEFAULT_ORIGIN));
    assert_eq!( result.episodes.len(), 1);
    assert_eq!( result.episodes[0].trajectory.len(), N_POINTS);

    // trajectories can be stored as JSON by ingestion components
    let json = serde_json::to_string( &result.episodes[0]).unwrap();
    assert!( !json.contains("\"rudder\""));
    let ep3: FlightEpisode = serde_json::from_str( &json).unwrap();
    assert_eq!( ep3.trajectory.len(), N_POINTS);
    assert_eq!( ep3.config, result.episodes[0].config);
    assert_eq!( ep3.trajectory[5].events, result.episodes[0].trajectory[5].events);

    fs::remove_dir_all(&dir).unwrap();
}
