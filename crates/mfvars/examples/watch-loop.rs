//! Watch loop example: clear, write once, then poll a handful of variables.
//!
//! Runs against the in-process loopback module, which plays the simulator.
//!
//! Run with:
//!   cargo run --example watch-loop

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mfvars::client::VariableRequests;
use mfvars::transport::LoopbackTransport;

const VARIABLES: [&str; 5] = [
    "(A:GROUND ALTITUDE,Meters)",
    "(A:PLANE ALTITUDE,Feet)",
    // FlyByWire A320
    "(L:A32NX_AUTOPILOT_1_ACTIVE)",
    "(L:A32NX_AUTOPILOT_HEADING_SELECTED)",
    "(L:A32NX_FMA_LATERAL_MODE)",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let transport = Arc::new(
        LoopbackTransport::new()
            .with_value("(A:GROUND ALTITUDE,Meters)", 412.0)
            .with_value("(A:PLANE ALTITUDE,Feet)", 1350.0)
            .with_value("(L:A32NX_AUTOPILOT_1_ACTIVE)", 1.0)
            .with_value("(L:A32NX_AUTOPILOT_HEADING_SELECTED)", 270.0),
    );
    let requests = VariableRequests::connect_fixed(Arc::clone(&transport))?;
    requests.clear()?;

    requests.set("0 (>L:A32NX_COCKPIT_DOOR_LOCKED)")?;

    for tick in 0..5u8 {
        for name in VARIABLES {
            eprintln!("[tick {tick}] {name} = {}", requests.get(name)?);
        }
        // The simulator keeps climbing in the background.
        transport.set_value("(A:PLANE ALTITUDE,Feet)", 1350.0 + 250.0 * f32::from(tick + 1));
        thread::sleep(Duration::from_secs(1));
    }

    Ok(())
}
