//! Play a feedback event and watch its lifecycle.
//!
//! Requires a running feedback daemon on the session bus:
//!
//! ```text
//! cargo run --example play_event
//! RUST_LOG=debug cargo run --example play_event
//! ```

use std::time::Duration;

use ngf_client::{Client, ClientEvent, Proplist};
use zbus::zvariant::{OwnedValue, Value};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = match Client::new() {
        Ok(client) => client,
        Err(err) => {
            eprintln!("client setup failed: {err}");
            return;
        }
    };

    if !client.connect() {
        eprintln!("feedback daemon unreachable");
        return;
    }

    let mut properties = Proplist::new();
    if let Ok(volume) = OwnedValue::try_from(Value::from(5_i32)) {
        properties.insert("sound.volume".to_owned(), volume);
    }

    let id = client.play_with_properties("ringtone", properties);
    if id == 0 {
        eprintln!("play rejected");
        return;
    }
    println!("playing event {id}");

    for event in client.events().timeout_iter(Duration::from_secs(10)) {
        println!("{event:?}");
        match event {
            ClientEvent::Completed { client_id } | ClientEvent::Failed { client_id }
                if client_id == id =>
            {
                return;
            }
            _ => {}
        }
    }

    // Still going after the deadline; stop it ourselves.
    client.stop(id);
}
