use std::io::{Read, Write};
use std::net::Shutdown;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use clap::Parser;
use overlink::config::Config;
use overlink::constants::ICON_PLACEHOLDER;
use overlink::runtime::{LoopbackStack, Session};

/// Dial an overlay service and exchange a probe payload over the resulting
/// socket. Runs against the in-memory loopback backend with an echo service
/// registered under the requested name.
#[derive(Parser, Debug)]
#[command(
    name = "overlink-probe",
    version,
    about = "Dial an overlay service and exchange a probe payload"
)]
struct Cli {
    /// Service name to dial
    #[arg(long, default_value = "echo")]
    service: String,

    /// Optional terminator identity (selects a backend instance)
    #[arg(long)]
    terminator: Option<String>,

    /// Probe payload
    #[arg(long, default_value = "overlink-probe")]
    payload: String,

    /// Optional path to config file (TOML)
    #[arg(short, long)]
    config: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(cli.config.as_deref())?;
    overlink::events::init_events_from_config(config.logging.as_ref());

    let stack = Arc::new(LoopbackStack::new()?);
    stack.register_echo_service(&cli.service);
    let session = Session::init(stack, &config)?;
    println!("{}SDK: {}", ICON_PLACEHOLDER, session.sdk_version());

    let (tx, rx) = mpsc::channel();
    session.connect(&cli.service, cli.terminator.as_deref(), move |result| {
        let _ = tx.send(result);
    })?;

    let mut result = None;
    for _ in 0..100 {
        session.process_next(Duration::from_millis(100));
        if let Ok(r) = rx.try_recv() {
            result = Some(r);
            break;
        }
    }
    let socket = match result {
        Some(Ok(socket)) => socket,
        Some(Err(failure)) => anyhow::bail!("dial failed: {}", failure),
        None => anyhow::bail!("dial timed out"),
    };

    let mut socket = socket;
    socket.write_all(cli.payload.as_bytes())?;
    socket.shutdown(Shutdown::Write)?;
    let mut echoed = Vec::new();
    socket.read_to_end(&mut echoed)?;

    println!(
        "{}sent {} byte(s), received {} byte(s)",
        ICON_PLACEHOLDER,
        cli.payload.len(),
        echoed.len()
    );
    println!("{}reply: {}", ICON_PLACEHOLDER, String::from_utf8_lossy(&echoed));
    Ok(())
}
