use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use clap::{ArgAction, Parser};
use overlink::config::Config;
use overlink::runtime::{LoopbackStack, Session};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Exchange a one-time enrollment token for an identity configuration
/// document.
///
/// Secure defaults:
/// - the document embeds the private key, so it is written 0600 (on Unix)
/// - an existing output file is never overwritten without --force
/// - the token itself is never echoed or logged, only its fingerprint
#[derive(Parser, Debug)]
#[command(
    name = "overlink-enroll",
    version,
    about = "Enroll an overlay identity from a one-time token"
)]
struct Cli {
    /// Path to the enrollment token (JWT)
    #[arg(long)]
    token: PathBuf,

    /// Output identity document path
    #[arg(long, default_value = "identity/identity.json")]
    out: PathBuf,

    /// Optional path to config file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Overwrite the output file if it exists
    #[arg(long, action = ArgAction::SetTrue)]
    force: bool,
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
        #[cfg(unix)]
        {
            // 0755 for directories
            let perm = fs::Permissions::from_mode(0o755);
            fs::set_permissions(parent, perm).ok();
        }
    }
    Ok(())
}

fn write_file(path: &Path, contents: &[u8], mode: u32, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} exists; use --force to overwrite", path.display()),
        ));
    }
    ensure_parent(path)?;
    let mut f = File::create(path)?;
    f.write_all(contents)?;
    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(mode);
        fs::set_permissions(path, perm)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(cli.config.as_deref())?;
    overlink::events::init_events_from_config(config.logging.as_ref());

    let stack = Arc::new(LoopbackStack::new()?);
    let session = Session::init(stack, &config)?;

    let (tx, rx) = mpsc::channel();
    session.enroll(&cli.token.to_string_lossy(), move |result| {
        let _ = tx.send(result);
    })?;

    // Pump the mailbox until the completion lands.
    let mut result = None;
    for _ in 0..600 {
        session.process_next(Duration::from_millis(100));
        if let Ok(r) = rx.try_recv() {
            result = Some(r);
            break;
        }
    }
    let result = match result {
        Some(r) => r,
        None => anyhow::bail!("enrollment timed out"),
    };

    match result {
        Ok(json) => {
            write_file(&cli.out, json.as_bytes(), 0o600, cli.force)?;
            println!("✅ Enrolled identity");
            println!("  out: {}", cli.out.display());
            println!(
                "\nAdd to overlink.toml (example):\nidentity = \"{}\"\n",
                cli.out.display()
            );
            Ok(())
        }
        Err(failure) => anyhow::bail!("enrollment failed: {}", failure),
    }
}
