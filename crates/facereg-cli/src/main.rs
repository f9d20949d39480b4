use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use facereg_core::{DetectionResult, Face, InMemoryRegistry, Rect, Session, TargetRegion, DEFAULT_TOLERANCE};
use facereg_store::SqliteRegistry;
use std::io::BufReader;
use std::path::PathBuf;

mod replay;

// `#[zbus::proxy]` generates `FaceRegProxy` (async) and `FaceRegProxyBlocking`.
#[zbus::proxy(
    interface = "org.freedesktop.FaceReg1",
    default_service = "org.freedesktop.FaceReg1",
    default_path = "/org/freedesktop/FaceReg1"
)]
trait FaceReg {
    async fn start_scan(&self) -> zbus::Result<String>;
    async fn detection_tick(&self, detection: &str) -> zbus::Result<String>;
    async fn submit_name(&self, name: &str) -> zbus::Result<String>;
    async fn cancel(&self) -> zbus::Result<String>;
    async fn state(&self) -> zbus::Result<String>;
    async fn list_faces(&self) -> zbus::Result<String>;
    async fn remove_face(&self, face_id: &str) -> zbus::Result<bool>;
    async fn status(&self) -> zbus::Result<String>;
}

#[derive(Parser)]
#[command(name = "facereg", about = "facereg face registration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reset the session and start scanning
    Scan,
    /// Send one frame's detection to the daemon
    Tick {
        /// Face identifier reported by the detector
        #[arg(long, required_unless_present = "none")]
        face_id: Option<String>,
        #[arg(long, default_value_t = 0.0)]
        x: f32,
        #[arg(long, default_value_t = 0.0)]
        y: f32,
        #[arg(long, default_value_t = 0.0)]
        width: f32,
        #[arg(long, default_value_t = 0.0)]
        height: f32,
        /// Send an empty frame (no face detected)
        #[arg(long, conflicts_with = "face_id")]
        none: bool,
    },
    /// Name the face awaiting registration
    Name {
        text: String,
    },
    /// Dismiss the name dialog
    Cancel,
    /// Show the current session state
    State,
    /// List registered faces
    List,
    /// Remove a registered face
    Remove {
        /// Face ID to remove
        face_id: String,
    },
    /// Show daemon status
    Status,
    /// Replay a JSON-lines event file through a local session (no daemon)
    Replay {
        /// Event file, one JSON event per line
        file: PathBuf,
        /// Viewport size the target region is centered in
        #[arg(long, default_value = "1080x1920", value_parser = parse_viewport)]
        viewport: (f32, f32),
        /// Explicit target region `x,y,width,height` (overrides --viewport)
        #[arg(long, value_parser = parse_rect)]
        target: Option<Rect>,
        #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f32,
        /// Persist registrations to this SQLite database instead of memory
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn parse_viewport(s: &str) -> Result<(f32, f32), String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let parse = |v: &str| v.trim().parse::<f32>().map_err(|e| format!("{v:?}: {e}"));
    Ok((parse(w)?, parse(h)?))
}

fn parse_rect(s: &str) -> Result<Rect, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f32>().map_err(|e| format!("{v:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        [x, y, width, height] => Ok(Rect::new(*x, *y, *width, *height)),
        _ => Err(format!("expected x,y,width,height, got {s:?}")),
    }
}

fn print_json(raw: &str) -> Result<()> {
    let value: serde_json::Value = serde_json::from_str(raw).context("daemon returned invalid JSON")?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn proxy() -> Result<FaceRegProxy<'static>> {
    let conn = zbus::Connection::session()
        .await
        .context("connecting to the session bus")?;
    let proxy = FaceRegProxy::new(&conn)
        .await
        .context("faceregd is not reachable")?;
    Ok(proxy)
}

fn run_replay(
    file: PathBuf,
    target: TargetRegion,
    tolerance: f32,
    db: Option<PathBuf>,
) -> Result<()> {
    let input = std::fs::File::open(&file)
        .with_context(|| format!("opening {}", file.display()))?;
    let input = BufReader::new(input);
    let mut stdout = std::io::stdout().lock();

    let summary = match db {
        Some(path) => {
            let registry = SqliteRegistry::open(&path)
                .with_context(|| format!("opening registry at {}", path.display()))?;
            let mut session = Session::new(target, registry).with_tolerance(tolerance);
            replay::replay(&mut session, input, &mut stdout)?
        }
        None => {
            let mut session = Session::new(target, InMemoryRegistry::new()).with_tolerance(tolerance);
            replay::replay(&mut session, input, &mut stdout)?
        }
    };

    eprintln!(
        "replayed {} events ({} rejected)",
        summary.events, summary.rejected
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan => print_json(&proxy().await?.start_scan().await?)?,
        Commands::Tick {
            face_id,
            x,
            y,
            width,
            height,
            none,
        } => {
            let detection = match (none, face_id) {
                (true, _) => DetectionResult::empty(),
                (false, Some(id)) => DetectionResult::single(Face::new(id, Rect::new(x, y, width, height))),
                (false, None) => bail!("either --face-id or --none is required"),
            };
            let json = serde_json::to_string(&detection)?;
            print_json(&proxy().await?.detection_tick(&json).await?)?;
        }
        Commands::Name { text } => print_json(&proxy().await?.submit_name(&text).await?)?,
        Commands::Cancel => print_json(&proxy().await?.cancel().await?)?,
        Commands::State => print_json(&proxy().await?.state().await?)?,
        Commands::List => {
            let raw = proxy().await?.list_faces().await?;
            let faces: Vec<facereg_core::Registration> = serde_json::from_str(&raw)?;
            if faces.is_empty() {
                println!("No faces registered");
            }
            for face in faces {
                println!(
                    "{}\t{}\t{}",
                    face.face_id,
                    face.name,
                    face.registered_at.to_rfc3339()
                );
            }
        }
        Commands::Remove { face_id } => {
            if proxy().await?.remove_face(&face_id).await? {
                println!("Removed {face_id}");
            } else {
                println!("No registration for {face_id}");
            }
        }
        Commands::Status => print_json(&proxy().await?.status().await?)?,
        Commands::Replay {
            file,
            viewport,
            target,
            tolerance,
            db,
        } => {
            let target = target
                .map(TargetRegion::new)
                .unwrap_or_else(|| TargetRegion::centered(viewport.0, viewport.1));
            run_replay(file, target, tolerance, db)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_viewport() {
        assert_eq!(parse_viewport("1080x1920"), Ok((1080.0, 1920.0)));
        assert!(parse_viewport("1080").is_err());
        assert!(parse_viewport("axb").is_err());
    }

    #[test]
    fn test_parse_rect() {
        assert_eq!(parse_rect("100, 100,200,300"), Ok(Rect::new(100.0, 100.0, 200.0, 300.0)));
        assert!(parse_rect("1,2,3").is_err());
    }

    #[test]
    fn test_tick_requires_face_or_none() {
        assert!(Cli::try_parse_from(["facereg", "tick"]).is_err());
        assert!(Cli::try_parse_from(["facereg", "tick", "--none"]).is_ok());
        assert!(Cli::try_parse_from(["facereg", "tick", "--face-id", "f1", "--x", "10"]).is_ok());
    }
}
