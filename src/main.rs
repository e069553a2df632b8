use clap::Parser;
use formpilot::mapping::Profile;
use formpilot::session::SessionEvent;
use formpilot::{ChromeBrowser, Config, FormSession, GeminiClient, SessionPhase};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

/// Minimal shell around the automation core: starts a session against a
/// target form and forwards stdin commands to the control surface.
#[derive(Parser)]
#[command(name = "formpilot", about = "AI-assisted web form completion")]
struct Args {
    /// Target form URL
    url: String,

    /// Path to a JSON file with flat profile key/value pairs
    #[arg(long)]
    profile: std::path::PathBuf,

    /// Extra free-text instruction forwarded to the model
    #[arg(long)]
    instruction: Option<String>,

    /// Attach to a running Chromium over this CDP WebSocket URL instead
    /// of launching a browser
    #[arg(long)]
    attach: Option<String>,

    /// Run the launched browser with a visible window
    #[arg(long)]
    headed: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let profile: Profile = serde_json::from_str(&std::fs::read_to_string(&args.profile)?)?;
    info!(entries = profile.len(), "profile loaded");

    let mut config = Config::default();
    config.browser.headless = !args.headed;
    config.browser.attach_ws_url = args.attach.clone();

    let client = GeminiClient::new(&config.ai)?;
    let (mut session, mut events) =
        FormSession::new(ChromeBrowser::new(), client, profile, config);

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::StatusUpdate {
                    message,
                    progress_percent,
                    needs_approval,
                } => {
                    if needs_approval {
                        warn!(progress = progress_percent, "{} (action required)", message);
                    } else {
                        info!(progress = progress_percent, "{}", message);
                    }
                }
                SessionEvent::FormPreview { mapping } => {
                    info!("mapping preview: {} fields", mapping.fields.len());
                    for field in &mapping.fields {
                        info!(
                            "  {} -> {:?} ({:?})",
                            field.field_label, field.value, field.confidence
                        );
                    }
                }
                SessionEvent::CaptchaDetected { kind, message } => {
                    warn!(?kind, "{}", message);
                }
                SessionEvent::OtpRequired { hint } => {
                    warn!(?hint, "one-time code required");
                }
            }
        }
    });

    if let Err(err) = session.start(&args.url, args.instruction.as_deref()).await {
        error!("start failed: {}", err);
        return Ok(());
    }

    println!("commands: submit | resume | otp <code> | stop");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let result = if line == "submit" {
            session.final_submit().await
        } else if line == "resume" {
            session.resume_after_human().await
        } else if let Some(code) = line.strip_prefix("otp ") {
            session.submit_otp(code.trim()).await
        } else if line == "stop" {
            session.stop().await
        } else {
            println!("unknown command: {}", line);
            continue;
        };

        if let Err(err) = result {
            error!("{}", err);
        }
        if session.phase() == SessionPhase::Idle {
            break;
        }
    }

    Ok(())
}
