use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use screening_core::model::LanguageCode;
use services::{
    ApiConfig, AppServices, Clock, DEFAULT_IDLE_TIMEOUT_SECS, InMemoryScreeningApi,
    RegistrationService, ScreeningFlowService,
};
use storage::PersistentStore;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use ui::{App, UiApp, WebviewTrap, build_app_context};

const DEFAULT_API_URL: &str = "http://localhost:8080/api/";
const DEFAULT_PROFILE_DIR: &str = "profile";
const API_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidIdleTimeout { raw: String },
    Invalid(screening_core::Error),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidIdleTimeout { raw } => {
                write!(f, "invalid --idle-timeout value: {raw}")
            }
            ArgsError::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct DesktopApp {
    services: AppServices,
    trap: Arc<WebviewTrap>,
    language: LanguageCode,
}

impl UiApp for DesktopApp {
    fn flow(&self) -> Arc<ScreeningFlowService> {
        self.services.flow()
    }

    fn registration(&self) -> Arc<RegistrationService> {
        self.services.registration()
    }

    fn navigation_trap(&self) -> Arc<WebviewTrap> {
        Arc::clone(&self.trap)
    }

    fn language(&self) -> LanguageCode {
        self.language.clone()
    }
}

#[derive(Debug)]
struct Args {
    api_url: String,
    profile_dir: PathBuf,
    language: LanguageCode,
    idle_timeout_secs: i64,
    offline: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- [--api <url>] [--profile <dir>] [--lang <code>] [--idle-timeout <secs>] [--offline]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --api {DEFAULT_API_URL}");
    eprintln!("  --profile ./{DEFAULT_PROFILE_DIR}");
    eprintln!("  --lang en");
    eprintln!("  --idle-timeout {DEFAULT_IDLE_TIMEOUT_SECS}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!(
        "  SCREENING_API_URL, SCREENING_PROFILE_DIR, SCREENING_LANG, SCREENING_IDLE_TIMEOUT_SECS"
    );
    eprintln!("  SCREENING_LOG_JSON=1 for JSON logs, RUST_LOG for the filter");
}

fn parse_idle_timeout(raw: String) -> Result<i64, ArgsError> {
    let secs = match raw.trim().parse::<i64>() {
        Ok(secs) if secs > 0 => secs,
        _ => return Err(ArgsError::InvalidIdleTimeout { raw }),
    };
    // Must also fit a chrono duration in milliseconds.
    match chrono::Duration::try_seconds(secs) {
        Some(_) => Ok(secs),
        None => Err(ArgsError::InvalidIdleTimeout { raw }),
    }
}

fn parse_language(raw: &str) -> Result<LanguageCode, ArgsError> {
    LanguageCode::parse(raw).map_err(|err| ArgsError::Invalid(err.into()))
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut api_url =
            std::env::var("SCREENING_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let mut profile_dir = std::env::var("SCREENING_PROFILE_DIR")
            .map_or_else(|_| PathBuf::from(DEFAULT_PROFILE_DIR), PathBuf::from);
        let mut language = match std::env::var("SCREENING_LANG") {
            Ok(raw) => parse_language(&raw)?,
            Err(_) => LanguageCode::default(),
        };
        let mut idle_timeout_secs = match std::env::var("SCREENING_IDLE_TIMEOUT_SECS") {
            Ok(raw) => parse_idle_timeout(raw)?,
            Err(_) => DEFAULT_IDLE_TIMEOUT_SECS,
        };
        let mut offline = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => api_url = require_value(args, "--api")?,
                "--profile" => profile_dir = PathBuf::from(require_value(args, "--profile")?),
                "--lang" => language = parse_language(&require_value(args, "--lang")?)?,
                "--idle-timeout" => {
                    idle_timeout_secs = parse_idle_timeout(require_value(args, "--idle-timeout")?)?;
                }
                "--offline" => offline = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            api_url,
            profile_dir,
            language,
            idle_timeout_secs,
            offline,
        })
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_flag("SCREENING_LOG_JSON") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();

    let clock = Clock::default();
    let idle_timeout = chrono::Duration::try_seconds(args.idle_timeout_secs).ok_or_else(|| {
        ArgsError::InvalidIdleTimeout {
            raw: args.idle_timeout_secs.to_string(),
        }
    })?;
    let trap = Arc::new(WebviewTrap::new());

    let services = if args.offline {
        info!("running against the in-memory screening backend");
        AppServices::assemble(
            Arc::new(InMemoryScreeningApi::default()),
            PersistentStore::open_profile(&args.profile_dir),
            trap.clone(),
            clock,
            idle_timeout,
        )
    } else {
        let config = ApiConfig::new(&args.api_url, API_TIMEOUT)?;
        AppServices::new_http(
            config,
            &args.profile_dir,
            trap.clone(),
            clock,
            idle_timeout,
        )?
    };

    info!(
        profile = %args.profile_dir.display(),
        lang = args.language.as_str(),
        idle_timeout_secs = args.idle_timeout_secs,
        "launching screening desktop app"
    );

    let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
        services,
        trap,
        language: args.language,
    });
    let context = build_app_context(&app);

    // Some tao setups default to always-on-top; turn it off explicitly.
    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Screening")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
