//! Headless host for the maracas recording engine.
//!
//! Stands in for the GUI: one repeating poll on the main thread, a delegate
//! that logs what a window would display, and the finished recording
//! printed as JSON.

use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use maracas_core::{
    AudioSourceDescriptor, ConnectionState, EngineDelegate, RecorderConfiguration, RecorderEngine,
    RecorderError, RecordingResult, SessionState,
};
use maracas_pulse::PulseServer;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Record one PulseAudio input source to a WAV file
#[derive(Parser)]
#[command(name = "maracas")]
#[command(about = "Record a PulseAudio input source to a 16-bit mono WAV file")]
#[command(version)]
struct Cli {
    /// Index of the source to record, as shown by --list
    #[arg(long)]
    source: Option<usize>,

    /// Stop after this many seconds
    #[arg(long, default_value = "10")]
    seconds: u64,

    /// Directory for the recording (default: desktop, then current directory)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// List input sources and exit
    #[arg(long)]
    list: bool,
}

struct ConsoleDelegate;

impl EngineDelegate for ConsoleDelegate {
    fn on_connection_state_changed(&self, state: ConnectionState) {
        log::info!("connection: {:?}", state);
    }

    fn on_source_list_changed(&self, sources: &[AudioSourceDescriptor]) {
        log::debug!("{} source(s) listed", sources.len());
    }

    fn on_session_state_changed(&self, state: SessionState) {
        log::info!("session: {:?}", state);
    }

    fn on_elapsed_tick(&self, seconds: u64) {
        eprint!("\rrecording {:02}:{:02}", seconds / 60, seconds % 60);
    }

    fn on_error(&self, error: &RecorderError) {
        eprintln!();
        log::error!("{}", error);
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        eprintln!();
        log::info!("saved {}", result.file_path.display());
    }
}

#[derive(Clone, Copy)]
enum Phase {
    Listing,
    Recording { deadline: Instant },
}

fn run(cli: Cli) -> Result<(), RecorderError> {
    let mut config = RecorderConfiguration::default();
    config.output_directory = cli.output_dir;

    let server = PulseServer::new(&config)?;
    let mut engine = RecorderEngine::new(server, config)?;
    engine.set_delegate(Rc::new(ConsoleDelegate));
    engine.connect()?;

    let mut phase = Phase::Listing;
    loop {
        engine.poll()?;

        match phase {
            Phase::Listing => {
                if !engine.connection_state().is_ready() || engine.is_enumerating() {
                    thread::sleep(POLL_INTERVAL);
                    continue;
                }
                if cli.list {
                    for (index, source) in engine.sources().iter().enumerate() {
                        println!("{:>3}  {}  ({})", index, source.display_name, source.id);
                    }
                    engine.shutdown()?;
                    return Ok(());
                }
                let index = match cli.source.or(engine.default_source_index()) {
                    Some(index) => index,
                    None => return Err(RecorderError::SourceOutOfRange { index: 0, len: 0 }),
                };
                engine.start_index(index)?;
                phase = Phase::Recording {
                    deadline: Instant::now() + Duration::from_secs(cli.seconds),
                };
            }
            Phase::Recording { deadline } => {
                if engine.session_state().is_idle() {
                    // The stream failed; the delegate already reported why.
                    engine.shutdown()?;
                    return Err(RecorderError::StreamFailed("recording ended early".into()));
                }
                if Instant::now() >= deadline {
                    if let Some(result) = engine.shutdown()? {
                        let json = serde_json::to_string_pretty(&result)
                            .map_err(|e| RecorderError::StorageError(e.to_string()))?;
                        println!("{}", json);
                    }
                    return Ok(());
                }
            }
        }

        thread::sleep(POLL_INTERVAL);
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("maracas: {}", e);
            ExitCode::FAILURE
        }
    }
}
