use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use client_core::{
    CandidateList, DialogHost, Field, FormEvent, HttpTransferTransport, Navigator, SubmitReport,
    TracingNotifier, TransferDialog,
};
use shared::domain::{Candidate, CandidateId, FacilityId};
use tracing::{info, warn};

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(about = "Transfer a patient record into a facility after confirming year of birth")]
struct Args {
    #[arg(long, default_value = "transfer.toml")]
    config: PathBuf,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    facility_id: Option<String>,
    #[arg(long)]
    candidates: Option<PathBuf>,
    /// Print the selectable patients and exit.
    #[arg(long)]
    list: bool,
    #[arg(long)]
    patient: Option<String>,
    #[arg(long)]
    year_of_birth: Option<String>,
}

struct StdoutNavigator;

impl Navigator for StdoutNavigator {
    fn go_to(&self, path: &str) {
        println!("open {path}");
    }
}

struct CliHost;

impl DialogHost for CliHost {
    fn on_accepted(&self) {
        info!("transfer accepted");
    }

    fn on_cancelled(&self) {
        info!("transfer cancelled");
    }
}

fn load_candidates(path: &Path) -> Result<Vec<Candidate>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read candidates file '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse candidates file '{}'", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(v) = args.server_url {
        settings.server_url = v;
    }
    if let Some(v) = args.facility_id {
        settings.facility_id = Some(v);
    }
    if let Some(v) = args.candidates {
        settings.candidates_path = v;
    }

    let candidates = load_candidates(&settings.candidates_path)?;
    if args.list {
        for option in CandidateList::new(candidates).options() {
            println!("{}\t{}", option.id, option.label);
        }
        return Ok(());
    }

    let facility_id = settings
        .facility_id
        .clone()
        .ok_or_else(|| anyhow!("facility id is required (--facility-id or APP__FACILITY_ID)"))?;

    let mut transport = HttpTransferTransport::with_timeout(
        &settings.server_url,
        Duration::from_secs(settings.request_timeout_seconds),
    )?;
    if let Some(token) = &settings.auth_token {
        transport = transport.with_bearer_token(token.clone());
    }

    let mut dialog = TransferDialog::new(
        FacilityId::new(facility_id),
        candidates,
        Arc::new(CliHost),
        Arc::new(transport),
        Arc::new(TracingNotifier),
        Arc::new(StdoutNavigator),
    );

    dialog.apply(FormEvent::PatientSelected(args.patient.map(CandidateId::new)));
    if let Some(year) = args.year_of_birth {
        dialog.apply(FormEvent::YearOfBirthInput(year.clone()));
        if dialog.state().values.get(Field::YearOfBirth) != &year {
            warn!(input = year.as_str(), "year of birth must be at most 4 digits");
        }
        dialog.apply(FormEvent::YearOfBirthBlurred);
    }

    let pending = match dialog.begin_submit() {
        Ok(pending) => pending,
        Err(report) => return report_outcome(&dialog, report),
    };

    let transport = dialog.transport();
    let outcome = tokio::select! {
        outcome = pending.dispatch(transport.as_ref()) => Some(outcome),
        _ = tokio::signal::ctrl_c() => None,
    };

    let report = match outcome {
        Some(outcome) => dialog.complete_submit(pending, outcome),
        None => {
            dialog.cancel();
            SubmitReport::Closed
        }
    };
    report_outcome(&dialog, report)
}

fn report_outcome(dialog: &TransferDialog, report: SubmitReport) -> Result<()> {
    match report {
        SubmitReport::Accepted { encounter } => {
            match encounter {
                Some(id) => println!("transferred; new encounter {id}"),
                None => println!("transferred; no encounter was created"),
            }
            Ok(())
        }
        SubmitReport::Invalid => {
            for (field, message) in dialog.state().errors.iter() {
                if !message.is_empty() {
                    eprintln!("{field}: {message}");
                }
            }
            bail!("transfer form is invalid")
        }
        SubmitReport::CandidateMissing => bail!("selected patient is not in the candidate list"),
        SubmitReport::Failed { message } => bail!("transfer failed: {message}"),
        SubmitReport::Closed | SubmitReport::Stale => bail!("transfer cancelled"),
    }
}
