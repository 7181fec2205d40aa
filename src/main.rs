// Entry point: parse arguments, set up logging and config, then run one
// command on the shared runtime.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use derm_intake::app::{self, IntakeError};
use derm_intake::app::progress::LogProgress;
use derm_intake::app::submit::{HttpTransport, submit_with_retry};
use derm_intake::{collage, logger};

#[derive(Parser, Debug)]
#[command(name = "derm-intake", version, about = "Dermatology intake: photo collage and webhook submission")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose photos into one JPEG (a single photo is copied unchanged)
    Collage {
        /// Photo files in slot order
        #[arg(short, long = "image", required = true)]
        images: Vec<PathBuf>,
        /// Output file
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Authenticate, compose and send one intake to the configured webhook
    Submit {
        /// Patient form as JSON
        #[arg(short, long)]
        form: PathBuf,
        /// Photo files in slot order
        #[arg(short, long = "image", required = true)]
        images: Vec<PathBuf>,
        /// Access code; falls back to INTAKE_ACCESS_CODE
        #[arg(short, long, env = "INTAKE_ACCESS_CODE")]
        code: String,
    },
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    logger::init();
    app::config::load_config_from_disk();

    let cli = Cli::parse();
    let res = app::rt().block_on(run(cli.command));
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), IntakeError> {
    match command {
        Command::Collage { images, out } => {
            let sources = app::read_images(&images).await?;
            let slots: Vec<_> = sources.into_iter().map(Some).collect();
            let bytes = collage::compose(&slots).await?;
            tokio::fs::write(&out, &bytes)
                .await
                .map_err(|source| IntakeError::Write {
                    path: out.clone(),
                    source,
                })?;
            log::info!("collage written to {} ({} bytes)", out.to_string_lossy(), bytes.len());
            Ok(())
        }
        Command::Submit { form, images, code } => {
            let cfg = app::config::current();
            let form = app::load_form(&form).await?;
            let sources = app::read_images(&images).await?;
            let mut session = app::open_session(&cfg, &code, sources).await?;
            let transport = HttpTransport::from_config(&cfg)?;

            submit_with_retry(&mut session, &form, &cfg, &transport, &LogProgress).await?;
            log::info!("intake for patient {} sent", form.patient_id);
            Ok(())
        }
    }
}
