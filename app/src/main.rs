use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use student_app::{AppConfig, AppResult, ConfigArgs, Session};
use student_core::{Field, Route, StudentId, SubmitOutcome};
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Parser)]
#[command(name = "students", version, about = "Browse and edit students over the REST API")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show one page of the student list.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show the edit form for a student.
    Show { id: String },
    /// Create a student.
    Add {
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Update a student; omitted fields keep their stored values.
    Edit {
        id: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete a student, then show the list page it was on.
    Delete {
        id: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

#[derive(Debug, Args)]
struct FieldArgs {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// male, female or other.
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    country: Option<String>,
    /// Base64 data URL or plain URL.
    #[arg(long)]
    avatar: Option<String>,
    #[arg(long)]
    btc_address: Option<String>,
}

impl FieldArgs {
    fn edits(self) -> Vec<(Field, String)> {
        [
            (Field::FirstName, self.first_name),
            (Field::LastName, self.last_name),
            (Field::Email, self.email),
            (Field::Gender, self.gender),
            (Field::Country, self.country),
            (Field::Avatar, self.avatar),
            (Field::BtcAddress, self.btc_address),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env is fine; the environment and flags still apply.
    let _ = dotenvy::dotenv();

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with_writer(std::io::stderr)
            .finish(),
    )
    .expect("unable to set tracing subscriber");

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<ExitCode> {
    let config = AppConfig::try_from(cli.config)?;
    let mut session = Session::new(&config)?;

    match cli.command {
        Command::List { page } => {
            session.open(Route::Students { page }).await?;
        }
        Command::Show { id } => {
            session.open(Route::EditStudent(StudentId::new(id))).await?;
        }
        Command::Add { fields } => {
            session.open(Route::AddStudent).await?;
            return submit(&mut session, fields).await;
        }
        Command::Edit { id, fields } => {
            session.open(Route::EditStudent(StudentId::new(id))).await?;
            return submit(&mut session, fields).await;
        }
        Command::Delete { id, page } => {
            session.open(Route::Students { page }).await?;
            session.students().wait_idle().await;
            session.students().delete(&StudentId::new(id)).await?;
        }
    }

    print!("{}", session.render().await);
    Ok(ExitCode::SUCCESS)
}

async fn submit(session: &mut Session, fields: FieldArgs) -> AppResult<ExitCode> {
    for (field, value) in fields.edits() {
        session.form().set_field(field, &value)?;
    }
    let submitted = session.submit().await;
    print!("{}", session.render().await);
    Ok(match submitted.outcome {
        SubmitOutcome::Succeeded { .. } => ExitCode::SUCCESS,
        SubmitOutcome::Failed(_) => ExitCode::FAILURE,
    })
}
