use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triage_core::{
    catalogue, classifier, open_store, seed, ActionType, ActorId, Appointment, AppointmentFilter,
    AppointmentId, BookingRequest, GpAction, PatientId, RawConfig, Severity, Submission,
    SubmissionId, SubmissionQuery, SubmissionStatus, SymptomDuration, SymptomReport, TriageLevel,
    WorkflowEngine,
};

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Patient symptom triage CLI")]
struct Cli {
    /// SQLite database holding the caseload
    #[arg(long, global = true, env = "TRIAGE_DATABASE_PATH", default_value = "triage.db")]
    db: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a severity/duration pair without recording anything
    Classify {
        /// Severity, 1 (mild) to 4 (very severe)
        severity: i64,
        /// Duration label or code (`<24h`, `1-3d`, `4-7d`, `1-2w`, `>2w`)
        duration: String,
    },
    /// Submit a symptom report
    Submit {
        first_name: String,
        last_name: String,
        #[arg(long)]
        age: i64,
        #[arg(long)]
        gender: String,
        /// Body area (repeatable)
        #[arg(long = "area", required = true)]
        body_areas: Vec<String>,
        /// Symptom (repeatable); omit to be shown suggestions for the chosen areas
        #[arg(long = "symptom")]
        symptoms: Vec<String>,
        #[arg(long)]
        duration: String,
        #[arg(long)]
        severity: i64,
        #[arg(long, default_value = "")]
        info: String,
        /// Patient identity, when known
        #[arg(long)]
        patient: Option<String>,
    },
    /// List submissions, newest first
    List {
        #[arg(long)]
        patient: Option<String>,
        /// Case-insensitive search over name and id
        #[arg(long)]
        search: Option<String>,
        /// green, amber or red
        #[arg(long)]
        triage: Option<String>,
        /// pending-review or reviewed
        #[arg(long)]
        status: Option<String>,
    },
    /// Show a submission with its actions and appointments
    Show { id: String },
    /// Caseload counts
    Summary {
        #[arg(long)]
        patient: Option<String>,
    },
    /// Overwrite a submission's status
    SetStatus { id: String, status: String },
    /// Record a GP action (review, note, prescribe, refer, follow-up, discharge)
    RecordAction {
        submission_id: String,
        action_type: String,
        #[arg(long)]
        actor: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Book a hospital appointment
    Book {
        hospital: String,
        /// YYYY-MM-DD
        date: String,
        /// HH:MM
        time: String,
        #[arg(long)]
        submission: Option<String>,
        #[arg(long)]
        patient: Option<String>,
        #[arg(long)]
        actor: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        doctor: Option<String>,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Cancel an appointment
    Cancel { id: String },
    /// Move an appointment to a new date and time
    Reschedule { id: String, date: String, time: String },
    /// List appointments
    Appointments {
        #[arg(long, conflicts_with = "submission")]
        patient: Option<String>,
        #[arg(long)]
        submission: Option<String>,
    },
    /// Print the body areas and their common symptoms
    Catalogue,
    /// Load the demo caseload
    Seed,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("triage=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'triage --help' for commands");
        return Ok(());
    };

    match command {
        Commands::Classify { severity, duration } => {
            let level = classifier::classify_raw(severity, &duration)?;
            print_guidance(level);
        }
        Commands::Catalogue => {
            for (area, symptoms) in catalogue::BODY_AREAS {
                println!("{area}: {}", symptoms.join(", "));
            }
            println!();
            println!("Durations:");
            for duration in SymptomDuration::ALL {
                println!("  {} ({})", duration.label(), duration.code());
            }
        }
        Commands::Submit {
            body_areas,
            symptoms,
            ..
        } if symptoms.is_empty() => {
            let suggestions =
                catalogue::suggestions_for(body_areas.iter().map(String::as_str));
            eprintln!("At least one --symptom is required.");
            if !suggestions.is_empty() {
                eprintln!("Common symptoms: {}", suggestions.join(", "));
            }
            std::process::exit(2);
        }
        command => run_against_store(&cli.db, command)?,
    }

    Ok(())
}

fn run_against_store(db: &str, command: Commands) -> anyhow::Result<()> {
    let cfg = RawConfig {
        database_path: Some(db.to_owned()),
        store_max_attempts: std::env::var("TRIAGE_STORE_MAX_ATTEMPTS").ok(),
        store_backoff_ms: std::env::var("TRIAGE_STORE_BACKOFF_MS").ok(),
        store_busy_timeout_ms: std::env::var("TRIAGE_STORE_BUSY_TIMEOUT_MS").ok(),
    }
    .resolve()?;
    let engine = WorkflowEngine::new(open_store(&cfg)?);

    match command {
        Commands::Submit {
            first_name,
            last_name,
            age,
            gender,
            body_areas,
            symptoms,
            duration,
            severity,
            info,
            patient,
        } => {
            let report = SymptomReport {
                first_name,
                last_name,
                age: Some(age),
                gender,
                body_areas,
                symptoms,
                duration,
                severity: Some(severity),
                additional_info: info,
            };
            let patient_id = patient.map(PatientId::parse).transpose()?;
            let submission = engine.create_submission(patient_id, &report)?;
            println!("Created submission: {}", submission.id);
            print_guidance(submission.triage_level);
        }
        Commands::List {
            patient,
            search,
            triage,
            status,
        } => {
            let query = SubmissionQuery {
                patient_id: patient.map(PatientId::parse).transpose()?,
                search,
                triage: triage.map(|t| t.parse::<TriageLevel>()).transpose()?,
                status: status.map(|s| s.parse::<SubmissionStatus>()).transpose()?,
            };
            let submissions = engine.query_submissions(&query)?;
            if submissions.is_empty() {
                println!("No submissions found.");
            }
            for submission in &submissions {
                print_submission_line(submission);
            }
        }
        Commands::Show { id } => {
            let id = SubmissionId::parse(id)?;
            let submission = engine.get_submission(&id)?;
            print_submission(&submission);

            let actions = engine.list_actions(&id)?;
            println!("Actions:");
            if actions.is_empty() {
                println!("  none");
            }
            for action in &actions {
                print_action(action);
            }

            let appointments =
                engine.list_appointments(&AppointmentFilter::Submission(id.clone()))?;
            println!("Appointments:");
            if appointments.is_empty() {
                println!("  none");
            }
            for appointment in &appointments {
                print_appointment(appointment);
            }
        }
        Commands::Summary { patient } => {
            let patient = patient.map(PatientId::parse).transpose()?;
            let summary = engine.summary(patient.as_ref())?;
            println!("Total:          {}", summary.total);
            println!("Pending review: {}", summary.pending_review);
            println!("Reviewed:       {}", summary.reviewed);
            println!("Urgent:         {}", summary.urgent);
        }
        Commands::SetStatus { id, status } => {
            let submission =
                engine.update_status(&SubmissionId::parse(id)?, status.parse()?)?;
            println!("Submission {} is now {}", submission.id, submission.status);
        }
        Commands::RecordAction {
            submission_id,
            action_type,
            actor,
            notes,
        } => {
            let action = engine.record_action(
                SubmissionId::parse(submission_id)?,
                actor.map(ActorId::parse).transpose()?,
                action_type.parse::<ActionType>()?,
                notes,
            )?;
            println!("Recorded action: {}", action.id);
            let submission = engine.get_submission(&action.submission_id).ok();
            if let Some(submission) = submission {
                println!("Submission {} is {}", submission.id, submission.status);
            }
        }
        Commands::Book {
            hospital,
            date,
            time,
            submission,
            patient,
            actor,
            department,
            doctor,
            reason,
            notes,
        } => {
            let appointment = engine.book_appointment(BookingRequest {
                submission_id: submission.map(SubmissionId::parse).transpose()?,
                patient_id: patient.map(PatientId::parse).transpose()?,
                actor_id: actor.map(ActorId::parse).transpose()?,
                hospital,
                department,
                doctor,
                date,
                time,
                reason,
                notes,
            })?;
            println!("Booked appointment: {}", appointment.id);
            print_appointment(&appointment);
        }
        Commands::Cancel { id } => {
            let appointment = engine.cancel_appointment(&AppointmentId::parse(id)?)?;
            print_appointment(&appointment);
        }
        Commands::Reschedule { id, date, time } => {
            let appointment =
                engine.reschedule_appointment(&AppointmentId::parse(id)?, &date, &time)?;
            print_appointment(&appointment);
        }
        Commands::Appointments {
            patient,
            submission,
        } => {
            let filter = match (patient, submission) {
                (Some(patient), _) => AppointmentFilter::Patient(PatientId::parse(patient)?),
                (None, Some(submission)) => {
                    AppointmentFilter::Submission(SubmissionId::parse(submission)?)
                }
                (None, None) => AppointmentFilter::All,
            };
            let appointments = engine.list_appointments(&filter)?;
            if appointments.is_empty() {
                println!("No appointments found.");
            }
            for appointment in &appointments {
                print_appointment(appointment);
            }
        }
        Commands::Seed => {
            let seeded = seed::seed_demo(&engine)?;
            println!("Seeded {} demo submissions", seeded.len());
            for submission in &seeded {
                print_submission_line(submission);
            }
        }
        Commands::Classify { .. } | Commands::Catalogue => {}
    }

    Ok(())
}

fn print_guidance(level: TriageLevel) {
    let guidance = level.guidance();
    println!("Triage: {} ({})", guidance.label, level);
    println!("{}", guidance.title);
    println!("{}", guidance.description);
    for (n, step) in guidance.next_steps.iter().enumerate() {
        println!("  {}. {}", n + 1, step);
    }
}

fn print_submission_line(submission: &Submission) {
    println!(
        "{}  {:<6} {:<15} {:<24} {}",
        submission.id,
        submission.triage_level,
        submission.status,
        submission.full_name(),
        submission.created_at.format("%Y-%m-%d %H:%M"),
    );
}

fn print_submission(submission: &Submission) {
    println!("ID:        {}", submission.id);
    if let Some(patient) = &submission.patient_id {
        println!("Patient:   {patient}");
    }
    println!(
        "Name:      {} ({}, {})",
        submission.full_name(),
        submission.age,
        submission.gender
    );
    println!("Areas:     {}", submission.body_areas.join(", "));
    println!("Symptoms:  {}", submission.symptoms.join(", "));
    println!("Duration:  {}", submission.duration.label());
    println!("Severity:  {}", severity_text(submission.severity));
    if !submission.additional_info.is_empty() {
        println!("Info:      {}", submission.additional_info);
    }
    println!("Triage:    {}", submission.triage_level);
    println!("Status:    {}", submission.status);
    println!("Submitted: {}", submission.created_at.to_rfc3339());
}

fn severity_text(severity: Severity) -> String {
    format!("{} ({})", severity.value(), severity.label())
}

fn print_action(action: &GpAction) {
    let actor = action.actor_id.as_ref().map_or("-", |a| a.as_str());
    println!(
        "  {} {:<7} by {}: {}",
        action.created_at.format("%Y-%m-%d %H:%M"),
        action.action_type,
        actor,
        action.notes
    );
}

fn print_appointment(appointment: &Appointment) {
    let mut line = format!(
        "{}  {} {}  {:<9} {}",
        appointment.id,
        appointment.date,
        appointment.time.format("%H:%M"),
        appointment.status,
        appointment.hospital
    );
    if let Some(department) = &appointment.department {
        line.push_str(&format!(", {department}"));
    }
    if let Some(doctor) = &appointment.doctor {
        line.push_str(&format!(" ({doctor})"));
    }
    println!("{line}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_book_parses_optional_links() {
        let cli = Cli::try_parse_from([
            "triage",
            "--db",
            "cases.db",
            "book",
            "Mater",
            "2026-03-01",
            "09:00",
            "--submission",
            "abc",
        ])
        .expect("valid arguments");
        assert_eq!(cli.db, "cases.db");
        match cli.command {
            Some(Commands::Book {
                hospital,
                submission,
                patient,
                ..
            }) => {
                assert_eq!(hospital, "Mater");
                assert_eq!(submission.as_deref(), Some("abc"));
                assert!(patient.is_none());
            }
            _ => panic!("expected book"),
        }
    }

    #[test]
    fn test_record_action_help_names_every_action_type() {
        let cmd = Cli::command();
        let about = cmd
            .find_subcommand("record-action")
            .and_then(|sub| sub.get_about())
            .expect("record-action has a description")
            .to_string();
        for action_type in ActionType::ALL {
            assert!(about.contains(action_type.as_str()), "{about} lacks {action_type}");
        }
    }

    #[test]
    fn test_submit_requires_an_area() {
        assert!(Cli::try_parse_from(["triage", "submit", "Aoife", "Murphy"]).is_err());
    }
}
