#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use tracing::{debug, error, info};
use uuid::Uuid;

use medidash::auth::{load_current_user, AuthProvider, CurrentUser, RestAuth, Session};
use medidash::booking::{slot_label, AppointmentForm, BookingOutcome, DoctorSource};
use medidash::config::AppConfig;
use medidash::error::{MediDashError, Result};
use medidash::export::{write_report_to_dir, Report};
use medidash::fallback::LocalStore;
use medidash::logging::{init_logging, OperationTimer};
use medidash::metrics::MetricsCollector;
use medidash::models::{Appointment, AppointmentStatus, Medication, OutputFormat, Role, VerificationStatus};
use medidash::notify::Notification;
use medidash::prescription::PrescriptionForm;
use medidash::records::{check_patient_access, doctor_for_user, DocumentUpload, PatientRegistration};
use medidash::rest::RestClient;
use medidash::router::{can, landing_redirect, resolve, Capability, Route};
use medidash::service::HospitalService;
use medidash::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Extra configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user and role
    Whoami,
    /// Resolve where a page request ends up
    Route {
        /// Page path, e.g. /dashboard
        #[arg(default_value = "/")]
        path: String,
    },
    /// Show the dashboard for the current role
    Dashboard,
    /// List doctors available for booking
    Doctors,
    /// List bookable time slots
    Slots,
    /// Book an appointment for yourself
    Book {
        #[arg(short, long)]
        doctor: Uuid,

        /// Appointment date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Slot time, e.g. 09:30
        #[arg(long)]
        time: String,

        #[arg(short, long)]
        reason: Option<String>,
    },
    /// Book an appointment on behalf of a patient
    Schedule {
        #[arg(short, long)]
        patient: Uuid,

        #[arg(short, long)]
        doctor: Uuid,

        /// Appointment date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Slot time, e.g. 09:30
        #[arg(long)]
        time: String,

        #[arg(short, long)]
        reason: Option<String>,
    },
    /// List appointments visible to the current role
    Appointments {
        /// Day to list (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        #[arg(short, long)]
        patient: Option<Uuid>,
    },
    /// Change the status of an appointment
    SetStatus {
        id: Uuid,

        /// pending, scheduled, confirmed, completed, cancelled or no_show
        status: String,
    },
    /// Write a medical record and prescription
    Prescribe {
        #[arg(short, long)]
        patient: Uuid,

        #[arg(short, long)]
        appointment: Option<Uuid>,

        #[arg(long)]
        diagnosis: String,

        #[arg(long, default_value = "")]
        symptoms: String,

        #[arg(long, default_value = "")]
        treatment: String,

        #[arg(long, default_value = "")]
        instructions: String,

        /// Last valid day (YYYY-MM-DD)
        #[arg(long)]
        valid_until: Option<String>,

        /// NAME|DOSAGE|FREQUENCY|DURATION, repeatable
        #[arg(short, long = "medication")]
        medications: Vec<String>,
    },
    /// List prescriptions
    Prescriptions {
        /// Patient to list, defaults to your own record or your recent prescriptions
        #[arg(short, long)]
        patient: Option<Uuid>,

        /// Only prescriptions still valid today
        #[arg(long)]
        active: bool,
    },
    /// List medical records of a patient
    Records {
        #[arg(short, long)]
        patient: Option<Uuid>,
    },
    /// Register a walk-in patient
    RegisterPatient {
        #[arg(long)]
        full_name: String,

        #[arg(long)]
        phone: String,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        date_of_birth: String,

        /// male, female or other
        #[arg(long)]
        gender: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        blood_group: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        allergies: Option<String>,

        #[arg(long)]
        emergency_contact_name: Option<String>,

        #[arg(long)]
        emergency_contact_phone: Option<String>,
    },
    /// List documents
    Documents {
        #[arg(short, long)]
        patient: Option<Uuid>,

        /// Documents awaiting verification
        #[arg(long)]
        pending: bool,
    },
    /// Record an uploaded document
    UploadDocument {
        #[arg(short, long)]
        patient: Option<Uuid>,

        #[arg(long)]
        document_type: String,

        #[arg(long)]
        file_name: String,

        #[arg(long)]
        file_url: String,

        #[arg(long)]
        file_size: Option<i64>,

        #[arg(long)]
        notes: Option<String>,
    },
    /// Verify or reject a pending document
    VerifyDocument {
        id: Uuid,

        #[arg(long)]
        reject: bool,

        #[arg(long)]
        notes: Option<String>,
    },
    /// List staff and their roles
    Staff,
    /// Give a user a role
    AssignRole {
        user: Uuid,

        role: String,
    },
    /// Export a report
    Export {
        #[arg(value_enum)]
        report: ReportKind,

        #[arg(short, long)]
        patient: Option<Uuid>,

        /// txt, csv or json
        #[arg(short, long)]
        format: Option<String>,

        #[arg(short, long)]
        output_dir: Option<String>,
    },
    /// Appointments stored locally for demo doctors
    Demo {
        #[command(subcommand)]
        action: DemoAction,
    },
    /// Configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportKind {
    Appointments,
    Prescriptions,
}

#[derive(Subcommand)]
enum DemoAction {
    List,
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load_from(cli.config.as_deref())?;

    // Initialize logging
    let _guard = init_logging(
        Some(&config.get_log_level()),
        config.logging.file_path.as_deref().map(Path::new),
        config.logging.format == "json",
    )?;

    let metrics = MetricsCollector::new();
    let outcome = run(&cli, &config, &metrics).await;
    debug!(metrics = ?metrics.snapshot(), "Command finished");

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            metrics.record_error(e.kind());
            error!(error = %e, kind = e.kind(), "Command failed");
            eprintln!("{}", Notification::from_error(&e));
            Ok(ExitCode::FAILURE)
        },
    }
}

/// Everything a command may need, built once per invocation
struct App<'a> {
    config: &'a AppConfig,
    store: Arc<LocalStore>,
    metrics: &'a MetricsCollector,
}

/// Signed-in context for commands that talk to the backend
struct SignedIn {
    user: CurrentUser,
    service: HospitalService,
}

impl App<'_> {
    fn auth(&self) -> Result<RestAuth> {
        RestAuth::new(&self.config.backend)
    }

    fn session(&self) -> Result<Session> {
        self.store.load_session()?.ok_or(MediDashError::Unauthenticated)
    }

    async fn sign_in_context(&self, session: &Session) -> Result<SignedIn> {
        let client = RestClient::new(&self.config.backend, self.metrics.clone())?
            .with_access_token(session.access_token.clone());
        let client = Arc::new(client);
        let user = load_current_user(client.as_ref(), &session.user).await?;
        let service = HospitalService::from_config(self.config, client, Arc::clone(&self.store), self.metrics.clone())?;
        Ok(SignedIn { user, service })
    }

    async fn signed_in(&self) -> Result<SignedIn> {
        let session = self.session()?;
        self.sign_in_context(&session).await
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    ["%H:%M", "%H:%M:%S", "%I:%M %p"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
        .ok_or_else(|| MediDashError::validation(format!("Invalid time: {value}")))
}

fn parse_medication(value: &str) -> Result<Medication> {
    let parts: Vec<&str> = value.split('|').map(str::trim).collect();
    match parts.as_slice() {
        [name, dosage, frequency, duration] => Ok(Medication {
            name: (*name).to_string(),
            dosage: (*dosage).to_string(),
            frequency: (*frequency).to_string(),
            duration: (*duration).to_string(),
        }),
        _ => Err(MediDashError::validation(format!(
            "Medication must be NAME|DOSAGE|FREQUENCY|DURATION, got: {value}"
        ))),
    }
}

fn appointment_form(doctor: Uuid, date: &str, time: &str, reason: Option<&str>) -> Result<AppointmentForm> {
    Ok(AppointmentForm {
        doctor_id: Some(doctor),
        appointment_date: Some(InputValidator::parse_date(date, "Appointment date")?),
        appointment_time: Some(parse_time(time)?),
        reason: reason.unwrap_or_default().to_string(),
    })
}

fn print_appointments(appointments: &[Appointment]) {
    if appointments.is_empty() {
        println!("No appointments");
    }
    for a in appointments {
        println!(
            "{}  {} {}  {:<12}{}",
            a.id,
            a.appointment_date.format("%Y-%m-%d"),
            slot_label(a.appointment_time),
            a.status.label(),
            a.reason.as_deref().unwrap_or("-")
        );
    }
}

async fn run(cli: &Cli, config: &AppConfig, metrics: &MetricsCollector) -> Result<()> {
    let store = Arc::new(LocalStore::open(&config.storage.path)?);
    let app = App { config, store, metrics };

    match &cli.command {
        Commands::Login { email, password } => login(&app, email, password).await,
        Commands::Logout => logout(&app).await,
        Commands::Whoami => whoami(&app).await,
        Commands::Route { path } => route(&app, path).await,
        Commands::Dashboard => {
            let ctx = app.signed_in().await?;
            let view = ctx.service.dashboard().load(&ctx.user, today()).await?;
            println!("{view}");
            Ok(())
        },
        Commands::Doctors => {
            let ctx = app.signed_in().await?;
            let choices = ctx.service.booking().doctor_choices().await?;
            if choices.source == DoctorSource::Demo {
                println!("No doctors registered yet; showing demo doctors (bookings stay on this device)");
            }
            for doctor in &choices.doctors {
                println!("{}  {}", doctor.id, doctor.label());
            }
            Ok(())
        },
        Commands::Slots => {
            let slots = medidash::booking::TimeSlots::from_config(&config.booking)?;
            for slot in slots.all() {
                println!("{}", slot_label(slot));
            }
            Ok(())
        },
        Commands::Book { doctor, date, time, reason } => {
            let ctx = app.signed_in().await?;
            let form = appointment_form(*doctor, date, time, reason.as_deref())?;
            let notification = match ctx.service.booking().book(&ctx.user, &form, today()).await? {
                BookingOutcome::Booked(_) => Notification::appointment_booked(),
                BookingOutcome::StoredLocally(demo) => {
                    Notification::demo_appointment_saved(demo.appointment_date, demo.appointment_time)
                },
            };
            println!("{notification}");
            Ok(())
        },
        Commands::Schedule { patient, doctor, date, time, reason } => {
            let ctx = app.signed_in().await?;
            let form = appointment_form(*doctor, date, time, reason.as_deref())?;
            let appointment = ctx.service.booking().schedule_for_patient(&ctx.user, *patient, &form, today()).await?;
            println!("{}", Notification::appointment_booked());
            print_appointments(&[appointment]);
            Ok(())
        },
        Commands::Appointments { date, patient } => appointments(&app, date.as_deref(), *patient).await,
        Commands::SetStatus { id, status } => {
            let ctx = app.signed_in().await?;
            let status: AppointmentStatus = status.parse()?;
            let updated = ctx.service.booking().update_status(&ctx.user, *id, status).await?;
            println!("{}", Notification::appointment_updated(updated.status.label()));
            Ok(())
        },
        Commands::Prescribe { patient, appointment, diagnosis, symptoms, treatment, instructions, valid_until, medications } => {
            let ctx = app.signed_in().await?;
            let mut form = PrescriptionForm {
                patient_id: Some(*patient),
                appointment_id: *appointment,
                diagnosis: diagnosis.clone(),
                symptoms: symptoms.clone(),
                treatment: treatment.clone(),
                instructions: instructions.clone(),
                valid_until: valid_until
                    .as_deref()
                    .map(|d| InputValidator::parse_date(d, "Valid until date"))
                    .transpose()?,
                ..PrescriptionForm::new()
            };
            form.medications = medications.iter().map(|m| parse_medication(m)).collect::<Result<_>>()?;
            let issued = ctx.service.prescriptions().issue(&ctx.user, &form, today()).await?;
            println!("{}", Notification::prescription_issued(issued.prescription.medications.len()));
            println!("Medical record {}  Prescription {}", issued.record.id, issued.prescription.id);
            Ok(())
        },
        Commands::Prescriptions { patient, active } => prescriptions(&app, *patient, *active).await,
        Commands::Records { patient } => {
            let ctx = app.signed_in().await?;
            let patient_id = own_or(&ctx, *patient).await?;
            let records = ctx.service.records().medical_records(&ctx.user, patient_id).await?;
            if records.is_empty() {
                println!("No medical records");
            }
            for record in records {
                println!(
                    "{}  {}  {}",
                    record.record_date.format("%Y-%m-%d"),
                    record.diagnosis,
                    record.treatment.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        },
        Commands::RegisterPatient {
            full_name,
            phone,
            date_of_birth,
            gender,
            email,
            blood_group,
            address,
            allergies,
            emergency_contact_name,
            emergency_contact_phone,
        } => {
            let ctx = app.signed_in().await?;
            let form = PatientRegistration {
                full_name: full_name.clone(),
                phone: phone.clone(),
                email: email.clone(),
                date_of_birth: Some(InputValidator::parse_date(date_of_birth, "Date of birth")?),
                gender: gender.clone(),
                blood_group: blood_group.clone(),
                address: address.clone(),
                allergies: allergies.clone(),
                emergency_contact_name: emergency_contact_name.clone(),
                emergency_contact_phone: emergency_contact_phone.clone(),
            };
            let patient = ctx.service.records().register_patient(&ctx.user, &form, today()).await?;
            println!("{}", Notification::patient_registered(&patient.full_name));
            println!("Patient id {}", patient.id);
            Ok(())
        },
        Commands::Documents { patient, pending } => {
            let ctx = app.signed_in().await?;
            let documents = if *pending {
                ctx.service.records().pending_documents(&ctx.user).await?
            } else {
                let patient_id = own_or(&ctx, *patient).await?;
                ctx.service.records().documents_for_patient(&ctx.user, patient_id).await?
            };
            if documents.is_empty() {
                println!("No documents");
            }
            for document in documents {
                println!(
                    "{}  {:<10}{:<16}{}",
                    document.id,
                    document.verification_status.as_str(),
                    document.document_type,
                    document.file_name
                );
            }
            Ok(())
        },
        Commands::UploadDocument { patient, document_type, file_name, file_url, file_size, notes } => {
            let ctx = app.signed_in().await?;
            let upload = DocumentUpload {
                patient_id: *patient,
                document_type: document_type.clone(),
                file_name: file_name.clone(),
                file_size: *file_size,
                file_url: file_url.clone(),
                notes: notes.clone(),
            };
            let document = ctx.service.records().upload_document(&ctx.user, &upload).await?;
            println!("{}", Notification::document_uploaded(&document.file_name));
            Ok(())
        },
        Commands::VerifyDocument { id, reject, notes } => {
            let ctx = app.signed_in().await?;
            let decision = if *reject { VerificationStatus::Rejected } else { VerificationStatus::Verified };
            let document = ctx
                .service
                .records()
                .verify_document(&ctx.user, *id, decision, notes.as_deref())
                .await?;
            println!("{}", Notification::document_decided(document.verification_status));
            Ok(())
        },
        Commands::Staff => {
            let ctx = app.signed_in().await?;
            for member in ctx.service.records().staff_members(&ctx.user).await? {
                println!(
                    "{}  {:<14}{}",
                    member.user_id,
                    member.role.display_name(),
                    member.full_name.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        },
        Commands::AssignRole { user, role } => {
            let ctx = app.signed_in().await?;
            let role: Role = role.parse()?;
            let assigned = ctx.service.records().assign_role(&ctx.user, *user, role).await?;
            println!("{}", Notification::role_assigned(assigned.role));
            Ok(())
        },
        Commands::Export { report, patient, format, output_dir } => {
            export(&app, *report, *patient, format.as_deref(), output_dir.as_deref()).await
        },
        Commands::Demo { action } => demo(&app, action),
        Commands::Config { action: ConfigAction::Show } => {
            println!("{}", config.to_yaml()?);
            Ok(())
        },
    }
}

async fn login(app: &App<'_>, email: &str, password: &str) -> Result<()> {
    InputValidator::validate_required(&[("email", email), ("password", password)])?;
    InputValidator::validate_email(email)?;

    let timer = OperationTimer::new("login");
    let session = app.auth()?.sign_in(email.trim(), password).await?;
    app.store.save_session(&session)?;

    let ctx = app.sign_in_context(&session).await?;
    timer.finish();
    println!("Signed in as {}", ctx.user.email.as_deref().unwrap_or("unknown"));
    println!("Redirecting to {}", resolve(Some(&ctx.user), Route::Dashboard));
    Ok(())
}

async fn logout(app: &App<'_>) -> Result<()> {
    if let Some(session) = app.store.load_session()? {
        // the local session is dropped even if the server call fails
        if let Err(e) = app.auth()?.sign_out(&session).await {
            error!(error = %e, "Server sign-out failed");
        }
    }
    app.store.clear_session()?;
    info!("Local session cleared");
    println!("Signed out");
    Ok(())
}

async fn whoami(app: &App<'_>) -> Result<()> {
    let session = app.session()?;
    let auth_user = app.auth()?.user(&session.access_token).await?;
    if auth_user.id != session.user.id {
        return Err(MediDashError::Unauthenticated);
    }
    let ctx = app.sign_in_context(&session).await?;
    println!("{}", medidash::dashboard::HeaderBar::for_user(&ctx.user));
    println!("User id {}", ctx.user.id);
    Ok(())
}

async fn route(app: &App<'_>, path: &str) -> Result<()> {
    let requested: Route = path.parse()?;
    let user = match app.store.load_session()? {
        Some(session) => Some(app.sign_in_context(&session).await?.user),
        None => None,
    };
    let resolved = if requested == Route::Landing {
        landing_redirect(user.as_ref())
    } else {
        resolve(user.as_ref(), requested)
    };
    println!("{resolved}");
    Ok(())
}

/// `patient`, or the caller's own patient record
async fn own_or(ctx: &SignedIn, patient: Option<Uuid>) -> Result<Uuid> {
    if let Some(id) = patient {
        return Ok(id);
    }
    ctx.service
        .records()
        .patient_for_user(&ctx.user)
        .await?
        .map(|p| p.id)
        .ok_or_else(|| MediDashError::NotFound("No patient record for the current user; pass --patient".to_string()))
}

async fn visible_appointments(ctx: &SignedIn, date: Option<&str>, patient: Option<Uuid>) -> Result<Vec<Appointment>> {
    let booking = ctx.service.booking();
    let day = date.map(|d| InputValidator::parse_date(d, "Date")).transpose()?.unwrap_or_else(today);

    if let Some(patient_id) = patient {
        check_patient_access(ctx.service.client(), &ctx.user, patient_id).await?;
        return booking.appointments_for_patient(patient_id).await;
    }
    if ctx.user.role == Some(Role::Doctor) {
        let doctor = doctor_for_user(ctx.service.client(), ctx.user.id)
            .await?
            .ok_or_else(|| MediDashError::NotFound("No doctor profile for the current user".to_string()))?;
        return booking.appointments_for_doctor_on(doctor.id, day).await;
    }
    if can(&ctx.user, Capability::ViewAllAppointments) {
        return booking.appointments_on(day).await;
    }
    Ok(booking.appointments_for_user(&ctx.user).await?.remote)
}

async fn appointments(app: &App<'_>, date: Option<&str>, patient: Option<Uuid>) -> Result<()> {
    let ctx = app.signed_in().await?;

    let own_view = patient.is_none()
        && ctx.user.role != Some(Role::Doctor)
        && !can(&ctx.user, Capability::ViewAllAppointments);
    if !own_view {
        print_appointments(&visible_appointments(&ctx, date, patient).await?);
        return Ok(());
    }

    let mine = ctx.service.booking().appointments_for_user(&ctx.user).await?;
    print_appointments(&mine.remote);
    for demo in &mine.local {
        println!(
            "{}  {} {}  {:<12}{}  (demo, stored locally)",
            demo.id,
            demo.appointment_date.format("%Y-%m-%d"),
            slot_label(demo.appointment_time),
            demo.status.label(),
            demo.doctor_name
        );
    }
    Ok(())
}

async fn prescriptions(app: &App<'_>, patient: Option<Uuid>, active: bool) -> Result<()> {
    let ctx = app.signed_in().await?;
    let service = ctx.service.prescriptions();

    let list = match patient {
        None if ctx.user.role == Some(Role::Doctor) => {
            if active {
                service.active_for_doctor(&ctx.user, 20, today()).await?
            } else {
                service.recent_for_doctor(&ctx.user, 20).await?
            }
        },
        _ => {
            let patient_id = own_or(&ctx, patient).await?;
            if active {
                service.active_for_patient(&ctx.user, patient_id, today()).await?
            } else {
                service.for_patient(&ctx.user, patient_id).await?
            }
        },
    };

    if list.is_empty() {
        println!("No prescriptions");
    }
    for prescription in list {
        let names: Vec<&str> = prescription.medications.iter().map(|m| m.name.as_str()).collect();
        println!(
            "{}  {}  {}",
            prescription.id,
            prescription.prescription_date.format("%Y-%m-%d"),
            names.join(", ")
        );
    }
    Ok(())
}

async fn export(
    app: &App<'_>, kind: ReportKind, patient: Option<Uuid>, format: Option<&str>, output_dir: Option<&str>,
) -> Result<()> {
    let ctx = app.signed_in().await?;
    let format: OutputFormat = format.unwrap_or(&app.config.export.default_format).parse()?;
    let output_dir = Path::new(output_dir.unwrap_or(&app.config.export.output_directory));

    let report = match kind {
        ReportKind::Appointments => {
            let rows = visible_appointments(&ctx, None, patient).await?;
            Report::appointments(ctx.service.client(), &rows).await?
        },
        ReportKind::Prescriptions => {
            let rows = match patient {
                None if ctx.user.role == Some(Role::Doctor) => {
                    ctx.service.prescriptions().recent_for_doctor(&ctx.user, 500).await?
                },
                _ => {
                    let patient_id = own_or(&ctx, patient).await?;
                    ctx.service.prescriptions().for_patient(&ctx.user, patient_id).await?
                },
            };
            Report::prescriptions(ctx.service.client(), &rows).await?
        },
    };

    if report.is_empty() {
        println!("Nothing to export");
        return Ok(());
    }
    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let path = write_report_to_dir(&report, format, output_dir, &stamp)?;
    println!("Wrote {} rows to {}", report.rows.len(), path.display());
    Ok(())
}

fn demo(app: &App<'_>, action: &DemoAction) -> Result<()> {
    match action {
        DemoAction::List => {
            let user_id = app.store.load_session()?.map(|s| s.user.id);
            let demos = app.store.demo_appointments(user_id)?;
            if demos.is_empty() {
                println!("No demo appointments");
            }
            for demo in demos {
                println!(
                    "{}  {} {}  {} ({})  {}",
                    demo.id,
                    demo.appointment_date.format("%Y-%m-%d"),
                    slot_label(demo.appointment_time),
                    demo.doctor_name,
                    demo.specialization,
                    demo.reason.as_deref().unwrap_or("-")
                );
            }
        },
        DemoAction::Clear => {
            let removed = app.store.clear_demo_appointments()?;
            println!("Removed {removed} demo appointments");
        },
    }
    Ok(())
}

