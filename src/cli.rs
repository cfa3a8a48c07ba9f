//! Command-line interface: argument types and the one-shot commands.
//!
//! Commands print to the writer they are given and return a process exit
//! code:
//! - `0` success
//! - `1` invalid input, a failed request or an `Error` result
//! - `2` a login is required (no credential, or the server rejected it)

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::adapters::StoreError;
use crate::application::auth::logout;
use crate::application::{
    AuthService, Completion, DiagnosticFlow, DiagnosticService, GuardDecision, Session,
    SessionGuard, SubmitError, View,
};
use crate::config::{AppConfig, Overrides};
use crate::domain::{
    find_preset, DiagnosticResult, Variant, FEATURE_COUNT, FEATURE_NAMES,
    INVALID_FEATURES_MESSAGE, SAMPLE_PRESETS,
};
use crate::ports::{AuthApi, CredentialStore, Predictor};

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_LOGIN_REQUIRED: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "cancerai",
    version,
    about = "Terminal client for the CancerAI breast cancer prediction service"
)]
pub struct Cli {
    #[arg(long, global = true, env = "CANCERAI_CONFIG", help = "TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Prediction server base URL")]
    pub api_url: Option<String>,

    #[arg(long, global = true, value_enum)]
    pub variant: Option<VariantArg>,

    #[arg(long, global = true, help = "Where the login token is kept")]
    pub credential_file: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        default_value_t = false,
        help = "Keep the login token in memory only"
    )]
    pub no_persist: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Flag values that take precedence over file and environment.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            api_url: self.api_url.clone(),
            variant: self.variant.map(Variant::from),
            credential_file: self.credential_file.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Interactive terminal application (default)
    Tui,
    /// Submit one set of measurements and print the result
    Predict(PredictArgs),
    /// Log in; the password is read from stdin
    Login(LoginArgs),
    /// Forget the stored login token
    Logout,
    /// Show the logged-in doctor
    Whoami,
    /// List sample presets and the feature order
    Presets,
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    #[arg(
        long,
        conflicts_with = "features",
        required_unless_present = "features",
        help = "Sample preset name, e.g. \"Malignant Sample\""
    )]
    pub preset: Option<String>,

    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        help = "30 comma-separated measurements in feature order"
    )]
    pub features: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    Doctor,
    Samples,
    Anonymous,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Doctor => Variant::Doctor,
            VariantArg::Samples => Variant::Samples,
            VariantArg::Anonymous => Variant::Anonymous,
        }
    }
}

/// Machine-readable form of a result for `predict --json`.
#[derive(Debug, Serialize)]
pub struct PredictionReport {
    pub label: String,
    pub confidence: String,
    pub confidence_fraction: Option<f64>,
    pub risk_level: String,
    pub explanation: String,
    pub message: String,
    pub received_at: DateTime<Utc>,
}

impl PredictionReport {
    #[must_use]
    pub fn new(result: &DiagnosticResult, scale_confidence: bool) -> Self {
        Self {
            label: result.label.to_string(),
            confidence: result.confidence.display(scale_confidence),
            confidence_fraction: result.confidence.fraction(),
            risk_level: result.risk_level.clone(),
            explanation: result.explanation.clone(),
            message: result.message.clone(),
            received_at: result.received_at,
        }
    }
}

/// `predict`: run one submission through the diagnostic flow.
///
/// # Errors
/// Returns error only if writing output fails.
pub fn run_predict<P, S>(
    args: &PredictArgs,
    config: &AppConfig,
    service: &DiagnosticService<P>,
    session: &mut Session<S>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<u8>
where
    P: Predictor,
    S: CredentialStore,
    S::Error: Into<StoreError>,
{
    let guard = SessionGuard::new(config.flow);
    if guard.check(session.is_authenticated(), View::Diagnosis) == GuardDecision::RedirectToLogin {
        writeln!(err, "Login required. Run `cancerai login --email <EMAIL>` first.")?;
        return Ok(EXIT_LOGIN_REQUIRED);
    }

    let mut flow = DiagnosticFlow::new(config.flow);

    if let Some(name) = &args.preset {
        let Some(preset) = find_preset(name).or_else(|| find_preset(&format!("{name} Sample")))
        else {
            writeln!(err, "Unknown preset {name:?}. Run `cancerai presets` for the list.")?;
            return Ok(EXIT_FAILURE);
        };
        if !flow.load_preset(preset) {
            writeln!(err, "Sample presets are not available in the {} variant.", config.variant)?;
            return Ok(EXIT_FAILURE);
        }
    } else {
        if args.features.len() > FEATURE_COUNT {
            writeln!(
                err,
                "{INVALID_FEATURES_MESSAGE} Got {} values.",
                args.features.len()
            )?;
            return Ok(EXIT_FAILURE);
        }
        for (i, value) in args.features.iter().enumerate() {
            flow.set_field(i, value.as_str());
        }
    }

    let completion = match service.run(&mut flow, session) {
        Ok(completion) => completion,
        Err(SubmitError::Invalid(e)) => {
            writeln!(err, "{e}")?;
            let names = e.field_names();
            if !names.is_empty() {
                writeln!(err, "Invalid or missing: {}", names.join(", "))?;
            }
            return Ok(EXIT_FAILURE);
        }
        Err(SubmitError::LoginRequired) => {
            writeln!(err, "{}", SubmitError::LoginRequired)?;
            return Ok(EXIT_LOGIN_REQUIRED);
        }
        Err(e @ SubmitError::Busy) => {
            writeln!(err, "{e}")?;
            return Ok(EXIT_FAILURE);
        }
    };

    if completion == Completion::AuthorizationLost {
        writeln!(err, "Your session has expired. Please log in again.")?;
        return Ok(EXIT_LOGIN_REQUIRED);
    }

    let Some(result) = flow.result() else {
        writeln!(err, "No result was produced.")?;
        return Ok(EXIT_FAILURE);
    };

    let scale = config.flow.scale_confidence;
    if args.json {
        serde_json::to_writer_pretty(&mut *out, &PredictionReport::new(result, scale))?;
        writeln!(out)?;
    } else {
        write_result(out, result, scale)?;
    }

    Ok(if result.is_error() {
        EXIT_FAILURE
    } else {
        EXIT_OK
    })
}

fn write_result(out: &mut impl Write, result: &DiagnosticResult, scale: bool) -> std::io::Result<()> {
    writeln!(out, "Diagnosis:   {}", result.label)?;
    if result.is_error() {
        return writeln!(out, "Message:     {}", result.message);
    }
    writeln!(out, "Confidence:  {}", result.confidence.display(scale))?;
    writeln!(out, "Risk level:  {}", result.risk_level)?;
    writeln!(out, "Explanation: {}", result.explanation)?;
    if result.message != result.explanation {
        writeln!(out, "Message:     {}", result.message)?;
    }
    Ok(())
}

/// `login`: read the password from `input` and begin a session.
///
/// # Errors
/// Returns error if reading input or writing output fails.
pub fn run_login<A, S>(
    args: &LoginArgs,
    auth: &AuthService<A>,
    session: &mut Session<S>,
    input: &mut impl BufRead,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<u8>
where
    A: AuthApi,
    S: CredentialStore,
    S::Error: Into<StoreError>,
{
    let mut line = Zeroizing::new(String::new());
    input.read_line(&mut line)?;
    let password = Zeroizing::new(line.trim_end_matches(['\r', '\n']).to_string());

    match auth.login(session, &args.email, password) {
        Ok(()) => {
            writeln!(out, "Logged in as {}", args.email.trim())?;
            Ok(EXIT_OK)
        }
        Err(e) if session.is_authenticated() => {
            writeln!(err, "Logged in, but the token could not be saved: {e}")?;
            Ok(EXIT_FAILURE)
        }
        Err(e) => {
            writeln!(err, "{e}")?;
            Ok(EXIT_FAILURE)
        }
    }
}

/// `logout`: drop the stored credential.
///
/// # Errors
/// Returns error if writing output fails.
pub fn run_logout<S>(session: &mut Session<S>, out: &mut impl Write, err: &mut impl Write) -> Result<u8>
where
    S: CredentialStore,
    S::Error: Into<StoreError>,
{
    match logout(session) {
        Ok(()) => {
            writeln!(out, "Logged out.")?;
            Ok(EXIT_OK)
        }
        Err(e) => {
            writeln!(err, "{e}")?;
            Ok(EXIT_FAILURE)
        }
    }
}

/// `whoami`: fetch and print the current doctor's profile.
///
/// # Errors
/// Returns error if writing output fails.
pub fn run_whoami<A, S>(
    auth: &AuthService<A>,
    session: &mut Session<S>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<u8>
where
    A: AuthApi,
    S: CredentialStore,
    S::Error: Into<StoreError>,
{
    if !session.is_authenticated() {
        writeln!(err, "Not logged in.")?;
        return Ok(EXIT_LOGIN_REQUIRED);
    }
    let expires_at = session
        .credential()
        .and_then(|c| c.claims())
        .and_then(|c| c.expires_at);

    match auth.load_profile(session) {
        Ok(profile) => {
            writeln!(out, "Name:    {}", profile.display_name())?;
            writeln!(out, "Email:   {}", profile.email)?;
            if let Some(license) = &profile.license_number {
                writeln!(out, "License: {license}")?;
            }
            if let Some(at) = expires_at {
                writeln!(out, "Session: valid until {}", at.format("%Y-%m-%d %H:%M UTC"))?;
            }
            Ok(EXIT_OK)
        }
        Err(e) => {
            writeln!(err, "{e}")?;
            writeln!(err, "Your session has expired. Please log in again.")?;
            Ok(EXIT_LOGIN_REQUIRED)
        }
    }
}

/// `presets`: feature order and the sample values.
///
/// # Errors
/// Returns error if writing output fails.
pub fn run_presets(out: &mut impl Write) -> Result<u8> {
    write!(out, "{:>3}  {:<24}", "#", "Feature")?;
    for preset in SAMPLE_PRESETS.iter() {
        write!(out, "  {:>16}", preset.name)?;
    }
    writeln!(out)?;

    for (i, name) in FEATURE_NAMES.iter().enumerate() {
        write!(out, "{:>3}  {:<24}", i + 1, name)?;
        for preset in SAMPLE_PRESETS.iter() {
            write!(out, "  {:>16}", preset.values[i])?;
        }
        writeln!(out)?;
    }
    Ok(EXIT_OK)
}
