//! Main TUI application state machine.
//!
//! Handles:
//! - Guarded screen navigation
//! - Input event handling
//! - Network calls via background workers

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::{HttpApi, StoreError};
use crate::application::auth::{finish_login, finish_profile, logout};
use crate::application::{
    AuthService, Completion, DiagnosticFlow, DiagnosticService, GuardDecision, Session,
    SessionGuard, SubmitError, View,
};
use crate::config::AppConfig;
use crate::ports::CredentialStore;

use super::ui::{
    dashboard::{render_dashboard, DashboardView},
    diagnosis::{accepts, render_diagnosis, DiagnosisCursor},
    login::{render_login, LoginFormState},
    register::{render_register, RegisterFormState},
    render_disclaimer,
};
use super::worker::{Worker, WorkerEvent, WorkerHandle, WorkerPoll};

const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
const LOGIN_REQUIRED: &str = "Please log in to continue.";

/// Main application state
pub struct App<S: CredentialStore> {
    /// Current screen
    view: View,

    /// Whether the app should quit
    should_quit: bool,

    config: AppConfig,
    guard: SessionGuard,
    session: Session<S>,

    auth: AuthService<HttpApi>,
    diagnostics: DiagnosticService<HttpApi>,

    flow: DiagnosticFlow,
    cursor: DiagnosisCursor,
    login_state: LoginFormState,
    register_state: RegisterFormState,
    profile_loading: bool,
    /// Bumped whenever the signed-in account changes; profile answers for an
    /// older generation are dropped.
    session_generation: u64,

    /// Running background requests
    pending: Vec<WorkerHandle<WorkerEvent>>,

    /// Frame counter for the spinner
    tick: usize,
}

impl<S> App<S>
where
    S: CredentialStore + 'static,
    S::Error: Into<StoreError>,
{
    /// Create application with injected dependencies.
    ///
    /// `main.rs` builds the HTTP client and the restored session; the app
    /// only wires them to the screens.
    pub fn new(config: AppConfig, session: Session<S>, api: Arc<HttpApi>) -> Self {
        Self {
            view: View::Login,
            should_quit: false,
            guard: SessionGuard::new(config.flow),
            flow: DiagnosticFlow::new(config.flow),
            config,
            session,
            auth: AuthService::new(api.clone()),
            diagnostics: DiagnosticService::new(api),
            cursor: DiagnosisCursor::default(),
            login_state: LoginFormState::default(),
            register_state: RegisterFormState::default(),
            profile_loading: false,
            session_generation: 0,
            pending: Vec::new(),
            tick: 0,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        self.navigate(self.home());

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.poll_workers();
            self.tick = self.tick.wrapping_add(1);

            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                let content_area = chunks[0];
                let disclaimer_area = chunks[1];

                match self.view {
                    View::Login => render_login(
                        f,
                        content_area,
                        &self.login_state,
                        !self.config.flow.requires_auth,
                    ),
                    View::Register => render_register(f, content_area, &self.register_state),
                    View::Dashboard => {
                        let view = DashboardView {
                            profile: self.session.profile(),
                            claims: self.session.credential().and_then(|c| c.claims()),
                            flow: &self.config.flow,
                            api_url: &self.config.api_url,
                            loading: self.profile_loading,
                            now: Utc::now(),
                        };
                        render_dashboard(f, content_area, &view);
                    }
                    View::Diagnosis => {
                        render_diagnosis(f, content_area, &self.flow, self.cursor, self.tick / 4)
                    }
                }

                render_disclaimer(f, disclaimer_area);
            })?;

            // Handle input (short poll to stay responsive)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// First screen after start-up.
    fn home(&self) -> View {
        if self.config.flow.requires_auth {
            View::Dashboard
        } else {
            View::Diagnosis
        }
    }

    /// Every screen change goes through the guard.
    fn navigate(&mut self, requested: View) {
        match self
            .guard
            .check(self.session.is_authenticated(), requested)
        {
            GuardDecision::Render(view) => {
                self.view = view;
                self.on_enter(view);
            }
            GuardDecision::RedirectToLogin => {
                tracing::info!("{requested:?} requires login; redirecting");
                if self.login_state.notice.is_none() {
                    self.login_state.notice = Some(LOGIN_REQUIRED.to_string());
                }
                self.view = View::Login;
            }
        }
    }

    fn on_enter(&mut self, view: View) {
        if view == View::Dashboard && self.session.profile().is_none() {
            self.request_profile();
        }
    }

    /// Forget requests made on behalf of the previous account.
    fn leave_session(&mut self) {
        self.session_generation += 1;
        self.profile_loading = false;
        self.flow.reset();
    }

    /// Drop the session and show the login screen with `notice`.
    fn force_login(&mut self, notice: &str) {
        if let Err(e) = self.session.end() {
            tracing::error!("Failed to clear credential: {e}");
        }
        self.leave_session();
        self.login_state.reset();
        self.login_state.notice = Some(notice.to_string());
        self.navigate(View::Login);
    }

    fn spawn(&mut self, task: impl FnOnce() -> WorkerEvent + Send + 'static) {
        self.pending.push(Worker::spawn(task));
    }

    /// Poll background workers and apply finished results.
    fn poll_workers(&mut self) {
        let mut finished = Vec::new();
        self.pending.retain(|worker| match worker.poll() {
            WorkerPoll::Pending => true,
            WorkerPoll::Ready(event) => {
                finished.push(Some(event));
                false
            }
            WorkerPoll::Lost => {
                finished.push(None);
                false
            }
        });

        for event in finished {
            match event {
                Some(event) => self.handle_event(event),
                None => {
                    tracing::error!("Background request ended without a result");
                    self.login_state.busy = false;
                    self.register_state.busy = false;
                    self.profile_loading = false;
                }
            }
        }
    }

    fn handle_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Login(outcome) => {
                self.login_state.busy = false;
                if outcome.is_ok() {
                    self.leave_session();
                }
                match finish_login(&mut self.session, outcome) {
                    Ok(()) => {
                        self.login_state.reset();
                        self.login_state.notice = None;
                        self.navigate(View::Dashboard);
                    }
                    Err(e) if self.session.is_authenticated() => {
                        // Logged in for this run only.
                        tracing::warn!("Credential not persisted: {e}");
                        self.login_state.reset();
                        self.navigate(View::Dashboard);
                    }
                    Err(e) => self.login_state.error = Some(e.to_string()),
                }
            }
            WorkerEvent::Register(outcome) => {
                self.register_state.busy = false;
                match outcome {
                    Ok(message) => {
                        self.register_state.reset();
                        self.login_state.notice = Some(message);
                        self.navigate(View::Login);
                    }
                    Err(e) => self.register_state.error = Some(e.to_string()),
                }
            }
            WorkerEvent::Profile {
                generation,
                outcome,
            } => {
                if generation != self.session_generation {
                    tracing::debug!("Ignoring profile answer from an earlier session");
                    return;
                }
                self.profile_loading = false;
                if finish_profile(&mut self.session, outcome).is_err() {
                    self.force_login(SESSION_EXPIRED);
                }
            }
            WorkerEvent::Prediction { ticket, outcome } => {
                match self.flow.complete(ticket, outcome) {
                    Completion::AuthorizationLost => self.force_login(SESSION_EXPIRED),
                    Completion::Displayed | Completion::Stale => {}
                }
            }
        }
    }

    fn request_profile(&mut self) {
        let Some(credential) = self.session.credential().cloned() else {
            return;
        };
        if self.profile_loading {
            return;
        }
        self.profile_loading = true;
        let auth = self.auth.clone();
        let generation = self.session_generation;
        self.spawn(move || WorkerEvent::Profile {
            generation,
            outcome: auth.request_profile(&credential),
        });
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.view {
            View::Login => self.handle_login_key(key),
            View::Register => self.handle_register_key(key),
            View::Dashboard => self.handle_dashboard_key(key),
            View::Diagnosis => self.handle_diagnosis_key(key, modifiers),
        }
    }

    fn handle_login_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down | KeyCode::Up => self.login_state.next_field(),
            KeyCode::Backspace => self.login_state.delete_char(),
            KeyCode::Char(c) => self.login_state.input_char(c),
            KeyCode::F(2) if !self.login_state.busy => {
                self.register_state.reset();
                self.navigate(View::Register);
            }
            KeyCode::F(3) if !self.config.flow.requires_auth => self.navigate(View::Diagnosis),
            KeyCode::Enter if !self.login_state.busy => {
                let (email, password) = self.login_state.take_request();
                let auth = self.auth.clone();
                self.spawn(move || WorkerEvent::Login(auth.request_login(&email, password)));
            }
            _ => {}
        }
    }

    fn handle_register_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc if !self.register_state.busy => self.navigate(View::Login),
            KeyCode::Tab | KeyCode::Down => self.register_state.next_field(),
            KeyCode::Up => self.register_state.prev_field(),
            KeyCode::Backspace => self.register_state.delete_char(),
            KeyCode::Char(c) => self.register_state.input_char(c),
            KeyCode::Enter if !self.register_state.busy => {
                let registration = self.register_state.take_registration();
                let auth = self.auth.clone();
                self.spawn(move || WorkerEvent::Register(auth.register(&registration)));
            }
            _ => {}
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('n') | KeyCode::Char('N') => self.navigate(View::Diagnosis),
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_profile(),
            KeyCode::Char('l') | KeyCode::Char('L') => {
                if let Err(e) = logout(&mut self.session) {
                    tracing::error!("Logout could not clear stored credential: {e}");
                }
                self.leave_session();
                self.login_state.notice = Some("You have been logged out.".to_string());
                self.navigate(View::Login);
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_diagnosis_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        let index = self.cursor.selected;
        match key {
            KeyCode::Esc => {
                let back = if self.session.is_authenticated() {
                    View::Dashboard
                } else {
                    View::Login
                };
                self.navigate(back);
            }
            KeyCode::Up => self.cursor.up(),
            KeyCode::Down | KeyCode::Tab => self.cursor.down(),
            KeyCode::Left => self.cursor.left(),
            KeyCode::Right => self.cursor.right(),
            KeyCode::Char('x') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.flow.clear();
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                if let Some(name) = self.flow.cycle_preset() {
                    tracing::debug!("Loaded preset {name}");
                }
            }
            KeyCode::Char(c) if accepts(c) => {
                let mut value = self.flow.field(index).to_string();
                value.push(c);
                self.flow.set_field(index, value);
            }
            KeyCode::Backspace => {
                let mut value = self.flow.field(index).to_string();
                value.pop();
                self.flow.set_field(index, value);
            }
            KeyCode::Delete => {
                self.flow.set_field(index, String::new());
            }
            KeyCode::Enter => self.submit_diagnosis(),
            _ => {}
        }
    }

    fn submit_diagnosis(&mut self) {
        match self.flow.submit(self.session.credential()) {
            Ok(submission) => {
                let service = self.diagnostics.clone();
                self.spawn(move || WorkerEvent::Prediction {
                    ticket: submission.ticket,
                    outcome: service.dispatch(&submission),
                });
            }
            Err(SubmitError::LoginRequired) => self.force_login(LOGIN_REQUIRED),
            Err(SubmitError::Busy) => {}
            Err(SubmitError::Invalid(err)) => {
                tracing::debug!("Form rejected: {:?}", err.field_names());
            }
        }
    }
}
