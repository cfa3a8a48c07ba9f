//! Diagnostic submission flow.
//!
//! `DiagnosticFlow` is the state machine behind the diagnosis form:
//!
//! ```text
//! Idle -> Validating -> Submitting -> Success | Failure
//!   ^__________________________________________|  (next edit)
//! ```
//!
//! It performs no I/O. `DiagnosticService` pairs it with a `Predictor` for
//! callers that can block; the TUI instead hands the `Submission` to a worker
//! thread and feeds the answer back through `complete`.

use std::sync::Arc;

use crate::adapters::StoreError;
use crate::domain::{
    Credential, DiagnosticResult, FeatureVector, FlowConfig, PredictionResponse, SamplePreset,
    ValidationError, FEATURE_COUNT, SAMPLE_PRESETS,
};
use crate::ports::{CredentialStore, PredictError, Predictor};

use super::session::Session;

/// Where the flow currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    Idle,
    Validating,
    Submitting { ticket: u64 },
    Success(DiagnosticResult),
    Failure(DiagnosticResult),
}

/// Why a submit trigger did not produce a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// A request is already in flight; the submit control is disabled.
    #[error("A diagnosis is already being analyzed")]
    Busy,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The variant needs a credential and there is none.
    #[error("Please log in to run a diagnosis")]
    LoginRequired,
}

/// A validated request ready to be sent exactly once.
#[derive(Debug, Clone)]
pub struct Submission {
    pub ticket: u64,
    pub features: FeatureVector,
    pub credential: Option<Credential>,
}

/// What the caller must do after a response is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A result is ready to render.
    Displayed,
    /// 401 on the protected flow: end the session and go to login.
    AuthorizationLost,
    /// An older submission answered late; nothing changed.
    Stale,
}

/// Form contents plus the submission state machine.
pub struct DiagnosticFlow {
    config: FlowConfig,
    values: Vec<String>,
    error: Option<String>,
    preset: Option<&'static str>,
    state: FlowState,
    latest_ticket: u64,
}

impl DiagnosticFlow {
    #[must_use]
    pub fn new(config: FlowConfig) -> Self {
        Self {
            config,
            values: vec![String::new(); FEATURE_COUNT],
            error: None,
            preset: None,
            state: FlowState::Idle,
            latest_ticket: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &FlowState {
        &self.state
    }

    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    #[must_use]
    pub fn field(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    /// Validation message for the form, if the last submit failed locally.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Name of the preset the form was last filled from.
    #[must_use]
    pub fn preset(&self) -> Option<&'static str> {
        self.preset
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        matches!(self.state, FlowState::Submitting { .. })
    }

    /// The submit control is enabled whenever nothing is in flight.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.is_submitting()
    }

    /// Result of the last completed submission.
    #[must_use]
    pub fn result(&self) -> Option<&DiagnosticResult> {
        match &self.state {
            FlowState::Success(r) | FlowState::Failure(r) => Some(r),
            _ => None,
        }
    }

    fn reset_to_idle(&mut self) {
        self.error = None;
        self.state = FlowState::Idle;
    }

    /// Replace one field. Ignored while a request is in flight.
    ///
    /// # Returns
    /// `false` if the edit was refused.
    pub fn set_field(&mut self, index: usize, value: impl Into<String>) -> bool {
        if self.is_submitting() || index >= FEATURE_COUNT {
            return false;
        }
        self.values[index] = value.into();
        self.reset_to_idle();
        true
    }

    /// Clear every field.
    pub fn clear(&mut self) -> bool {
        if self.is_submitting() {
            return false;
        }
        self.values.iter_mut().for_each(String::clear);
        self.preset = None;
        self.reset_to_idle();
        true
    }

    /// Empty the form and drop any result, including an in-flight one.
    ///
    /// The ticket counter keeps counting, so an answer to a submission made
    /// before the reset can never match a later one.
    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(String::clear);
        self.preset = None;
        self.reset_to_idle();
    }

    /// Fill the form from a preset.
    ///
    /// # Returns
    /// `false` if presets are disabled for this variant or a request is in
    /// flight.
    pub fn load_preset(&mut self, preset: &'static SamplePreset) -> bool {
        if !self.config.show_samples || self.is_submitting() {
            return false;
        }
        self.values = preset.as_form_values();
        self.preset = Some(preset.name);
        self.reset_to_idle();
        true
    }

    /// Load the preset after the current one, wrapping around.
    pub fn cycle_preset(&mut self) -> Option<&'static str> {
        let next = match self.preset {
            Some(name) => SAMPLE_PRESETS
                .iter()
                .position(|p| p.name == name)
                .map_or(0, |i| (i + 1) % SAMPLE_PRESETS.len()),
            None => 0,
        };
        let preset = &SAMPLE_PRESETS[next];
        self.load_preset(preset).then_some(preset.name)
    }

    /// Handle a submit trigger.
    ///
    /// Validates all 30 fields and, if they pass, moves to `Submitting` and
    /// returns the single request to send.
    ///
    /// # Errors
    /// `Busy` while in flight, `Invalid` when a field does not parse,
    /// `LoginRequired` when the variant needs a credential and none is given.
    pub fn submit(&mut self, credential: Option<&Credential>) -> Result<Submission, SubmitError> {
        if self.is_submitting() {
            return Err(SubmitError::Busy);
        }

        self.error = None;
        self.state = FlowState::Validating;

        let features = match FeatureVector::parse(&self.values) {
            Ok(features) => features,
            Err(err) => {
                self.state = FlowState::Idle;
                self.error = Some(err.to_string());
                return Err(SubmitError::Invalid(err));
            }
        };

        let credential = if self.config.requires_auth {
            match credential {
                Some(c) => Some(c.clone()),
                None => {
                    self.state = FlowState::Idle;
                    return Err(SubmitError::LoginRequired);
                }
            }
        } else {
            None
        };

        self.latest_ticket += 1;
        let ticket = self.latest_ticket;
        self.state = FlowState::Submitting { ticket };

        Ok(Submission {
            ticket,
            features,
            credential,
        })
    }

    /// Apply the predictor's answer for `ticket`.
    ///
    /// Only the latest submission may change displayed state.
    pub fn complete(
        &mut self,
        ticket: u64,
        outcome: Result<PredictionResponse, PredictError>,
    ) -> Completion {
        if ticket != self.latest_ticket || !self.is_submitting() {
            tracing::debug!("Ignoring stale response for submission {ticket}");
            return Completion::Stale;
        }

        let result = match outcome {
            Ok(response) => match DiagnosticResult::from_response(&response, &self.config) {
                Ok(result) => result,
                Err(err) => {
                    tracing::warn!("{err}");
                    DiagnosticResult::connection_failure()
                }
            },
            Err(PredictError::Unauthorized) if self.config.requires_auth => {
                tracing::warn!("Predictor rejected credential; ending session");
                self.state = FlowState::Idle;
                return Completion::AuthorizationLost;
            }
            Err(err) => {
                tracing::warn!("Prediction failed: {err}");
                DiagnosticResult::connection_failure()
            }
        };

        self.state = if result.is_error() {
            FlowState::Failure(result)
        } else {
            FlowState::Success(result)
        };
        Completion::Displayed
    }
}

/// Runs submissions against a predictor.
pub struct DiagnosticService<P: Predictor> {
    predictor: Arc<P>,
}

impl<P: Predictor> Clone for DiagnosticService<P> {
    fn clone(&self) -> Self {
        Self {
            predictor: self.predictor.clone(),
        }
    }
}

impl<P: Predictor> DiagnosticService<P> {
    pub fn new(predictor: Arc<P>) -> Self {
        Self { predictor }
    }

    /// Issue the one request for a submission. Safe to call from a worker.
    pub fn dispatch(&self, submission: &Submission) -> Result<PredictionResponse, PredictError> {
        tracing::info!(
            "Submitting diagnosis #{} (authenticated={})",
            submission.ticket,
            submission.credential.is_some()
        );
        let outcome = self
            .predictor
            .predict(&submission.features, submission.credential.as_ref());
        match &outcome {
            Ok(resp) => tracing::info!(
                "Prediction #{} received: label={:?} confidence={:?}",
                submission.ticket,
                resp.prediction,
                resp.confidence
            ),
            Err(err) => tracing::warn!("Prediction #{} failed: {err}", submission.ticket),
        }
        outcome
    }

    /// Submit, wait for the answer and apply it.
    ///
    /// On `AuthorizationLost` the session has already been ended when this
    /// returns.
    ///
    /// # Errors
    /// Returns the flow's [`SubmitError`] when no request was sent.
    pub fn run<S>(
        &self,
        flow: &mut DiagnosticFlow,
        session: &mut Session<S>,
    ) -> Result<Completion, SubmitError>
    where
        S: CredentialStore,
        S::Error: Into<StoreError>,
    {
        let submission = flow.submit(session.credential())?;
        let outcome = self.dispatch(&submission);
        let completion = flow.complete(submission.ticket, outcome);
        if completion == Completion::AuthorizationLost {
            if let Err(e) = session.end() {
                tracing::error!("Failed to clear credential: {e}");
            }
        }
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryCredentialStore;
    use crate::domain::{
        Label, BENIGN_RECOMMENDATION, CONNECTION_FAILURE_MESSAGE, MALIGNANT_RECOMMENDATION,
        MALIGNANT_SAMPLE,
    };
    use std::sync::Mutex;

    /// Predictor fake that records every call and replays a canned answer.
    struct FakePredictor {
        answer: Result<PredictionResponse, PredictError>,
        calls: Mutex<Vec<(Vec<f64>, Option<String>)>>,
    }

    impl FakePredictor {
        fn answering(answer: Result<PredictionResponse, PredictError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(Vec<f64>, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Predictor for FakePredictor {
        fn predict(
            &self,
            features: &FeatureVector,
            credential: Option<&Credential>,
        ) -> Result<PredictionResponse, PredictError> {
            self.calls.lock().unwrap().push((
                features.as_slice().to_vec(),
                credential.map(|c| c.expose().to_string()),
            ));
            self.answer.clone()
        }
    }

    fn benign(confidence: f64) -> PredictionResponse {
        PredictionResponse {
            prediction: Some("Benign".to_string()),
            confidence: Some(confidence),
            ..Default::default()
        }
    }

    fn logged_in() -> Session<MemoryCredentialStore> {
        let store = Arc::new(MemoryCredentialStore::with(Credential::new("tok").unwrap()));
        Session::restore(store).expect("Should restore")
    }

    fn filled_flow(config: FlowConfig) -> DiagnosticFlow {
        let mut flow = DiagnosticFlow::new(config);
        for i in 0..FEATURE_COUNT {
            flow.set_field(i, format!("{}", i + 1));
        }
        flow
    }

    #[test]
    fn test_incomplete_form_sends_nothing() {
        let predictor = FakePredictor::answering(Ok(benign(0.9)));
        let service = DiagnosticService::new(predictor.clone());
        let mut session = logged_in();

        let mut flow = filled_flow(FlowConfig::doctor());
        flow.set_field(12, "");

        let err = service.run(&mut flow, &mut session).unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(_)));
        assert_eq!(flow.error(), Some("All 30 diagnostic features must be valid numbers."));
        assert_eq!(flow.state(), &FlowState::Idle);
        assert!(predictor.calls().is_empty());
    }

    #[test]
    fn test_valid_form_sends_one_request_in_order() {
        let predictor = FakePredictor::answering(Ok(benign(0.93)));
        let service = DiagnosticService::new(predictor.clone());
        let mut session = logged_in();
        let mut flow = filled_flow(FlowConfig::doctor());

        let completion = service.run(&mut flow, &mut session).expect("Should submit");
        assert_eq!(completion, Completion::Displayed);

        let calls = predictor.calls();
        assert_eq!(calls.len(), 1);
        let expected: Vec<f64> = (1..=30).map(f64::from).collect();
        assert_eq!(calls[0].0, expected);
        assert_eq!(calls[0].1.as_deref(), Some("tok"));

        let result = flow.result().expect("Result shown");
        assert_eq!(result.label, Label::Benign);
        assert_eq!(result.confidence.display(flow.config().scale_confidence), "93%");
        assert_eq!(result.explanation, BENIGN_RECOMMENDATION);
    }

    #[test]
    fn test_anonymous_variant_omits_credential_and_scaling() {
        let predictor = FakePredictor::answering(Ok(benign(0.93)));
        let service = DiagnosticService::new(predictor.clone());
        let mut session = logged_in();
        let mut flow = filled_flow(FlowConfig::anonymous());

        service.run(&mut flow, &mut session).expect("Should submit");
        assert_eq!(predictor.calls()[0].1, None);
        let result = flow.result().unwrap();
        assert_eq!(result.confidence.display(flow.config().scale_confidence), "0.93");
    }

    #[test]
    fn test_malignant_recommendation() {
        let predictor = FakePredictor::answering(Ok(PredictionResponse {
            prediction: Some("Malignant".to_string()),
            confidence: Some(0.99),
            ..Default::default()
        }));
        let service = DiagnosticService::new(predictor);
        let mut session = logged_in();
        let mut flow = filled_flow(FlowConfig::doctor());

        service.run(&mut flow, &mut session).expect("Should submit");
        assert_eq!(flow.result().unwrap().explanation, MALIGNANT_RECOMMENDATION);
    }

    #[test]
    fn test_network_failure_shows_sentinel_and_reenables_submit() {
        let predictor =
            FakePredictor::answering(Err(PredictError::Unreachable("refused".to_string())));
        let service = DiagnosticService::new(predictor);
        let mut session = logged_in();
        let mut flow = filled_flow(FlowConfig::doctor());

        service.run(&mut flow, &mut session).expect("Should submit");
        let result = flow.result().expect("Sentinel shown");
        assert_eq!(result.label, Label::Error);
        assert_eq!(result.message, CONNECTION_FAILURE_MESSAGE);
        assert!(matches!(flow.state(), FlowState::Failure(_)));
        assert!(flow.can_submit());
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_unauthorized_clears_credential() {
        let predictor = FakePredictor::answering(Err(PredictError::Unauthorized));
        let service = DiagnosticService::new(predictor);
        let store = Arc::new(MemoryCredentialStore::with(Credential::new("tok").unwrap()));
        let mut session = Session::restore(store.clone()).unwrap();
        let mut flow = filled_flow(FlowConfig::doctor());

        let completion = service.run(&mut flow, &mut session).expect("Should submit");
        assert_eq!(completion, Completion::AuthorizationLost);
        assert!(!session.is_authenticated());
        assert!(store.load().unwrap().is_none());
        assert!(flow.result().is_none());
    }

    #[test]
    fn test_login_required_without_credential() {
        let predictor = FakePredictor::answering(Ok(benign(0.9)));
        let service = DiagnosticService::new(predictor.clone());
        let mut session = Session::empty(Arc::new(MemoryCredentialStore::new()));
        let mut flow = filled_flow(FlowConfig::doctor());

        assert_eq!(
            service.run(&mut flow, &mut session).unwrap_err(),
            SubmitError::LoginRequired
        );
        assert!(predictor.calls().is_empty());
    }

    #[test]
    fn test_submit_disabled_while_in_flight() {
        let mut flow = filled_flow(FlowConfig::samples());
        let first = flow.submit(None).expect("Should submit");
        assert!(!flow.can_submit());
        assert_eq!(flow.submit(None).unwrap_err(), SubmitError::Busy);
        assert!(!flow.set_field(0, "9"));

        assert_eq!(flow.complete(first.ticket, Ok(benign(0.8))), Completion::Displayed);
        assert!(flow.can_submit());
    }

    #[test]
    fn test_stale_ticket_ignored() {
        let mut flow = filled_flow(FlowConfig::samples());
        let first = flow.submit(None).unwrap();
        flow.complete(first.ticket, Ok(benign(0.8)));
        let second = flow.submit(None).unwrap();

        assert_eq!(flow.complete(first.ticket, Ok(benign(0.1))), Completion::Stale);
        assert!(flow.is_submitting());
        assert_eq!(flow.complete(second.ticket, Ok(benign(0.95))), Completion::Displayed);
        assert_eq!(flow.result().unwrap().confidence.fraction(), Some(0.95));
    }

    #[test]
    fn test_reset_keeps_ticket_order() {
        let mut flow = filled_flow(FlowConfig::doctor());
        let old = flow.submit(Some(&Credential::new("old").unwrap())).unwrap();

        flow.reset();
        assert_eq!(flow.state(), &FlowState::Idle);
        assert!(flow.values().iter().all(String::is_empty));
        assert_eq!(flow.preset(), None);

        for i in 0..FEATURE_COUNT {
            flow.set_field(i, "2.5");
        }
        let new = flow.submit(Some(&Credential::new("new").unwrap())).unwrap();
        assert!(new.ticket > old.ticket);

        assert_eq!(
            flow.complete(old.ticket, Err(PredictError::Unauthorized)),
            Completion::Stale
        );
        assert!(flow.is_submitting());
        assert_eq!(flow.complete(new.ticket, Ok(benign(0.9))), Completion::Displayed);
    }

    #[test]
    fn test_edit_clears_result() {
        let mut flow = filled_flow(FlowConfig::samples());
        let s = flow.submit(None).unwrap();
        flow.complete(s.ticket, Ok(benign(0.8)));
        assert!(flow.result().is_some());

        flow.set_field(0, "2");
        assert_eq!(flow.state(), &FlowState::Idle);
        assert!(flow.result().is_none());
    }

    #[test]
    fn test_malignant_preset_fills_literal_values() {
        let mut flow = DiagnosticFlow::new(FlowConfig::doctor());
        assert!(flow.load_preset(&MALIGNANT_SAMPLE));
        let parsed = FeatureVector::parse(flow.values()).unwrap();
        assert_eq!(
            parsed.as_slice(),
            &[
                17.99, 10.38, 122.8, 1001.0, 0.1184, 0.2776, 0.3001, 0.1471, 0.2419, 0.07871,
                1.095, 0.9053, 8.589, 153.4, 0.006399, 0.04904, 0.05373, 0.01587, 0.03003,
                0.006193, 25.38, 17.33, 184.6, 2019.0, 0.1622, 0.6656, 0.7119, 0.2654, 0.4601,
                0.1189,
            ][..]
        );
        assert_eq!(flow.preset(), Some("Malignant Sample"));
    }

    #[test]
    fn test_presets_disabled_for_anonymous() {
        let mut flow = DiagnosticFlow::new(FlowConfig::anonymous());
        assert!(!flow.load_preset(&MALIGNANT_SAMPLE));
        assert!(flow.cycle_preset().is_none());
        assert!(flow.values().iter().all(String::is_empty));
    }

    #[test]
    fn test_cycle_preset_wraps() {
        let mut flow = DiagnosticFlow::new(FlowConfig::samples());
        assert_eq!(flow.cycle_preset(), Some("Benign Sample"));
        assert_eq!(flow.cycle_preset(), Some("Malignant Sample"));
        assert_eq!(flow.cycle_preset(), Some("Benign Sample"));
    }

    #[test]
    fn test_server_error_field_is_failure() {
        let mut flow = filled_flow(FlowConfig::doctor());
        let cred = Credential::new("tok").unwrap();
        let s = flow.submit(Some(&cred)).unwrap();
        let resp = PredictionResponse {
            error: Some("Exactly 30 features required".to_string()),
            ..Default::default()
        };
        flow.complete(s.ticket, Ok(resp));
        match flow.state() {
            FlowState::Failure(r) => assert_eq!(r.message, "Exactly 30 features required"),
            other => panic!("unexpected state {other:?}"),
        }
    }
}
