//! Policy enforcer: the entry point the proxy runtime calls per flow.
//!
//! The enforcer pairs a [`DecisionEngine`] with an [`AuditRecorder`]. For
//! every flow event it evaluates the host (where a decision applies), writes
//! exactly one audit record, and returns the [`Verdict`] the runtime must
//! apply.
//!
//! # Example
//!
//! ```
//! use egress_policy::config::Mode;
//! use egress_policy::policy::{DecisionEngine, Policy};
//! use egress_policy::proxy::{Enforcer, Verdict};
//! use egress_policy::telemetry::{AuditRecorder, MemorySink};
//!
//! let engine = DecisionEngine::new(Mode::Enforce, Policy::default());
//! let enforcer = Enforcer::new(engine, AuditRecorder::new(MemorySink::new()));
//!
//! let verdict = enforcer.on_connect("bad.test", 443).unwrap();
//! assert!(verdict.is_block());
//! ```

use tracing::{debug, info};

use super::error::{StartupError, StartupResult};
use super::flow::{FlowEvent, Verdict};
use crate::config::{Mode, PolicyLoader, Settings};
use crate::policy::{DecisionEngine, Policy, ServiceCatalog, WildcardMatching};
use crate::telemetry::{AuditRecorder, TelemetryError};

/// Diagnostic recorded when starting in log mode.
pub const LOG_MODE_MESSAGE: &str = "Running in log mode (no enforcement)";

/// Decision engine plus audit recorder.
///
/// `Send + Sync`; share it behind an `Arc` across connection tasks.
#[derive(Debug)]
pub struct Enforcer {
    engine: DecisionEngine,
    recorder: AuditRecorder,
}

/// Parse a raw mode value, recording a diagnostic if it is not recognized.
pub fn parse_mode(raw: &str, recorder: &AuditRecorder) -> StartupResult<Mode> {
    match raw.parse::<Mode>() {
        Ok(mode) => Ok(mode),
        Err(e) => {
            recorder.record_info(e.to_string())?;
            Err(e.into())
        }
    }
}

impl Enforcer {
    /// Assemble an enforcer from parts.
    pub fn new(engine: DecisionEngine, recorder: AuditRecorder) -> Self {
        Self { engine, recorder }
    }

    /// Build the enforcer from startup settings.
    ///
    /// Log mode never reads the policy document. Enforce mode requires it;
    /// a missing or malformed document is recorded as a diagnostic and
    /// returned as a fatal error.
    pub fn start(
        settings: &Settings,
        catalog: &ServiceCatalog,
        recorder: AuditRecorder,
    ) -> StartupResult<Self> {
        let policy = match settings.mode {
            Mode::Log => {
                recorder.record_info(LOG_MODE_MESSAGE)?;
                Policy::default()
            }
            Mode::Enforce => load_policy(settings, catalog, &recorder)?,
        };

        if settings.wildcard_matching == WildcardMatching::LabelBoundary {
            info!("Wildcard patterns require a label boundary");
        }
        info!("Policy engine started in {} mode", settings.mode);

        let engine =
            DecisionEngine::with_matching(settings.mode, policy, settings.wildcard_matching);
        Ok(Self::new(engine, recorder))
    }

    /// Evaluate and record a flow event.
    ///
    /// Only a sink failure is an error; evaluation itself cannot fail.
    pub fn handle(&self, event: &FlowEvent) -> Result<Verdict, TelemetryError> {
        match event {
            FlowEvent::Connect { host, port } => self.on_connect(host, *port),
            FlowEvent::HttpRequest {
                method,
                host,
                port,
                path,
            } => self.on_http_request(method, host, *port, path),
            FlowEvent::HttpResponse {
                method,
                host,
                port,
                path,
                status,
            } => self.on_http_response(method, host, *port, path, *status),
            FlowEvent::Error { host, port, error } => {
                self.on_error(host, *port, error.as_deref())
            }
        }
    }

    /// CONNECT tunnel request. A blocked tunnel must not be opened.
    pub fn on_connect(&self, host: &str, port: u16) -> Result<Verdict, TelemetryError> {
        let decision = self.engine.evaluate(host);
        self.recorder.record_connect(host, port, decision)?;

        if !decision.is_allow() {
            debug!("Blocked CONNECT to {}:{}", host, port);
        }
        Ok(Verdict::for_decision(decision, host))
    }

    /// Plain HTTP request. A blocked request must not be forwarded.
    pub fn on_http_request(
        &self,
        method: &str,
        host: &str,
        port: u16,
        path: &str,
    ) -> Result<Verdict, TelemetryError> {
        let decision = self.engine.evaluate(host);
        self.recorder
            .record_http_request(method, host, port, path, decision)?;

        if !decision.is_allow() {
            debug!("Blocked {} http://{}:{}{}", method, host, port, path);
        }
        Ok(Verdict::for_decision(decision, host))
    }

    /// Completed plain HTTP exchange. Recorded only; always passes.
    pub fn on_http_response(
        &self,
        method: &str,
        host: &str,
        port: u16,
        path: &str,
        status: u16,
    ) -> Result<Verdict, TelemetryError> {
        self.recorder
            .record_http_response(method, host, port, path, status)?;
        Ok(Verdict::Pass)
    }

    /// Flow failure. Recorded only; always passes.
    pub fn on_error(
        &self,
        host: &str,
        port: u16,
        error: Option<&str>,
    ) -> Result<Verdict, TelemetryError> {
        self.recorder.record_error(host, port, error)?;
        Ok(Verdict::Pass)
    }

    /// The decision engine.
    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// The audit recorder.
    pub fn recorder(&self) -> &AuditRecorder {
        &self.recorder
    }
}

fn load_policy(
    settings: &Settings,
    catalog: &ServiceCatalog,
    recorder: &AuditRecorder,
) -> StartupResult<Policy> {
    let loader = PolicyLoader::new(&settings.policy_path);

    let document = match loader.load() {
        Ok(Some(document)) => document,
        Ok(None) => {
            let err = StartupError::MissingPolicy {
                path: settings.policy_path.clone(),
            };
            recorder.record_info(err.to_string())?;
            return Err(err);
        }
        Err(e) => {
            recorder.record_info(e.to_string())?;
            return Err(e.into());
        }
    };

    let compiled = Policy::from_document(&document, catalog);
    for message in compiled.diagnostics {
        recorder.record_info(message)?;
    }

    Ok(compiled.policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::policy::Decision;
    use crate::telemetry::{MemorySink, RecordKind};
    use std::fs;
    use tempfile::tempdir;

    fn recorder() -> (AuditRecorder, MemorySink) {
        let sink = MemorySink::new();
        (AuditRecorder::new(sink.clone()), sink)
    }

    fn info_messages(sink: &MemorySink) -> Vec<String> {
        sink.records()
            .unwrap()
            .into_iter()
            .filter_map(|r| match r.kind {
                RecordKind::Info { message } => Some(message),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_log_mode_startup() {
        let (recorder, sink) = recorder();
        let dir = tempdir().unwrap();
        let settings = Settings::new(Mode::Log).policy_path(dir.path().join("absent.yaml"));

        let enforcer = Enforcer::start(&settings, &ServiceCatalog::builtin(), recorder).unwrap();

        assert_eq!(enforcer.engine().mode(), Mode::Log);
        assert_eq!(info_messages(&sink), vec![LOG_MODE_MESSAGE.to_string()]);
    }

    #[test]
    fn test_log_mode_ignores_malformed_policy() {
        let (recorder, _sink) = recorder();
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.yaml");
        fs::write(&path, "services: [github\n").unwrap();

        let settings = Settings::new(Mode::Log).policy_path(path);
        assert!(Enforcer::start(&settings, &ServiceCatalog::builtin(), recorder).is_ok());
    }

    #[test]
    fn test_enforce_mode_missing_policy() {
        let (recorder, sink) = recorder();
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.yaml");
        let settings = Settings::new(Mode::Enforce).policy_path(&path);

        let err = Enforcer::start(&settings, &ServiceCatalog::builtin(), recorder).unwrap_err();

        assert!(matches!(err, StartupError::MissingPolicy { .. }));
        let messages = info_messages(&sink);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("PROXY_MODE=enforce but no policy file at"));
    }

    #[test]
    fn test_enforce_mode_malformed_policy() {
        let (recorder, sink) = recorder();
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.yaml");
        fs::write(&path, "domains: {").unwrap();

        let settings = Settings::new(Mode::Enforce).policy_path(path);
        let err = Enforcer::start(&settings, &ServiceCatalog::builtin(), recorder).unwrap_err();

        assert!(matches!(err, StartupError::Config(ConfigError::ParseError { .. })));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_enforce_mode_records_policy_diagnostics() {
        let (recorder, sink) = recorder();
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.yaml");
        fs::write(&path, "services: [github, nope]\ndomains: [example.org]\n").unwrap();

        let settings = Settings::new(Mode::Enforce).policy_path(path);
        let enforcer = Enforcer::start(&settings, &ServiceCatalog::builtin(), recorder).unwrap();

        assert_eq!(
            info_messages(&sink),
            vec![
                "Unknown service 'nope' in policy, skipping".to_string(),
                "Policy loaded: 3 exact domains, 2 wildcard patterns".to_string(),
            ]
        );
        assert_eq!(enforcer.engine().evaluate("example.org"), Decision::Allow);
    }

    #[test]
    fn test_parse_mode_records_unknown_value() {
        let (recorder, sink) = recorder();

        let err = parse_mode("strict", &recorder).unwrap_err();

        assert!(matches!(err, StartupError::Config(ConfigError::UnknownMode(_))));
        assert_eq!(
            info_messages(&sink),
            vec!["Unknown PROXY_MODE 'strict'. Use 'enforce' or 'log'.".to_string()]
        );
    }

    #[test]
    fn test_parse_mode_valid_values_record_nothing() {
        let (recorder, sink) = recorder();

        assert_eq!(parse_mode("log", &recorder).unwrap(), Mode::Log);
        assert_eq!(parse_mode("enforce", &recorder).unwrap(), Mode::Enforce);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_blocked_connect() {
        let (recorder, sink) = recorder();
        let enforcer = Enforcer::new(
            DecisionEngine::new(Mode::Enforce, Policy::default()),
            recorder,
        );

        let verdict = enforcer.on_connect("bad.test", 443).unwrap();

        assert!(verdict.is_block());
        let records = sink.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action(), Some(Decision::Block));
    }

    #[test]
    fn test_handle_dispatches_every_event() {
        let (recorder, sink) = recorder();
        let enforcer = Enforcer::new(DecisionEngine::new(Mode::Log, Policy::default()), recorder);

        let events = [
            FlowEvent::Connect {
                host: "a.com".to_string(),
                port: 443,
            },
            FlowEvent::HttpRequest {
                method: "GET".to_string(),
                host: "a.com".to_string(),
                port: 80,
                path: "/".to_string(),
            },
            FlowEvent::HttpResponse {
                method: "GET".to_string(),
                host: "a.com".to_string(),
                port: 80,
                path: "/".to_string(),
                status: 200,
            },
            FlowEvent::Error {
                host: "a.com".to_string(),
                port: 443,
                error: None,
            },
        ];

        for event in &events {
            assert_eq!(enforcer.handle(event).unwrap(), Verdict::Pass);
        }

        let types: Vec<_> = sink
            .records()
            .unwrap()
            .iter()
            .map(|r| r.type_name())
            .collect();
        assert_eq!(types, ["connect", "http", "http", "error"]);
    }

    #[test]
    fn test_enforcer_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Enforcer>();
    }
}
