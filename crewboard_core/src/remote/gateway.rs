use std::cell::Cell;

use serde_json::Value;
use tracing::{info, warn};

use crate::cache::DatasetCache;
use crate::config::Config;

use super::adapter::{AdapterError, RemoteAdapter, Transport};
use super::simulator::Simulator;
use super::{Action, Payload};

/// Front door for every remote call, carrying the degradation policy: a
/// failed read is answered from the in-memory simulator and never surfaces to
/// the caller, a failed write propagates untouched.
pub struct Gateway<T: Transport> {
    adapter: RemoteAdapter<T>,
    simulator: Simulator,
    demo_mode: Cell<bool>,
}

impl<T: Transport> Gateway<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        Gateway {
            adapter: RemoteAdapter::new(transport, config),
            simulator: Simulator::new(config),
            demo_mode: Cell::new(false),
        }
    }

    /// Whether the last contact with the remote store failed and reads are
    /// being answered from local data.
    pub fn demo_mode(&self) -> bool {
        self.demo_mode.get()
    }

    /// Probes connectivity, flipping demo mode to match the outcome.
    pub async fn ping(&self) -> bool {
        match self.adapter.call(Action::Ping, Payload::new()).await {
            Ok(_) => {
                self.note_success();
                true
            }
            Err(err) => {
                warn!(%err, "remote store unreachable, entering demo mode");
                self.demo_mode.set(true);
                false
            }
        }
    }

    pub async fn call(
        &self,
        action: Action,
        payload: Payload,
        cache: &DatasetCache,
    ) -> Result<Value, AdapterError> {
        match self.adapter.call(action, payload.clone()).await {
            Ok(data) => {
                self.note_success();
                Ok(data)
            }
            Err(err) if action.is_read() => {
                warn!(action = action.wire_name(), %err, "read failed, answering from demo data");
                self.demo_mode.set(true);
                Ok(self.simulator.simulate(action, &payload, cache).await)
            }
            Err(err) => Err(err),
        }
    }

    fn note_success(&self) {
        if self.demo_mode.get() {
            info!("remote store reachable again, leaving demo mode");
            self.demo_mode.set(false);
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use crate::data::employee::Employee;
    use crate::remote::envelope;
    use crate::remote::testutil::{ok_envelope, test_config, FakeTransport, StalledTransport};

    use super::*;

    #[tokio::test]
    async fn timed_out_employee_read_resolves_via_the_simulator() {
        let gateway = Gateway::new(StalledTransport, &test_config());
        let cache = DatasetCache::new();
        let data = gateway.call(Action::GetEmployees, Payload::new(), &cache).await.unwrap();
        let employees: Vec<Employee> = envelope::rows(data);
        assert_eq!(employees.len(), 2);
        assert!(gateway.demo_mode());
    }

    #[tokio::test]
    async fn failed_write_propagates_to_the_caller() {
        let gateway = Gateway::new(FakeTransport::always_down(), &test_config());
        let cache = DatasetCache::new();
        let err = gateway.call(Action::AddEmployee, Payload::new(), &cache).await.unwrap_err();
        assert!(matches!(err, AdapterError::Transport(_)));
    }

    #[tokio::test]
    async fn a_successful_call_leaves_demo_mode() {
        let transport = FakeTransport::new(|request| {
            if request.action == "ping" {
                Err(crate::remote::adapter::TransportFailure("down".to_string()))
            } else {
                Ok(ok_envelope(json!([])))
            }
        });
        let gateway = Gateway::new(transport, &test_config());
        let cache = DatasetCache::new();

        assert!(!gateway.ping().await);
        assert!(gateway.demo_mode());

        gateway.call(Action::GetReport, Payload::new(), &cache).await.unwrap();
        assert!(!gateway.demo_mode());
    }

    #[tokio::test]
    async fn ping_success_reports_connected() {
        let gateway = Gateway::new(FakeTransport::always_ok(json!("pong")), &test_config());
        assert!(gateway.ping().await);
        assert!(!gateway.demo_mode());
    }
}
