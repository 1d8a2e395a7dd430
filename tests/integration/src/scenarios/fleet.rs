//! Coordinator-driven run scenarios.
//!
//! Each scenario stands a fleet up over the mock connector and feeds the
//! recorded traffic to a worker stand-in, so fleet management and test
//! execution are exercised together the way a real run wires them.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use flotilla_fleet::connector::MockConnector;
    use flotilla_fleet::{AgentLayout, FleetClient, FleetConfig, FleetLayout, Registry};
    use flotilla_protocol::{
        Address, Operation, TestCase, TestPhase, TestSuite, WorkerKind, WorkerSettings,
    };

    use crate::fixtures::CounterStorm;
    use crate::worker_sim::WorkerSim;

    fn two_agent_layout() -> FleetLayout {
        FleetLayout::new()
            .with_agent(
                AgentLayout::new(Address::agent(1))
                    .with_worker(WorkerSettings::new(1, WorkerKind::Member))
                    .with_worker(WorkerSettings::new(2, WorkerKind::Client)),
            )
            .with_agent(
                AgentLayout::new(Address::agent(2))
                    .with_worker(WorkerSettings::new(1, WorkerKind::Member))
                    .with_worker(WorkerSettings::new(2, WorkerKind::Client)),
            )
    }

    fn coordinator(config: &FleetConfig) -> (MockConnector, FleetClient<MockConnector>) {
        let connector = MockConnector::new();
        connector.register_agent(Address::agent(1));
        connector.register_agent(Address::agent(2));
        let registry = Arc::new(Registry::new());
        registry.add_agent("10.0.0.1");
        registry.add_agent("10.0.0.2");
        let client = FleetClient::new(Arc::new(connector.clone()), registry, config);
        (connector, client)
    }

    fn first_position(sent: &[(Address, Operation)], name: &str) -> usize {
        sent.iter()
            .position(|(_, operation)| operation.name() == name)
            .unwrap_or_else(|| panic!("no {name} was sent"))
    }

    /// One complete run: workers up, suite in, a test through every phase,
    /// workers down, with the stand-in executing what actually went over
    /// the wire.
    #[tokio::test]
    async fn full_run_executes_over_recorded_traffic() {
        let config = FleetConfig {
            ping_interval_ms: 5,
            ..FleetConfig::default()
        };
        let (connector, client) = coordinator(&config);
        let mut sim = WorkerSim::new();
        sim.register::<CounterStorm>("counter_storm");

        client.create_workers(&two_agent_layout(), true).await.unwrap();
        assert_eq!(client.registry().worker_count(), 4);
        assert!(client.is_ping_loop_running().await);

        let case = TestCase::new("counter-storm", "counter_storm")
            .with_property("key_range", "4")
            .with_property("target_increments", "200")
            .with_property("thread_count", "2");
        let suite = TestSuite::new("nightly").with_test_case(case.clone());
        client.init_test_suite(&suite).await.unwrap();

        let mark = connector.sent_count();
        let data = client.create_test(&case).await.unwrap();
        sim.replay(&connector.sent()[mark..]).unwrap();
        assert!(sim.container(data.test_index).is_some());

        for phase in TestPhase::ALL {
            let mark = connector.sent_count();
            client.start_test_phase("counter-storm", phase).await.unwrap();
            sim.replay(&connector.sent()[mark..]).unwrap();
        }

        let container = sim.container(data.test_index).unwrap();
        assert!(container.iterations() >= 200);
        assert!(container.started_at_millis() > 0);
        assert!(!container.is_running());

        client.terminate_workers(true).await.unwrap();
        assert!(!client.is_ping_loop_running().await);

        let sent = connector.sent();
        assert!(
            first_position(&sent, "StartTimeoutDetection") < first_position(&sent, "InitTestSuite")
        );
        assert!(first_position(&sent, "InitTestSuite") < first_position(&sent, "CreateTest"));
        assert!(first_position(&sent, "CreateTest") < first_position(&sent, "StartTestPhase"));
        assert!(
            first_position(&sent, "StopTimeoutDetection") < first_position(&sent, "TerminateWorker")
        );

        // Global phases pin the designated first worker; the rest fan out.
        let phase_destinations: Vec<Address> = sent
            .iter()
            .filter(|(_, operation)| matches!(operation, Operation::StartTestPhase(_)))
            .map(|(destination, _)| *destination)
            .collect();
        assert_eq!(phase_destinations.len(), 8);
        for (position, destination) in phase_destinations.iter().enumerate() {
            let expected = match position {
                2 | 5 | 7 => Address::test(1, 1, data.test_index),
                _ => Address::test(0, 0, data.test_index),
            };
            assert_eq!(*destination, expected);
        }

        // Clients go down before members, in address order within a pass.
        let terminations: Vec<Address> = sent
            .iter()
            .filter(|(_, operation)| matches!(operation, Operation::TerminateWorker))
            .map(|(destination, _)| *destination)
            .collect();
        assert_eq!(
            terminations,
            vec![
                Address::worker(1, 2),
                Address::worker(2, 2),
                Address::worker(1, 1),
                Address::worker(2, 1),
            ]
        );
    }

    /// Two tests created on the same fleet get distinct indices and their
    /// wire operations land on their own containers.
    #[tokio::test]
    async fn two_tests_multiplex_one_fleet() {
        let (connector, client) = coordinator(&FleetConfig::default());
        let mut sim = WorkerSim::new();
        sim.register::<CounterStorm>("counter_storm");

        client.create_workers(&two_agent_layout(), false).await.unwrap();

        let short = TestCase::new("short-storm", "counter_storm")
            .with_property("target_increments", "50")
            .with_property("thread_count", "1");
        let long = TestCase::new("long-storm", "counter_storm")
            .with_property("key_range", "2")
            .with_property("target_increments", "120")
            .with_property("thread_count", "1");

        let mark = connector.sent_count();
        let first = client.create_test(&short).await.unwrap();
        let second = client.create_test(&long).await.unwrap();
        sim.replay(&connector.sent()[mark..]).unwrap();
        assert_ne!(first.test_index, second.test_index);

        for phase in [TestPhase::Setup, TestPhase::Run, TestPhase::LocalVerify] {
            for test_id in ["short-storm", "long-storm"] {
                let mark = connector.sent_count();
                client.start_test_phase(test_id, phase).await.unwrap();
                sim.replay(&connector.sent()[mark..]).unwrap();
            }
        }

        assert!(sim.container(first.test_index).unwrap().iterations() >= 50);
        assert!(sim.container(second.test_index).unwrap().iterations() >= 120);
    }

    /// A stop sent over the wire winds down a run that would otherwise go
    /// on forever.
    #[tokio::test]
    async fn stop_test_winds_down_a_live_run() {
        let (connector, client) = coordinator(&FleetConfig::default());
        let mut sim = WorkerSim::new();
        sim.register::<CounterStorm>("counter_storm");

        client.create_workers(&two_agent_layout(), false).await.unwrap();

        // target_increments 0: the run only ends when told to.
        let case = TestCase::new("endless-storm", "counter_storm")
            .with_property("key_range", "8")
            .with_property("target_increments", "0")
            .with_property("thread_count", "2");
        let mark = connector.sent_count();
        let data = client.create_test(&case).await.unwrap();
        sim.replay(&connector.sent()[mark..]).unwrap();
        sim.run_phase(data.test_index, TestPhase::Setup).unwrap();

        let sim = Arc::new(sim);
        let runner = {
            let sim = Arc::clone(&sim);
            let test_index = data.test_index;
            tokio::task::spawn_blocking(move || sim.run_phase(test_index, TestPhase::Run))
        };
        while !sim.container(data.test_index).unwrap().is_running() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        client.stop_test("endless-storm").await.unwrap();
        let (destination, operation) = connector.sent().last().cloned().unwrap();
        assert!(matches!(operation, Operation::StopTest));
        sim.stop_test(destination.test_index()).unwrap();

        runner.await.unwrap().unwrap();
        let container = sim.container(data.test_index).unwrap();
        assert!(!container.is_running());
        assert!(container.iterations() > 0);
        sim.run_phase(data.test_index, TestPhase::LocalVerify).unwrap();
    }
}
