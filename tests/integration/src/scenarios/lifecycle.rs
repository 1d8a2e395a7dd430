//! Wire-delivered lifecycle scenarios.
//!
//! These scenarios push individual recorded operations at the worker
//! stand-in and pin down how execution outcomes come back: structural
//! problems at creation, failures and faults by phase, unknown targets.

#[cfg(test)]
mod tests {
    use flotilla_harness::{Configurable, IllegalTest, LoadTest, Scope, TestError, TestPlan};
    use flotilla_protocol::{
        Address, CreateTest, Operation, StartTestPhase, TestCase, TestPhase, ALL_WORKERS,
    };

    use crate::fixtures::CounterStorm;
    use crate::worker_sim::{SimError, WorkerSim};

    fn create_operation(test_index: u32, case: &TestCase) -> Operation {
        Operation::CreateTest(CreateTest {
            test_index,
            test_case: case.clone(),
        })
    }

    fn phase_operation(phase: TestPhase) -> Operation {
        Operation::StartTestPhase(StartTestPhase { phase })
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// A test type no worker registered is rejected at creation.
    #[test]
    fn unregistered_type_is_rejected_at_creation() {
        let mut sim = WorkerSim::new();
        let case = TestCase::new("mystery", "unregistered_type");

        let err = sim
            .apply(ALL_WORKERS, &create_operation(1, &case))
            .unwrap_err();

        match err {
            SimError::Illegal(IllegalTest::UnknownTestType { name }) => {
                assert_eq!(name, "unregistered_type");
            }
            other => panic!("Expected UnknownTestType, got {other:?}"),
        }
    }

    /// A property nothing consumes fails creation before any phase runs.
    #[test]
    fn unused_property_fails_creation() {
        let mut sim = WorkerSim::new();
        sim.register::<CounterStorm>("counter_storm");
        let case = TestCase::new("typo-storm", "counter_storm")
            .with_property("target_increments", "10")
            .with_property("keyRange", "4");

        let err = sim
            .apply(ALL_WORKERS, &create_operation(1, &case))
            .unwrap_err();

        match err {
            SimError::Illegal(IllegalTest::UnusedProperties { names }) => {
                assert_eq!(names, vec!["keyRange".to_string()]);
            }
            other => panic!("Expected UnusedProperties, got {other:?}"),
        }
        assert!(sim.container(1).is_none());
    }

    // =========================================================================
    // Execution outcomes
    // =========================================================================

    /// Verification that reads the wrong totals.
    #[derive(Default)]
    struct BrokenScale;
    impl Configurable for BrokenScale {}
    impl LoadTest for BrokenScale {
        fn plan(plan: &mut TestPlan<Self>) {
            plan.run(|_| Ok(())).verify(Scope::Local, |_| {
                Err(TestError::Failed("read 9 entries, expected 10".to_string()))
            });
        }
    }

    /// A failing verification comes back as a failure, not a fault.
    #[test]
    fn reported_failures_keep_their_category() {
        let mut sim = WorkerSim::new();
        sim.register::<BrokenScale>("broken_scale");
        let case = TestCase::new("broken-scale", "broken_scale");
        sim.apply(ALL_WORKERS, &create_operation(1, &case)).unwrap();

        sim.apply(Address::test(0, 0, 1), &phase_operation(TestPhase::Run))
            .unwrap();
        let err = sim
            .apply(Address::test(0, 0, 1), &phase_operation(TestPhase::LocalVerify))
            .unwrap_err();

        match err {
            SimError::Phase {
                test_id,
                phase,
                source: TestError::Failed(message),
            } => {
                assert_eq!(test_id, "broken-scale");
                assert_eq!(phase, TestPhase::LocalVerify);
                assert_eq!(message, "read 9 entries, expected 10");
            }
            other => panic!("Expected a failed verification, got {other:?}"),
        }
    }

    /// Run body that panics outright.
    #[derive(Default)]
    struct Grenade;
    impl Configurable for Grenade {}
    impl LoadTest for Grenade {
        fn plan(plan: &mut TestPlan<Self>) {
            plan.run(|_| panic!("pin pulled"));
        }
    }

    /// A panic inside test code comes back as a fault with its message.
    #[test]
    fn panics_keep_their_category() {
        let mut sim = WorkerSim::new();
        sim.register::<Grenade>("grenade");
        let case = TestCase::new("grenade", "grenade");
        sim.apply(ALL_WORKERS, &create_operation(1, &case)).unwrap();

        let err = sim
            .apply(Address::test(0, 0, 1), &phase_operation(TestPhase::Run))
            .unwrap_err();

        match err {
            SimError::Phase {
                phase,
                source: TestError::Fault(message),
                ..
            } => {
                assert_eq!(phase, TestPhase::Run);
                assert_eq!(message, "pin pulled");
            }
            other => panic!("Expected a fault, got {other:?}"),
        }
    }

    // =========================================================================
    // Addressing
    // =========================================================================

    /// A phase addressed at an index nothing created names that index.
    #[test]
    fn unknown_test_index_is_named() {
        let sim = WorkerSim::new();

        let err = sim.run_phase(7, TestPhase::Setup).unwrap_err();

        match err {
            SimError::UnknownTest { test_index } => assert_eq!(test_index, 7),
            other => panic!("Expected UnknownTest, got {other:?}"),
        }
    }

    /// A stop that lands before the run phase makes the run a no-op.
    #[test]
    fn stop_before_run_is_honored() {
        let mut sim = WorkerSim::new();
        sim.register::<CounterStorm>("counter_storm");
        let case = TestCase::new("early-stop", "counter_storm")
            .with_property("target_increments", "0")
            .with_property("thread_count", "2");

        sim.replay(&[
            (ALL_WORKERS, create_operation(1, &case)),
            (Address::test(0, 0, 1), Operation::StopTest),
            (Address::test(0, 0, 1), phase_operation(TestPhase::Run)),
        ])
        .unwrap();

        let container = sim.container(1).unwrap();
        assert_eq!(container.iterations(), 0);
        assert!(!container.is_running());
    }
}
