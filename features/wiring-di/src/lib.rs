//! Named object wiring.
//!
//! Entries are registered on a [DiBuilder] by name, together with the names they depend on.
//! Building validates the dependency graph, then constructs every entry after its dependencies.
//! The resulting [DiContainer] resolves entries by name until it is closed, which tears them
//! down in reverse wiring order.
//!
//! ```rust
//! use wiring_di::{from_fn, DiBuilder};
//!
//! #[derive(Debug)]
//! struct Greeter {
//!     greeting: std::sync::Arc<String>,
//! }
//!
//! let builder = DiBuilder::new()
//!     .add_instance("greeting", String::from("hello"))
//!     .add_factory(
//!         "greeter",
//!         &["greeting"],
//!         from_fn(|di| Ok(Greeter { greeting: di.require("greeting")? })),
//!     );
//!
//! let container = futures::executor::block_on(builder.build()).unwrap();
//! assert_eq!(*container.require::<Greeter>("greeter").unwrap().greeting, "hello");
//! container.close().unwrap();
//! ```

pub mod builder;
pub mod container;
pub mod dependency_graph;
pub mod errors;
pub mod factories;
pub mod initiator;
pub mod latch;
pub mod timer;
pub mod types;

pub use builder::DiBuilder;
pub use container::{DiContainer, TeardownFailure, TeardownReport};
pub use dependency_graph::{DependencyGraph, DependencyGraphError, DependencyGraphErrors};
pub use errors::{CloseError, InitError, InjectError, RequireError};
pub use factories::{from_fn, DynFactory, FnFactory, InstanceFactory};
pub use initiator::DiHandle;
pub use latch::OneShotLatch;
pub use types::{DynError, Injectable, Instance, TypeInfo};

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc, Barrier, Mutex,
        },
        thread,
        time::Duration,
    };

    use futures::executor::block_on;

    use super::*;

    type Journal = Arc<Mutex<Vec<String>>>;

    #[derive(Debug)]
    struct Named(String);

    /// Factory recording construction and teardown in a shared journal
    fn recorded(journal: &Journal, name: &'static str) -> impl InstanceFactory<Provides = Named> {
        let on_construct = journal.clone();
        let on_teardown = journal.clone();
        from_fn(move |di: &DiHandle| {
            on_construct.lock().unwrap().push(format!("wire {name}"));
            // Every declared dependency must already be wired
            for (dependency, _) in di.dependencies() {
                assert!(on_construct
                    .lock()
                    .unwrap()
                    .contains(&format!("wire {dependency}")));
            }
            Ok(Named(name.to_string()))
        })
        .with_teardown(move |named: &Named| {
            on_teardown.lock().unwrap().push(format!("teardown {}", named.0));
            Ok(())
        })
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.lock().unwrap().clone()
    }

    #[test]
    fn wires_dependencies_first() {
        let journal = Journal::default();
        let container = block_on(
            DiBuilder::new()
                .add_factory("b", &["a"], recorded(&journal, "b"))
                .add_factory("a", &[], recorded(&journal, "a"))
                .build(),
        )
        .unwrap();

        assert_eq!(entries(&journal), vec!["wire a", "wire b"]);
        assert_eq!(container.names(), vec!["a", "b"]);
        assert_eq!(container.require::<Named>("b").unwrap().0, "b");
    }

    #[test]
    fn cycle_wires_nothing() {
        let journal = Journal::default();
        let result = block_on(
            DiBuilder::new()
                .add_factory("free", &[], recorded(&journal, "free"))
                .add_factory("a", &["b"], recorded(&journal, "a"))
                .add_factory("b", &["a"], recorded(&journal, "b"))
                .build(),
        );

        match result {
            Err(InitError::DependencyGraphError(errors)) => assert!(errors.has_cycle()),
            other => panic!("expected a cycle, got {other:?}"),
        }
        assert!(entries(&journal).is_empty());
    }

    #[test]
    fn missing_dependency_is_fatal() {
        let result = block_on(
            DiBuilder::new()
                .add_factory("a", &["nowhere"], from_fn(|_| Ok(Named("a".into()))))
                .build(),
        );

        match result {
            Err(InitError::DependencyGraphError(errors)) => {
                assert!(errors.has_missing_dependency())
            }
            other => panic!("expected a missing dependency, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_names_are_fatal() {
        let result = block_on(
            DiBuilder::new()
                .add_instance("a", 1_u32)
                .add_instance("a", 2_u32)
                .build(),
        );

        match result {
            Err(InitError::DependencyGraphError(errors)) => assert_eq!(
                errors.errors,
                vec![DependencyGraphError::Duplicate("a".into())]
            ),
            other => panic!("expected a duplicate, got {other:?}"),
        }
    }

    #[test]
    fn failing_factory_rolls_back_wired_entries() {
        let journal = Journal::default();
        let result = block_on(
            DiBuilder::new()
                .add_factory("a", &[], recorded(&journal, "a"))
                .add_factory("b", &["a"], recorded(&journal, "b"))
                .add_factory(
                    "broken",
                    &["b"],
                    from_fn(|_| Err::<Named, DynError>("no luck".into())),
                )
                .build(),
        );

        match result {
            Err(InitError::FactoryFailed { entry, error }) => {
                assert_eq!(entry, "broken");
                assert_eq!(error.to_string(), "no luck");
            }
            other => panic!("expected a factory failure, got {other:?}"),
        }
        assert_eq!(
            entries(&journal),
            vec!["wire a", "wire b", "teardown b", "teardown a"]
        );
    }

    #[test]
    fn undeclared_dependency_cannot_be_required() {
        let result = block_on(
            DiBuilder::new()
                .add_instance("secret", String::from("hidden"))
                .add_factory(
                    "nosy",
                    &[],
                    from_fn(|di| {
                        let secret = di.require::<String>("secret")?;
                        Ok(Named(secret.to_string()))
                    }),
                )
                .build(),
        );

        let Err(InitError::FactoryFailed { error, .. }) = result else {
            panic!("expected the factory to fail");
        };
        assert_eq!(
            error.to_string(),
            "'nosy' did not declare a dependency on 'secret'"
        );
    }

    #[test]
    fn resolve_reports_missing_and_wrong_types() {
        let container = block_on(DiBuilder::new().add_instance("n", 7_u64).build()).unwrap();

        assert_eq!(*container.require::<u64>("n").unwrap(), 7);
        assert_eq!(container.resolve("n").unwrap().describe(), "7");
        assert_eq!(
            container.resolve("m").unwrap_err(),
            RequireError::NotFound("m".into())
        );
        assert!(matches!(
            container.require::<String>("n"),
            Err(RequireError::DowncastFailed { .. })
        ));
    }

    #[test]
    fn close_tears_down_in_reverse_once() {
        let journal = Journal::default();
        let container = block_on(
            DiBuilder::new()
                .add_factory("a", &[], recorded(&journal, "a"))
                .add_factory("b", &["a"], recorded(&journal, "b"))
                .add_factory("c", &["b"], recorded(&journal, "c"))
                .build(),
        )
        .unwrap();

        let report = container.close().unwrap();
        assert!(report.is_clean());
        assert_eq!(report.torn_down, vec!["c", "b", "a"]);

        assert_eq!(container.close().unwrap_err(), CloseError::AlreadyClosed);
        assert_eq!(
            entries(&journal),
            vec![
                "wire a",
                "wire b",
                "wire c",
                "teardown c",
                "teardown b",
                "teardown a"
            ]
        );
    }

    #[test]
    fn resolve_after_close_fails() {
        let container = block_on(
            DiBuilder::new()
                .add_factory("a", &[], from_fn(|_| Ok(Named("a".into()))))
                .add_factory("b", &["a"], from_fn(|_| Ok(Named("b".into()))))
                .build(),
        )
        .unwrap();

        assert!(container.is_active());
        container.close().unwrap();
        assert!(!container.is_active());
        assert_eq!(
            container.resolve("b").unwrap_err(),
            RequireError::Closed("b".into())
        );
    }

    #[test]
    fn failing_teardown_does_not_stop_the_rest() {
        let journal = Journal::default();
        let container = block_on(
            DiBuilder::new()
                .add_factory("a", &[], recorded(&journal, "a"))
                .add_factory(
                    "fragile",
                    &["a"],
                    from_fn(|_| Ok(Named("fragile".into())))
                        .with_teardown(|_| Err("teardown exploded".into())),
                )
                .add_factory("c", &["fragile"], recorded(&journal, "c"))
                .build(),
        )
        .unwrap();

        let report = container.close().unwrap();
        assert_eq!(report.torn_down, vec!["c", "a"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "fragile");
        assert_eq!(report.failures[0].error.to_string(), "teardown exploded");
        assert!(!container.is_active());
    }

    #[test]
    fn panicking_teardown_is_recorded_as_failure() {
        let container = block_on(
            DiBuilder::new()
                .add_factory(
                    "a",
                    &[],
                    from_fn(|_| Ok(Named("a".into()))).with_teardown(|_| panic!("boom")),
                )
                .add_factory("b", &["a"], from_fn(|_| Ok(Named("b".into()))))
                .build(),
        )
        .unwrap();

        let report = container.close().unwrap();
        assert_eq!(report.torn_down, vec!["b"]);
        assert_eq!(report.failures[0].name, "a");
        assert_eq!(
            report.failures[0].error.to_string(),
            "teardown of 'a' panicked"
        );
        assert!(!container.is_active());
    }

    #[test]
    fn clones_share_the_closed_state() {
        let container = block_on(DiBuilder::new().add_instance("a", 1_u8).build()).unwrap();
        let other = container.clone();

        other.close().unwrap();
        assert!(!container.is_active());
        assert_eq!(container.close().unwrap_err(), CloseError::AlreadyClosed);
    }

    #[test]
    fn second_closer_can_wait_for_the_running_teardown() {
        let started = Arc::new(Barrier::new(2));
        let finished = Arc::new(AtomicBool::new(false));

        let hook_started = started.clone();
        let hook_finished = finished.clone();
        let container = block_on(
            DiBuilder::new()
                .add_factory(
                    "slow",
                    &[],
                    from_fn(|_| Ok(Named("slow".into()))).with_teardown(move |_| {
                        hook_started.wait();
                        thread::sleep(Duration::from_millis(100));
                        hook_finished.store(true, Ordering::SeqCst);
                        Ok(())
                    }),
                )
                .build(),
        )
        .unwrap();

        let first = {
            let container = container.clone();
            thread::spawn(move || container.close())
        };
        started.wait();

        // Teardown is running on the other thread
        assert_eq!(container.close().unwrap_err(), CloseError::AlreadyClosed);
        assert!(!container.is_torn_down());

        let report = container.await_teardown();
        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(report.torn_down, vec!["slow"]);
        assert_eq!(first.join().unwrap().unwrap().torn_down, vec!["slow"]);
        assert!(container.is_torn_down());
    }

    struct SlowFactory;
    impl InstanceFactory for SlowFactory {
        type Provides = Named;

        fn construct(
            &mut self,
            _di: DiHandle,
        ) -> impl std::future::Future<Output = Result<Named, DynError>> + Send + '_ {
            async {
                // Never completes on its own
                futures::future::pending::<()>().await;
                Ok(Named("slow".into()))
            }
        }
    }

    #[test]
    fn build_timeout_rolls_back() {
        let journal = Journal::default();
        let result = block_on(
            DiBuilder::new()
                .add_factory("a", &[], recorded(&journal, "a"))
                .add_factory("slow", &["a"], SlowFactory)
                .build_timeout(Duration::from_millis(20)),
        );

        assert!(matches!(result, Err(InitError::Timeout)));
        assert_eq!(entries(&journal), vec!["wire a", "teardown a"]);
    }

    #[test]
    fn debug_lists_entries() {
        let container = block_on(DiBuilder::new().add_instance("a", 1_u8).build()).unwrap();
        assert_eq!(format!("{container:?}"), "DiContainer { a: \"u8\" }");
        container.close().unwrap();
        assert_eq!(
            format!("{container:?}"),
            "DiContainer { state: \"closed\" }"
        );
    }
}
