//! Binding of a [`CorrelationId`] to the current execution context.
//!
//! Inside a [`scope`] the id lives in a tokio task-local slot, so every task
//! sees only its own binding no matter which worker thread polls it. Plain
//! threads with no tokio runtime (synchronous code and tests) fall back to a
//! thread-local slot.
//!
//! Tasks share worker threads, so inside a runtime the thread-local slot is
//! never used: outside a [`scope`] there is nothing to bind to. [`set`] and
//! [`scoped`] log a warning and leave the context unbound, [`get`] returns
//! `None` and [`ensure`] hands out a fresh id without binding it.

use std::cell::RefCell;
use std::future::Future;
use std::marker::PhantomData;
use std::rc::Rc;

use tokio::runtime::Handle;
use tracing::{trace, warn};

use crate::id::CorrelationId;

type Slot = RefCell<Option<CorrelationId>>;

tokio::task_local! {
    static TASK_SLOT: Slot;
}

thread_local! {
    static THREAD_SLOT: Slot = const { RefCell::new(None) };
}

/// Runs `f` against the innermost slot visible from here.
///
/// Returns `None` inside a tokio runtime when no task scope is active.
fn with_slot<R>(f: impl FnOnce(&Slot) -> R) -> Option<R> {
    if TASK_SLOT.try_with(|_| ()).is_ok() {
        Some(TASK_SLOT.with(f))
    } else if Handle::try_current().is_err() {
        Some(THREAD_SLOT.with(f))
    } else {
        None
    }
}

/// Binds `id` to the current execution context, replacing any previous binding.
///
/// Inside a tokio runtime this only takes effect within a [`scope`].
pub fn set(id: impl Into<CorrelationId>) {
    let id = id.into();
    let bound = with_slot(|slot| *slot.borrow_mut() = Some(id.clone()));
    if bound.is_some() {
        trace!(correlation_id = %id, "bound correlation id");
    } else {
        warn!(correlation_id = %id, "no correlation scope in this task, id not bound");
    }
}

/// Returns the id bound to the current execution context, if any.
#[must_use]
pub fn get() -> Option<CorrelationId> {
    with_slot(|slot| slot.borrow().clone()).flatten()
}

/// Returns the bound id, generating and binding a fresh one when absent.
///
/// Outside a [`scope`] inside a tokio runtime the fresh id is returned
/// without being bound.
pub fn ensure() -> CorrelationId {
    with_slot(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(CorrelationId::generate)
            .clone()
    })
    .unwrap_or_else(CorrelationId::generate)
}

/// Removes the binding from the current execution context.
pub fn clear() {
    with_slot(|slot| slot.borrow_mut().take());
}

/// Binds `id` (or a freshly generated one) until the returned guard drops.
///
/// Whatever was bound before is restored when the guard goes out of scope,
/// including on early returns and unwinding. The guard is `!Send`; for code
/// that awaits across threads use [`scope`] instead.
pub fn scoped(id: Option<CorrelationId>) -> CorrelationGuard {
    let id = id.unwrap_or_else(CorrelationId::generate);
    let replaced = with_slot(|slot| slot.borrow_mut().replace(id.clone()));
    let bound = replaced.is_some();
    if !bound {
        warn!(correlation_id = %id, "no correlation scope in this task, id not bound");
    }

    CorrelationGuard {
        id,
        bound,
        previous: replaced.flatten(),
        _not_send: PhantomData,
    }
}

/// Runs `future` with `id` (or a freshly generated one) bound for its whole
/// lifetime.
///
/// The binding is task-local: concurrently running futures never observe
/// each other's id, and the enclosing binding is visible again once the
/// future completes.
pub async fn scope<F>(id: Option<CorrelationId>, future: F) -> F::Output
where
    F: Future,
{
    let id = id.unwrap_or_else(CorrelationId::generate);
    TASK_SLOT.scope(RefCell::new(Some(id)), future).await
}

/// Restores the previous binding when dropped. Returned by [`scoped`].
#[derive(Debug)]
#[must_use = "the correlation id is unbound as soon as the guard is dropped"]
pub struct CorrelationGuard {
    id: CorrelationId,
    bound: bool,
    previous: Option<CorrelationId>,
    _not_send: PhantomData<Rc<()>>,
}

impl CorrelationGuard {
    /// The id bound by this guard.
    #[must_use]
    pub const fn id(&self) -> &CorrelationId {
        &self.id
    }
}

impl Drop for CorrelationGuard {
    fn drop(&mut self) {
        if self.bound {
            let previous = self.previous.take();
            with_slot(|slot| *slot.borrow_mut() = previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod binding_tests {
        use super::*;

        #[test]
        fn unbound_by_default() {
            assert!(get().is_none());
        }

        #[test]
        fn set_then_get() {
            set("req-42");
            assert_eq!(get(), Some(CorrelationId::from("req-42")));
            clear();
            assert!(get().is_none());
        }

        #[test]
        fn ensure_generates_once() {
            let first = ensure();
            let second = ensure();
            assert_eq!(first, second);
            assert_eq!(get(), Some(first));
            clear();
        }

        #[test]
        fn ensure_keeps_existing_binding() {
            set("existing");
            assert_eq!(ensure().as_str(), "existing");
            clear();
        }
    }

    mod guard_tests {
        use super::*;

        fn failing_step() -> Result<(), String> {
            let _guard = scoped(Some(CorrelationId::from("inner")));
            assert_eq!(get().unwrap().as_str(), "inner");
            Err("step failed".to_string())?;
            Ok(())
        }

        #[test]
        fn scoped_binds_inside_block() {
            let guard = scoped(Some(CorrelationId::from("block")));
            assert_eq!(guard.id().as_str(), "block");
            assert_eq!(get(), Some(guard.id().clone()));
        }

        #[test]
        fn scoped_restores_absent_binding() {
            {
                let _guard = scoped(None);
                assert!(get().is_some());
            }
            assert!(get().is_none());
        }

        #[test]
        fn scoped_restores_previous_binding() {
            set("outer");
            {
                let _guard = scoped(Some(CorrelationId::from("inner")));
                assert_eq!(get().unwrap().as_str(), "inner");
            }
            assert_eq!(get().unwrap().as_str(), "outer");
            clear();
        }

        #[test]
        fn scoped_restores_on_error_path() {
            set("outer");
            assert!(failing_step().is_err());
            assert_eq!(get().unwrap().as_str(), "outer");
            clear();
        }

        #[test]
        fn nested_guards_unwind_in_order() {
            let outer = scoped(Some(CorrelationId::from("a")));
            {
                let _inner = scoped(Some(CorrelationId::from("b")));
                assert_eq!(get().unwrap().as_str(), "b");
            }
            assert_eq!(get().unwrap().as_str(), "a");
            drop(outer);
            assert!(get().is_none());
        }

        #[test]
        fn generated_scope_ids_differ() {
            let a = scoped(None).id().clone();
            let b = scoped(None).id().clone();
            assert_ne!(a, b);
        }
    }

    mod task_scope_tests {
        use super::*;

        #[tokio::test]
        async fn scope_binds_for_future() {
            let seen = scope(Some(CorrelationId::from("task-1")), async { get() }).await;
            assert_eq!(seen.unwrap().as_str(), "task-1");
            assert!(get().is_none());
        }

        #[tokio::test]
        async fn scope_without_id_generates_one() {
            let seen = scope(None, async { get() }).await;
            assert!(seen.is_some());
        }

        #[tokio::test]
        async fn set_inside_scope_does_not_leak() {
            scope(Some(CorrelationId::from("outer")), async {
                set("replaced");
                assert_eq!(get().unwrap().as_str(), "replaced");
            })
            .await;
            assert!(get().is_none());
        }

        #[tokio::test]
        async fn nested_scope_restores_outer() {
            scope(Some(CorrelationId::from("outer")), async {
                scope(Some(CorrelationId::from("inner")), async {
                    assert_eq!(get().unwrap().as_str(), "inner");
                })
                .await;
                assert_eq!(get().unwrap().as_str(), "outer");
            })
            .await;
        }

        #[tokio::test]
        async fn sequential_tasks_on_one_thread_are_isolated() {
            tokio::spawn(async {
                set("task-a");
                let _ = ensure();
            })
            .await
            .unwrap();

            let seen = tokio::spawn(async { get() }).await.unwrap();
            assert!(seen.is_none());
        }

        #[tokio::test]
        async fn unscoped_task_does_not_bind() {
            set("ignored");
            assert!(get().is_none());

            let first = ensure();
            let second = ensure();
            assert_ne!(first, second);
            assert!(get().is_none());

            {
                let guard = scoped(Some(CorrelationId::from("guarded")));
                assert_eq!(guard.id().as_str(), "guarded");
                assert!(get().is_none());
            }
            assert!(get().is_none());
        }

        #[tokio::test]
        async fn scoped_guard_inside_task_scope_restores() {
            scope(Some(CorrelationId::from("outer")), async {
                {
                    let _guard = scoped(Some(CorrelationId::from("inner")));
                    assert_eq!(get().unwrap().as_str(), "inner");
                }
                assert_eq!(get().unwrap().as_str(), "outer");
            })
            .await;
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
        async fn concurrent_tasks_are_isolated() {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    tokio::spawn(scope(
                        Some(CorrelationId::from(format!("task-{i}"))),
                        async move {
                            for _ in 0..10 {
                                tokio::task::yield_now().await;
                                assert_eq!(get().unwrap().as_str(), format!("task-{i}"));
                            }
                            get()
                        },
                    ))
                })
                .collect();

            for (i, result) in futures::future::join_all(handles).await.into_iter().enumerate() {
                assert_eq!(result.unwrap().unwrap().as_str(), format!("task-{i}"));
            }
        }
    }
}
