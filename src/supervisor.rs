use parking_lot::Mutex;
use std::{
    any::Any,
    backtrace::Backtrace,
    cell::{Cell, RefCell},
    mem,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Once,
    },
    thread::{self, JoinHandle},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Background tasks sharing one cancellation context.
pub(crate) struct Supervisor {
    token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    spawned: AtomicUsize,
}

impl Supervisor {
    pub(crate) fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
            spawned: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub(crate) fn context(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Runs `task` on its own thread. A panic is logged and doesn't reach the caller.
    pub(crate) fn spawn<F>(&self, task: F)
    where
        F: FnOnce(CancellationToken) + Send + 'static,
    {
        let token = self.token.clone();
        let id = self.spawned.fetch_add(1, Ordering::Relaxed);

        let spawned = thread::Builder::new()
            .name(format!("beanery-task-{id}"))
            .spawn(move || run_task(id, || task(token)));

        match spawned {
            Ok(handle) => {
                self.tasks.lock().push(handle);
                debug!(task = id, "Task spawned");
            }
            Err(err) => error!(task = id, %err, "Failed to spawn task"),
        }
    }

    /// Tasks that haven't returned yet.
    pub(crate) fn active(&self) -> usize {
        self.tasks.lock().iter().filter(|handle| !handle.is_finished()).count()
    }

    /// Cancels the context and waits for every task, including tasks spawned meanwhile.
    pub(crate) fn shutdown(&self) {
        self.token.cancel();

        loop {
            let handles = mem::take(&mut *self.tasks.lock());
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if handle.join().is_err() {
                    error!("Task thread panicked outside of the task");
                }
            }
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

thread_local! {
    static SUPERVISED: Cell<bool> = const { Cell::new(false) };
    static PANIC_TRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chains a hook that keeps the backtrace of panics raised inside [`catch_panic`].
/// Panics elsewhere go to the previous hook.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if SUPERVISED.with(Cell::get) {
                PANIC_TRACE.with(|trace| *trace.borrow_mut() = Some(Backtrace::force_capture()));
            } else {
                previous(info);
            }
        }));
    });
}

fn run_task(id: usize, task: impl FnOnce()) {
    if let Err((message, backtrace)) = catch_panic(task) {
        error!(task = id, panic = %message, %backtrace, "Supervised task panicked");
    }
}

/// Runs `task`, returning the panic message and the backtrace taken at the panic site.
fn catch_panic(task: impl FnOnce()) -> Result<(), (String, Backtrace)> {
    install_panic_hook();

    let supervised = SUPERVISED.with(|supervised| supervised.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(task));
    SUPERVISED.with(|flag| flag.set(supervised));

    result.map_err(|payload| {
        let backtrace = PANIC_TRACE
            .with(|trace| trace.borrow_mut().take())
            .unwrap_or_else(Backtrace::force_capture);
        (panic_message(&*payload).to_owned(), backtrace)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "Box<dyn Any>"
    }
}

#[cfg(test)]
mod tests {
    use super::{catch_panic, run_task, Supervisor};

    use std::{
        sync::{
            atomic::{AtomicU8, Ordering},
            Arc,
        },
        thread,
        time::Duration,
    };
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_shutdown_waits_for_tasks() {
        let supervisor = Supervisor::new();
        let exited = Arc::new(AtomicU8::new(0));

        for _ in 0..3 {
            let exited = exited.clone();
            supervisor.spawn(move |token| {
                while !token.is_cancelled() {
                    thread::sleep(Duration::from_millis(1));
                }
                exited.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(exited.load(Ordering::SeqCst), 0);

        supervisor.shutdown();

        assert_eq!(exited.load(Ordering::SeqCst), 3);
        assert_eq!(supervisor.active(), 0);
    }

    #[test]
    #[traced_test]
    fn test_panic_is_contained() {
        let supervisor = Supervisor::new();
        let finished = Arc::new(AtomicU8::new(0));

        supervisor.spawn(|_| panic!("task failed"));
        supervisor.spawn({
            let finished = finished.clone();
            move |token| {
                while !token.is_cancelled() {
                    thread::sleep(Duration::from_millis(1));
                }
                finished.fetch_add(1, Ordering::SeqCst);
            }
        });
        supervisor.shutdown();

        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(supervisor.active(), 0);
    }

    #[test]
    fn test_drop_cancels_context() {
        let supervisor = Supervisor::new();
        let token = supervisor.context();
        drop(supervisor);

        assert!(token.is_cancelled());
    }

    #[inline(never)]
    fn failing_repository_call() {
        panic!("connection lost");
    }

    #[test]
    fn test_backtrace_points_at_panic_site() {
        let (message, backtrace) = catch_panic(failing_repository_call).unwrap_err();

        assert_eq!(message, "connection lost");
        assert!(backtrace.to_string().contains("failing_repository_call"));
    }

    #[test]
    #[traced_test]
    fn test_task_panic_is_logged() {
        run_task(7, failing_repository_call);

        assert!(logs_contain("Supervised task panicked"));
        assert!(logs_contain("connection lost"));
    }
}
