//! Embedded JavaScript sandbox (QuickJS)
//!
//! Scripts run in a fresh QuickJS runtime per execution on the blocking pool.
//! The global object has no filesystem, network or process primitives; the
//! only host hook is the output channel behind `console`. The runtime's
//! interrupt handler enforces the time budget and also observes an abort flag
//! that the async watchdog trips on timeout or cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use regex::Regex;
use rquickjs::context::EvalOptions;
use rquickjs::convert::Coerced;
use rquickjs::{CatchResultExt, CaughtError, Context, Ctx, Function, Runtime, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::SandboxConfig;
use crate::exec::output::OutputBuffer;

/// Installs `console`, `input` and `readline`, and returns the value formatter.
const PRELUDE: &str = r#"
(function (emit, raw) {
  const show = (value) => {
    if (typeof value === 'string') return value;
    if (value === undefined) return 'undefined';
    if (typeof value === 'function') return '[Function: ' + (value.name || 'anonymous') + ']';
    if (typeof value === 'symbol' || typeof value === 'bigint') return value.toString();
    if (value instanceof Error) return value.name + ': ' + value.message;
    try {
      const text = JSON.stringify(value);
      return text === undefined ? String(value) : text;
    } catch (e) {
      return String(value);
    }
  };
  const writer = (stream) => (...args) => emit(stream, args.map(show).join(' ') + '\n');
  const fixed = (value) => ({ value, writable: false, configurable: false, enumerable: false });
  Object.defineProperty(globalThis, 'console', fixed(Object.freeze({
    log: writer(1), info: writer(1), debug: writer(1), warn: writer(2), error: writer(2),
  })));
  if (typeof raw === 'string') {
    const lines = raw.split(/\r?\n/);
    if (lines.length > 0 && lines[lines.length - 1] === '') lines.pop();
    let cursor = 0;
    Object.defineProperty(globalThis, 'input', fixed(raw));
    Object.defineProperty(globalThis, 'readline', fixed(() => (cursor < lines.length ? lines[cursor++] : null)));
  }
  return show;
})
"#;

const STDOUT: i32 = 1;
const STDERR: i32 = 2;

/// Resource limits for one sandboxed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxLimits {
    pub time_budget: Duration,
    pub memory_limit_bytes: usize,
    pub max_stack_bytes: usize,
    pub max_output_bytes: usize,
}

impl SandboxLimits {
    pub fn from_config(config: &SandboxConfig, max_output_bytes: usize) -> Self {
        Self {
            time_budget: config.time_budget,
            memory_limit_bytes: config.memory_limit_bytes,
            max_stack_bytes: config.max_stack_bytes,
            max_output_bytes,
        }
    }
}

/// How a sandboxed script ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxStatus {
    Completed,
    /// Uncaught exception, formatted for display
    Threw(String),
    /// Budget exhausted, watchdog fired, or cancelled
    TimedOut,
    /// The engine itself could not be set up or crashed
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SandboxOutcome {
    pub status: SandboxStatus,
    pub stdout: String,
    pub stderr: String,
    pub finished_at: Instant,
}

/// Evaluate `code` in a fresh sandbox
///
/// `watchdog` is an outer wall-clock backstop for the interpreter's own
/// budget. Cancellation behaves like the watchdog firing.
pub async fn run_sandboxed(
    code: String,
    input: Option<String>,
    limits: SandboxLimits,
    watchdog: Duration,
    cancel: &CancellationToken,
) -> SandboxOutcome {
    let abort = Arc::new(AtomicBool::new(false));
    let stdout = OutputBuffer::new(limits.max_output_bytes);
    let stderr = OutputBuffer::new(limits.max_output_bytes);

    let task = tokio::task::spawn_blocking({
        let abort = abort.clone();
        let stdout = stdout.clone();
        let stderr = stderr.clone();
        move || evaluate(&code, input.as_deref(), &limits, &abort, &stdout, &stderr)
    });
    tokio::pin!(task);

    let joined = tokio::select! {
        joined = &mut task => Some(joined),
        _ = tokio::time::sleep(watchdog) => {
            warn!(watchdog = ?watchdog, "Sandbox watchdog fired");
            None
        }
        _ = cancel.cancelled() => {
            debug!("Sandbox cancelled");
            None
        }
    };

    let (status, finished_at) = match joined {
        Some(Ok(done)) => done,
        Some(Err(e)) => (SandboxStatus::Failed(format!("interpreter task failed: {}", e)), Instant::now()),
        None => {
            let stopped_at = Instant::now();
            abort.store(true, Ordering::SeqCst);
            // The interrupt handler fires within a few thousand bytecodes.
            if tokio::time::timeout(Duration::from_secs(1), &mut task).await.is_err() {
                warn!("Sandbox did not stop after abort; detaching");
            }
            (SandboxStatus::TimedOut, stopped_at)
        }
    };

    SandboxOutcome {
        status,
        stdout: stdout.snapshot(),
        stderr: stderr.snapshot(),
        finished_at,
    }
}

fn evaluate(
    code: &str,
    input: Option<&str>,
    limits: &SandboxLimits,
    abort: &Arc<AtomicBool>,
    stdout: &OutputBuffer,
    stderr: &OutputBuffer,
) -> (SandboxStatus, Instant) {
    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => return (SandboxStatus::Failed(format!("failed to start interpreter: {}", e)), Instant::now()),
    };
    runtime.set_memory_limit(limits.memory_limit_bytes);
    runtime.set_max_stack_size(limits.max_stack_bytes);

    let tripped = Arc::new(AtomicBool::new(false));
    let deadline = Instant::now() + limits.time_budget;
    {
        let abort = abort.clone();
        let tripped = tripped.clone();
        runtime.set_interrupt_handler(Some(Box::new(move || {
            let stop = abort.load(Ordering::Relaxed) || Instant::now() >= deadline;
            if stop {
                tripped.store(true, Ordering::Relaxed);
            }
            stop
        })));
    }

    let context = match Context::full(&runtime) {
        Ok(context) => context,
        Err(e) => return (SandboxStatus::Failed(format!("failed to create context: {}", e)), Instant::now()),
    };

    let mut status = context.with(|ctx| run_script(&ctx, code, input, stdout, stderr));

    if status == SandboxStatus::Completed {
        // Promise callbacks scheduled by the script.
        loop {
            match runtime.execute_pending_job() {
                Ok(true) => continue,
                Ok(false) => break,
                Err(_) => {
                    status = SandboxStatus::Threw("uncaught error in a promise job".to_string());
                    break;
                }
            }
        }
    }
    let finished_at = Instant::now();

    if tripped.load(Ordering::Relaxed) {
        return (SandboxStatus::TimedOut, finished_at);
    }
    (status, finished_at)
}

fn run_script<'js>(
    ctx: &Ctx<'js>,
    code: &str,
    input: Option<&str>,
    stdout: &OutputBuffer,
    stderr: &OutputBuffer,
) -> SandboxStatus {
    let setup = || -> rquickjs::Result<Function<'js>> {
        let out = stdout.clone();
        let err = stderr.clone();
        let emit = Function::new(ctx.clone(), move |stream: i32, text: String| {
            match stream {
                STDOUT => out.push(text.as_bytes()),
                STDERR => err.push(text.as_bytes()),
                _ => {}
            }
        })?;
        let install: Function = ctx.eval(PRELUDE)?;
        install.call((emit, input.map(str::to_owned)))
    };

    let show = match setup() {
        Ok(show) => show,
        Err(e) => return SandboxStatus::Failed(format!("failed to prepare sandbox globals: {}", e)),
    };

    match ctx.eval_with_options::<Value, _>(code, sloppy()).catch(ctx) {
        Ok(value) => {
            if !value.is_undefined() {
                if let Ok(text) = show.call::<_, String>((value,)) {
                    stdout.push(text);
                    stdout.push("\n");
                }
            }
            SandboxStatus::Completed
        }
        Err(caught) => SandboxStatus::Threw(describe(caught)),
    }
}

/// Global script evaluation without an implied `"use strict"`
fn sloppy() -> EvalOptions {
    let mut options = EvalOptions::default();
    options.strict = false;
    options
}

fn describe(caught: CaughtError<'_>) -> String {
    match caught {
        CaughtError::Exception(exception) => {
            let name = exception
                .as_object()
                .get::<_, String>("name")
                .unwrap_or_else(|_| "Error".to_string());
            let message = exception.message().unwrap_or_default();
            let mut text = if message.is_empty() {
                name
            } else {
                format!("{}: {}", name, message)
            };
            if let Some(stack) = exception.stack() {
                let stack = stack.trim_end();
                if !stack.is_empty() {
                    text.push('\n');
                    text.push_str(stack);
                }
            }
            text
        }
        CaughtError::Value(value) => {
            let shown = value
                .get::<Coerced<String>>()
                .map(|c| c.0)
                .unwrap_or_else(|_| "a non-error value".to_string());
            format!("Uncaught {}", shown)
        }
        CaughtError::Error(e) => e.to_string(),
    }
}

/// Result of a parse-only pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxCheck {
    Valid,
    SyntaxError {
        line: usize,
        column: usize,
        message: String,
    },
    /// The parse could not be performed (engine failure, resource limit)
    Unavailable(String),
}

const CHECK_MEMORY_LIMIT: usize = 32 * 1024 * 1024;
const CHECK_STACK_LIMIT: usize = 1024 * 1024;
const CHECK_TIME_BUDGET: Duration = Duration::from_secs(2);

/// Lines the `Function` constructor puts in front of the body
const FUNCTION_HEADER_LINES: usize = 2;

static STACK_POSITION: OnceLock<Regex> = OnceLock::new();

/// Parse `code` as a non-strict script body without running it
///
/// The body goes through the `Function` constructor, which compiles it with
/// the same sloppy-mode rules as a run but never calls it.
pub fn syntax_check(code: &str) -> SyntaxCheck {
    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => return SyntaxCheck::Unavailable(e.to_string()),
    };
    runtime.set_memory_limit(CHECK_MEMORY_LIMIT);
    runtime.set_max_stack_size(CHECK_STACK_LIMIT);
    let deadline = Instant::now() + CHECK_TIME_BUDGET;
    runtime.set_interrupt_handler(Some(Box::new(move || Instant::now() >= deadline)));

    let context = match Context::full(&runtime) {
        Ok(context) => context,
        Err(e) => return SyntaxCheck::Unavailable(e.to_string()),
    };

    context.with(|ctx| {
        let compile = || -> rquickjs::Result<()> {
            let constructor: Function = ctx.globals().get("Function")?;
            constructor.call::<_, Value>((code,))?;
            Ok(())
        };
        match compile() {
            Ok(()) => SyntaxCheck::Valid,
            Err(rquickjs::Error::Exception) => classify(ctx.catch(), code.lines().count().max(1)),
            Err(e) => SyntaxCheck::Unavailable(e.to_string()),
        }
    })
}

fn classify(thrown: Value<'_>, last_line: usize) -> SyntaxCheck {
    let Some(object) = thrown.as_object() else {
        return SyntaxCheck::Unavailable("parser threw a non-error value".to_string());
    };
    let name = object.get::<_, String>("name").unwrap_or_default();
    let message = object.get::<_, String>("message").unwrap_or_default();
    if name != "SyntaxError" {
        return SyntaxCheck::Unavailable(format!("{}: {}", name, message));
    }

    let stack = object.get::<_, String>("stack").unwrap_or_default();
    let (line, column) = syntax_position(
        object.get::<_, Option<i32>>("lineNumber").ok().flatten(),
        object.get::<_, Option<i32>>("columnNumber").ok().flatten(),
        &stack,
    );
    let line = line.saturating_sub(FUNCTION_HEADER_LINES).clamp(1, last_line);
    SyntaxCheck::SyntaxError { line, column, message }
}

/// Prefer the error's own position properties, fall back to the stack trace
fn syntax_position(line: Option<i32>, column: Option<i32>, stack: &str) -> (usize, usize) {
    let as_index = |v: i32| usize::try_from(v).ok().filter(|&v| v > 0);
    if let Some(line) = line.and_then(as_index) {
        return (line, column.and_then(as_index).unwrap_or(1));
    }
    let position = STACK_POSITION.get_or_init(|| {
        Regex::new(r"<input>:(\d+)(?::(\d+))?").expect("static pattern is valid")
    });
    position
        .captures(stack)
        .map(|caps| {
            let line = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(1);
            let column = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(1);
            (line, column)
        })
        .unwrap_or((1, 1))
}
