//! Interactive session.
//!
//! Reads one command per line from stdin while the countdown runs in the
//! background. Single-key lines mirror the keyboard shortcuts of the GUI:
//! a lone space toggles pause on the active task, `d` completes it, `g`
//! gives up on it and ESC leaves focus mode.

use clap::Args;
use finishit_core::runtime::Op;
use finishit_core::{
    parse_minutes, BreathingTechnique, Config, Event, FailureReason, MonotonicClock, SessionHandle,
    SessionRuntime, SessionSnapshot, TaskDraft, TaskEngine, TaskId,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::render;

#[derive(Args)]
pub struct RunArgs {
    /// Default minutes for new tasks
    #[arg(short, long)]
    minutes: Option<u32>,
    /// Default technique for new tasks
    #[arg(short, long)]
    technique: Option<BreathingTechnique>,
    /// Tick interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,
    /// Start in focus mode
    #[arg(long)]
    focus: bool,
    /// Print JSON snapshots instead of text
    #[arg(long)]
    json: bool,
}

/// Which task a command refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TaskRef {
    /// 1-based position in the list.
    Index(usize),
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Add(TaskDraft),
    Start(TaskRef),
    /// `None` targets the active task.
    Toggle(Option<TaskRef>),
    Done(Option<TaskRef>, Option<String>),
    GiveUp(Option<TaskRef>),
    List,
    Stats,
    Focus,
    ExitFocus,
    Reset,
    Help,
    Quit,
    Nothing,
}

struct Defaults {
    minutes: u32,
    technique: Option<BreathingTechnique>,
}

struct View {
    focus: bool,
    json: bool,
}

const HELP: &str = "\
commands:
  add <title> [-m minutes] [-t technique]   create a task
  start <n|id>                              start a pending task
  pause [n|id]                              pause/resume (default: active task)
  done [#n|id] [note...]                    complete (default: active task)
  giveup [n|id]                             give up (default: active task)
  list | stats | focus | reset | help | quit
keys: <space> pause/resume, d done, g give up, ESC leave focus mode";

fn parse_ref(token: &str) -> Option<TaskRef> {
    if token.starts_with("task-") {
        return Some(TaskRef::Id(token.to_string()));
    }
    token
        .trim_start_matches('#')
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .map(TaskRef::Index)
}

fn parse_add(args: &[&str], defaults: &Defaults) -> Result<Input, String> {
    let mut title = Vec::new();
    let mut minutes = defaults.minutes;
    let mut technique = defaults.technique;
    let mut iter = args.iter();
    while let Some(token) = iter.next() {
        match *token {
            "-m" | "--min" => {
                let value = iter.next().ok_or("missing value for -m")?;
                minutes = parse_minutes(value).map_err(|e| e.to_string())?;
            }
            "-t" | "--tech" => {
                let value = iter.next().ok_or("missing value for -t")?;
                technique = Some(value.parse()?);
            }
            word => title.push(word),
        }
    }
    let mut draft = TaskDraft::new(title.join(" "), minutes);
    draft.technique = technique;
    Ok(Input::Add(draft))
}

fn parse_line(line: &str, defaults: &Defaults) -> Result<Input, String> {
    let raw = line.trim_end_matches(['\r', '\n']);
    match raw {
        " " => return Ok(Input::Toggle(None)),
        "\u{1b}" => return Ok(Input::ExitFocus),
        _ => {}
    }

    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let Some((command, args)) = tokens.split_first() else {
        return Ok(Input::Nothing);
    };
    let target = args.first().and_then(|t| parse_ref(t));

    let input = match *command {
        "add" | "a" => parse_add(args, defaults)?,
        "start" | "s" => Input::Start(target.ok_or("usage: start <n|id>")?),
        "pause" | "p" | "resume" => Input::Toggle(target),
        "done" | "d" => {
            // A bare number is part of the note; targets need `#n` or an id.
            let target = args
                .first()
                .filter(|t| t.starts_with('#') || t.starts_with("task-"))
                .and_then(|t| parse_ref(t));
            let rest = if target.is_some() { &args[1..] } else { args };
            let note = Some(rest.join(" ")).filter(|n| !n.is_empty());
            Input::Done(target, note)
        }
        "giveup" | "g" => Input::GiveUp(target),
        "list" | "ls" | "l" => Input::List,
        "stats" => Input::Stats,
        "focus" | "f" => Input::Focus,
        "reset" => Input::Reset,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => return Err(format!("unknown command: {other} (try 'help')")),
    };
    Ok(input)
}

fn resolve(snapshot: &SessionSnapshot, target: &TaskRef) -> Option<TaskId> {
    match target {
        TaskRef::Index(n) => snapshot.tasks.get(n - 1).map(|t| t.id.clone()),
        TaskRef::Id(id) => {
            let id = TaskId::from(id.as_str());
            snapshot.task(&id).map(|t| t.id.clone())
        }
    }
}

/// Turn an input that names a task into an engine op.
fn to_op(input: Input, snapshot: &SessionSnapshot) -> Result<Op, String> {
    let find = |target: &TaskRef| resolve(snapshot, target).ok_or("no such task".to_string());
    let op = match input {
        Input::Start(target) => Op::Start(find(&target)?),
        Input::Toggle(None) => Op::ToggleActive,
        Input::Toggle(Some(target)) => Op::TogglePause(find(&target)?),
        Input::Done(None, note) => Op::CompleteActive(note),
        Input::Done(Some(target), note) => Op::Complete(find(&target)?, note),
        Input::GiveUp(None) => Op::GiveUpActive,
        Input::GiveUp(Some(target)) => Op::GiveUp(find(&target)?),
        Input::Reset => Op::Reset,
        _ => return Err("not a task command".to_string()),
    };
    Ok(op)
}

impl View {
    fn show(&self, snapshot: &SessionSnapshot) -> Result<(), Box<dyn std::error::Error>> {
        if self.json {
            println!("{}", serde_json::to_string(snapshot)?);
        } else {
            println!("{}", render::snapshot(snapshot, self.focus));
        }
        Ok(())
    }

    /// Messages for the person at the keyboard. Kept off stdout in JSON mode.
    fn say(&self, message: &str) {
        if self.json {
            eprintln!("{message}");
        } else {
            println!("{message}");
        }
    }

    fn report(&self, event: &Event) {
        if !self.json {
            println!("{}", render::event(event));
        }
    }
}

async fn execute(
    session: &SessionHandle,
    input: Input,
    view: &mut View,
) -> Result<(), Box<dyn std::error::Error>> {
    match input {
        Input::Add(draft) => match session.create_task(draft).await {
            Ok(_) => view.show(&session.snapshot())?,
            Err(finishit_core::CoreError::Validation(e)) => eprintln!("{e}"),
            Err(e) => return Err(e.into()),
        },
        Input::List => view.show(&session.snapshot())?,
        Input::Stats => {
            let snapshot = session.snapshot();
            if view.json {
                println!("{}", serde_json::to_string(&snapshot.summary)?);
            } else {
                println!("{}", render::mastery(&snapshot.summary.mastery));
            }
        }
        Input::Focus => {
            view.focus = !view.focus;
            view.say(if view.focus { "focus mode on" } else { "focus mode off" });
        }
        Input::ExitFocus => {
            view.focus = false;
            view.say("focus mode off");
        }
        Input::Help => view.say(HELP),
        Input::Nothing | Input::Quit => {}
        task_command => {
            let op = match to_op(task_command, &session.snapshot()) {
                Ok(op) => op,
                Err(msg) => {
                    eprintln!("{msg}");
                    return Ok(());
                }
            };
            match session.apply(op).await? {
                Some(event) => {
                    view.report(&event);
                    if view.json || view.focus {
                        view.show(&session.snapshot())?;
                    }
                }
                None => eprintln!("nothing to do"),
            }
        }
    }
    Ok(())
}

async fn session_loop(
    session: &SessionHandle,
    defaults: Defaults,
    mut view: View,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut events = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    view.say(HELP);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line, &defaults) {
                    Ok(Input::Quit) => break,
                    Ok(input) => execute(session, input, &mut view).await?,
                    Err(msg) => eprintln!("{msg}"),
                }
            }
            event = events.recv() => match event {
                // Expiry is the only change nobody typed a command for.
                Ok(event @ Event::TaskFailed { reason: FailureReason::Expired, .. }) => {
                    view.report(&event);
                    if view.json {
                        view.show(&session.snapshot())?;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    }
    Ok(())
}

pub fn run(args: RunArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = config.clone();
    if let Some(tick_ms) = args.tick_ms {
        config.set("timer.tick_interval_ms", &tick_ms.to_string())?;
    }
    let defaults = Defaults {
        minutes: args.minutes.unwrap_or(config.defaults.minutes),
        technique: args.technique.or(config.defaults.technique),
    };
    let view = View {
        focus: args.focus || config.ui.focus_mode,
        json: args.json || config.ui.json,
    };

    let view_json = view.json;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let session = SessionRuntime::spawn(
            TaskEngine::new(MonotonicClock::new()),
            config.tick_interval(),
        );
        let result = session_loop(&session, defaults, view).await;
        let last = session.dispose().await?;
        if !last.tasks.is_empty() {
            if view_json {
                println!("{}", serde_json::to_string(&last.summary.mastery)?);
            } else {
                println!("{}", render::mastery(&last.summary.mastery));
            }
        }
        result
    })
}
