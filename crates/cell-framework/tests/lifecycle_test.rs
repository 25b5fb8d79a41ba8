use std::time::Duration;

use async_trait::async_trait;
use cell_framework::mock::{Probe, ProbeReceiver};
use cell_framework::{
    Behavior, BoxError, CellContext, CellStatus, Environment, Event, Fault, MeshError, Payload,
};
use tokio::sync::mpsc;

const WITHIN: Duration = Duration::from_millis(500);

/// Lifecycle notes a behavior reports to the test.
#[derive(Debug, PartialEq)]
enum Note {
    Processed(String),
    Recovered(String),
    Terminated,
}

/// Panics on "boom", optionally refuses to recover, reports everything else.
struct Fragile {
    notes: mpsc::UnboundedSender<Note>,
    recoverable: bool,
}

impl Fragile {
    fn new(recoverable: bool) -> (Self, mpsc::UnboundedReceiver<Note>) {
        let (notes, rx) = mpsc::unbounded_channel();
        (Self { notes, recoverable }, rx)
    }
}

#[async_trait]
impl Behavior for Fragile {
    async fn process_event(&mut self, event: Event, ctx: &CellContext) -> Result<(), BoxError> {
        match event.topic() {
            "boom" => panic!("boom requested"),
            "fail" => return Err("refused".into()),
            "quit" => ctx.environment().stop_cell(ctx.id().as_str()).await?,
            topic => {
                let _ = self.notes.send(Note::Processed(topic.to_string()));
            }
        }
        Ok(())
    }

    async fn recover(&mut self, fault: &Fault, _ctx: &CellContext) -> Result<(), BoxError> {
        if self.recoverable {
            let _ = self.notes.send(Note::Recovered(fault.message.clone()));
            Ok(())
        } else {
            Err("cannot recover".into())
        }
    }

    async fn terminate(&mut self, _ctx: &CellContext) -> Result<(), BoxError> {
        let _ = self.notes.send(Note::Terminated);
        Ok(())
    }
}

/// Fails its init hook.
struct Stillborn;

#[async_trait]
impl Behavior for Stillborn {
    async fn init(&mut self, _ctx: &CellContext) -> Result<(), BoxError> {
        Err("no resources".into())
    }

    async fn process_event(&mut self, _event: Event, _ctx: &CellContext) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Starts a child cell from `init` and subscribes it.
struct Parent {
    child: Option<Probe>,
}

#[async_trait]
impl Behavior for Parent {
    async fn init(&mut self, ctx: &CellContext) -> Result<(), BoxError> {
        if let Some(child) = self.child.take() {
            let child_id = ctx.id().child("child");
            ctx.environment().start_cell(child_id.clone(), child).await?;
            ctx.environment().subscribe(ctx.id().as_str(), child_id.as_str())?;
        }
        Ok(())
    }

    async fn process_event(&mut self, event: Event, ctx: &CellContext) -> Result<(), BoxError> {
        ctx.emit(event)?;
        Ok(())
    }
}

async fn next_note(notes: &mut mpsc::UnboundedReceiver<Note>) -> Option<Note> {
    tokio::time::timeout(WITHIN, notes.recv()).await.ok().flatten()
}

async fn wait_for_status(env: &Environment, id: &str, status: Option<CellStatus>) -> bool {
    for _ in 0..50 {
        if env.status(id) == status {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

async fn probe(env: &Environment, id: &str) -> ProbeReceiver {
    let (probe, receiver) = Probe::new();
    env.start_cell(id, probe).await.unwrap();
    receiver
}

// --- Start ---

#[tokio::test]
async fn test_started_cell_is_running() {
    let env = Environment::new();
    let (cell, _notes) = Fragile::new(true);
    env.start_cell("cell", cell).await.unwrap();

    assert_eq!(env.status("cell"), Some(CellStatus::Running));
    assert!(env.has_cell("cell"));
}

#[tokio::test]
async fn test_duplicate_id_is_rejected() {
    let env = Environment::new();
    let _first = probe(&env, "cell").await;

    let (second, _) = Probe::new();
    let result = env.start_cell("cell", second).await;
    assert!(matches!(result, Err(MeshError::AlreadyExists(id)) if id == "cell"));
}

#[tokio::test]
async fn test_failed_init_releases_id() {
    let env = Environment::new();

    let result = env.start_cell("cell", Stillborn).await;
    match result {
        Err(MeshError::InitFailed { id, reason }) => {
            assert_eq!(id, "cell");
            assert_eq!(reason, "no resources");
        }
        other => panic!("expected init failure, got {other:?}"),
    }
    assert!(!env.has_cell("cell"));

    // The id is free again.
    let _cell = probe(&env, "cell").await;
}

#[tokio::test]
async fn test_init_can_start_and_subscribe_other_cells() {
    let env = Environment::new();
    let (child, mut heard) = Probe::new();
    env.start_cell("parent", Parent { child: Some(child) })
        .await
        .unwrap();

    assert!(env.has_cell("parent:child"));
    env.deliver_new("parent", "hello", Payload::new()).unwrap();
    assert_eq!(heard.next(WITHIN).await.unwrap().topic(), "hello");
}

// --- Errors and panics ---

#[tokio::test]
async fn test_failed_event_keeps_cell_running() {
    let env = Environment::new();
    let (cell, mut notes) = Fragile::new(false);
    env.start_cell("cell", cell).await.unwrap();

    env.deliver_new("cell", "fail", Payload::new()).unwrap();
    env.deliver_new("cell", "after", Payload::new()).unwrap();

    assert_eq!(
        next_note(&mut notes).await,
        Some(Note::Processed("after".into()))
    );
    assert_eq!(env.status("cell"), Some(CellStatus::Running));
}

#[tokio::test]
async fn test_recovered_panic_keeps_cell_running() {
    let env = Environment::new();
    let (cell, mut notes) = Fragile::new(true);
    env.start_cell("cell", cell).await.unwrap();

    env.deliver_new("cell", "boom", Payload::new()).unwrap();
    env.deliver_new("cell", "after", Payload::new()).unwrap();

    assert_eq!(
        next_note(&mut notes).await,
        Some(Note::Recovered("boom requested".into()))
    );
    assert_eq!(
        next_note(&mut notes).await,
        Some(Note::Processed("after".into()))
    );
    assert_eq!(env.status("cell"), Some(CellStatus::Running));
}

#[tokio::test]
async fn test_unrecovered_panic_crashes_cell() {
    let env = Environment::new();
    let _source = probe(&env, "source").await;
    let (cell, mut notes) = Fragile::new(false);
    env.start_cell("cell", cell).await.unwrap();
    env.subscribe("source", "cell").unwrap();

    env.deliver_new("cell", "boom", Payload::new()).unwrap();

    assert_eq!(next_note(&mut notes).await, Some(Note::Terminated));
    assert!(wait_for_status(&env, "cell", Some(CellStatus::Crashed)).await);

    // Detached from the graph, unreachable, but the id stays reserved.
    assert!(env.subscribers("source").unwrap().is_empty());
    let result = env.deliver_new("cell", "after", Payload::new());
    assert!(matches!(result, Err(MeshError::Crashed(_))));
    let (again, _) = Probe::new();
    assert!(matches!(
        env.start_cell("cell", again).await,
        Err(MeshError::AlreadyExists(_))
    ));

    // Stopping a crashed cell frees the id.
    env.stop_cell("cell").await.unwrap();
    assert!(!env.has_cell("cell"));
    let _replacement = probe(&env, "cell").await;
}

#[tokio::test]
async fn test_crash_does_not_affect_other_cells() {
    let env = Environment::new();
    let (cell, _notes) = Fragile::new(false);
    env.start_cell("cell", cell).await.unwrap();
    let mut bystander = probe(&env, "bystander").await;

    env.deliver_new("cell", "boom", Payload::new()).unwrap();
    assert!(wait_for_status(&env, "cell", Some(CellStatus::Crashed)).await);

    env.deliver_new("bystander", "still-here", Payload::new())
        .unwrap();
    assert_eq!(bystander.next(WITHIN).await.unwrap().topic(), "still-here");
}

// --- Stop ---

#[tokio::test]
async fn test_stop_runs_terminate_and_removes_edges() {
    let env = Environment::new();
    let _source = probe(&env, "source").await;
    let (cell, mut notes) = Fragile::new(true);
    env.start_cell("cell", cell).await.unwrap();
    let _sink = probe(&env, "sink").await;
    env.subscribe("source", "cell").unwrap();
    env.subscribe("cell", "sink").unwrap();

    env.stop_cell("cell").await.unwrap();

    assert_eq!(next_note(&mut notes).await, Some(Note::Terminated));
    assert!(!env.has_cell("cell"));
    assert_eq!(env.status("cell"), None);
    assert!(matches!(env.stop_cell("cell").await, Err(MeshError::NotFound(_))));
    assert!(env.subscribers("source").unwrap().is_empty());
    assert_eq!(
        env.emit_new("source", "hello", Payload::new(), cell_framework::Reply::None)
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_stop_processes_queued_events_first() {
    let env = Environment::new();
    let (cell, mut notes) = Fragile::new(true);
    env.start_cell("cell", cell).await.unwrap();

    env.deliver_new("cell", "one", Payload::new()).unwrap();
    env.deliver_new("cell", "two", Payload::new()).unwrap();
    env.stop_cell("cell").await.unwrap();

    assert_eq!(next_note(&mut notes).await, Some(Note::Processed("one".into())));
    assert_eq!(next_note(&mut notes).await, Some(Note::Processed("two".into())));
    assert_eq!(next_note(&mut notes).await, Some(Note::Terminated));
}

#[tokio::test]
async fn test_stop_unknown_cell_fails() {
    let env = Environment::new();
    let result = env.stop_cell("ghost").await;
    assert!(matches!(result, Err(MeshError::NotFound(_))));
}

#[tokio::test]
async fn test_cell_can_stop_itself() {
    let env = Environment::new();
    let (cell, mut notes) = Fragile::new(true);
    env.start_cell("cell", cell).await.unwrap();

    env.deliver_new("cell", "quit", Payload::new()).unwrap();

    assert_eq!(next_note(&mut notes).await, Some(Note::Terminated));
    assert!(wait_for_status(&env, "cell", None).await);
}

#[tokio::test]
async fn test_shutdown_stops_everything() {
    let env = Environment::new();
    let (one, mut one_notes) = Fragile::new(true);
    let (two, mut two_notes) = Fragile::new(true);
    env.start_cell("one", one).await.unwrap();
    env.start_cell("two", two).await.unwrap();

    env.shutdown().await;

    assert_eq!(next_note(&mut one_notes).await, Some(Note::Terminated));
    assert_eq!(next_note(&mut two_notes).await, Some(Note::Terminated));
    assert!(env.cell_ids().is_empty());
}
