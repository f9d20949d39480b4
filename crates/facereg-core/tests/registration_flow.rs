//! End-to-end registration flows driven through `Session`.

use facereg_core::{
    DetectionResult, Effect, Event, Face, FaceId, FaceRegistry, InMemoryRegistry, Rect, Session,
    SessionState, TargetRegion,
};

const TARGET: Rect = Rect::new(100.0, 100.0, 200.0, 300.0);
const ALIGNED: Rect = Rect::new(105.0, 98.0, 195.0, 305.0);

fn aligned_tick(id: &str) -> Event {
    Event::DetectionTick(DetectionResult::single(Face::new(id, ALIGNED)))
}

fn new_session(registry: InMemoryRegistry) -> Session<InMemoryRegistry> {
    Session::new(TargetRegion::new(TARGET), registry)
}

#[test]
fn test_unknown_face_is_registered_after_naming() {
    let mut session = new_session(InMemoryRegistry::new());

    session.handle(Event::StartScan).unwrap();
    assert_eq!(session.state(), &SessionState::Scanning);

    let effects = session.handle(aligned_tick("f1")).unwrap();
    assert!(effects.contains(&Effect::OpenNameDialog));
    assert!(effects.contains(&Effect::StopScanning));
    match session.state() {
        SessionState::AwaitingName { pending_face } => {
            assert_eq!(pending_face.face_id, FaceId::new("f1"));
        }
        other => panic!("expected awaiting_name, got {other:?}"),
    }

    let effects = session
        .handle(Event::SubmitName {
            text: "Alice".into(),
        })
        .unwrap();
    assert!(effects.contains(&Effect::CloseNameDialog));
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::ShowInfo(msg) if msg.contains("Alice"))));
    assert_eq!(session.state(), &SessionState::Idle);
    assert_eq!(
        session.registry().lookup(&FaceId::new("f1")),
        Ok(Some("Alice".to_string()))
    );
}

#[test]
fn test_registered_face_matches_without_dialog() {
    let mut registry = InMemoryRegistry::new();
    registry.register(&FaceId::new("f1"), "Alice").unwrap();
    let mut session = new_session(registry);

    session.handle(Event::StartScan).unwrap();
    let effects = session.handle(aligned_tick("f1")).unwrap();

    assert_eq!(
        session.state(),
        &SessionState::Matched {
            name: "Alice".into()
        }
    );
    assert!(!effects.contains(&Effect::OpenNameDialog));
    assert!(effects.contains(&Effect::StopScanning));
}

#[test]
fn test_misaligned_frames_then_alignment() {
    let mut session = new_session(InMemoryRegistry::new());
    session.handle(Event::StartScan).unwrap();

    let far = Rect::new(300.0, 100.0, 200.0, 300.0);
    for _ in 0..3 {
        let effects = session
            .handle(Event::DetectionTick(DetectionResult::single(Face::new("f1", far))))
            .unwrap();
        assert_eq!(effects[0], Effect::DrawBox(far));
        assert_eq!(session.state(), &SessionState::Scanning);
    }

    session.handle(Event::DetectionTick(DetectionResult::empty())).unwrap();
    session.handle(aligned_tick("f1")).unwrap();
    assert_eq!(session.state().name(), "awaiting_name");
}

#[test]
fn test_rescan_after_match_is_full_reset() {
    let mut registry = InMemoryRegistry::new();
    registry.register(&FaceId::new("f1"), "Alice").unwrap();
    let mut session = new_session(registry);

    session.handle(Event::StartScan).unwrap();
    session.handle(aligned_tick("f1")).unwrap();

    let effects = session.handle(Event::StartScan).unwrap();
    assert_eq!(effects, vec![Effect::ClearBox]);
    assert_eq!(session.state(), &SessionState::Scanning);

    session.handle(aligned_tick("f2")).unwrap();
    assert_eq!(session.state().name(), "awaiting_name");
}

#[test]
fn test_frames_ignored_while_dialog_open() {
    let mut session = new_session(InMemoryRegistry::new());
    session.handle(Event::StartScan).unwrap();
    session.handle(aligned_tick("f1")).unwrap();

    let effects = session.handle(aligned_tick("f2")).unwrap();
    assert!(effects.is_empty());

    session
        .handle(Event::SubmitName { text: "Bob".into() })
        .unwrap();
    assert_eq!(
        session.registry().lookup(&FaceId::new("f1")),
        Ok(Some("Bob".to_string()))
    );
    assert_eq!(session.registry().lookup(&FaceId::new("f2")), Ok(None));
}

#[test]
fn test_reregistering_overwrites_name() {
    let mut session = new_session(InMemoryRegistry::new());
    for name in ["Alice", "Alicia"] {
        session.handle(Event::StartScan).unwrap();
        // Registered faces match instead of prompting, so forget the face first.
        session.registry_mut().remove(&FaceId::new("f1")).unwrap();
        session.handle(aligned_tick("f1")).unwrap();
        session
            .handle(Event::SubmitName { text: name.into() })
            .unwrap();
    }
    assert_eq!(
        session.registry().lookup(&FaceId::new("f1")),
        Ok(Some("Alicia".to_string()))
    );
    assert_eq!(session.registry().len(), 1);
}

#[test]
fn test_centered_target_from_viewport() {
    let target = TargetRegion::centered(1000.0, 1000.0);
    let mut session = Session::new(target, InMemoryRegistry::new());
    session.handle(Event::StartScan).unwrap();
    session
        .handle(Event::DetectionTick(DetectionResult::single(Face::new(
            "f1",
            Rect::new(310.0, 345.0, 395.0, 310.0),
        ))))
        .unwrap();
    assert_eq!(session.state().name(), "awaiting_name");
}
