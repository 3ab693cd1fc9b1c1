extern crate resource_lifecycle;

use std::sync::{Arc, Mutex};

use resource_lifecycle::prelude::*;

#[derive(Default, Clone)]
struct Recorder {
    released: Arc<Mutex<Vec<&'static str>>>,
}

impl Recorder {
    fn released(&self) -> Vec<&'static str> {
        self.released.lock().unwrap().clone()
    }
}

impl ReleaseSink<&'static str> for Recorder {
    fn release(&self, target: &'static str) {
        self.released.lock().unwrap().push(target);
    }
}

fn testbed() -> (Recorder, SharedDependencies<&'static str>) {
    let _ = env_logger::try_init();
    (Recorder::default(), SharedDependencies::new())
}

fn object(
    name: &str,
    target: &'static str,
    sink: &Recorder,
    counts: &SharedDependencies<&'static str>,
) -> ResourceObject<&'static str> {
    ResourceObject::build(name, target)
        .with_sink(Arc::new(sink.clone()))
        .with_dependencies(counts.clone())
        .finish()
        .unwrap()
}

#[test]
fn configuration() {
    let (sink, counts) = testbed();

    match ResourceObject::build("model", "model")
        .with_dependencies(counts)
        .finish()
    {
        Err(Error::Configuration(_)) => {}
        _ => panic!("a release sink is required."),
    }

    match ResourceObject::build("model", "model")
        .with_sink(Arc::new(sink))
        .finish()
    {
        Err(Error::Configuration(_)) => {}
        _ => panic!("a dependency table is required."),
    }
}

#[test]
fn base_eligibility_without_dependents() {
    let (sink, counts) = testbed();

    let locked = ResourceObject::build("model", "model")
        .with_state(false)
        .with_sink(Arc::new(sink.clone()))
        .with_dependencies(counts.clone())
        .finish()
        .unwrap();
    assert!(!locked.can_release());

    let free = ResourceObject::build("texture", "texture")
        .with_state(true)
        .with_sink(Arc::new(sink))
        .with_dependencies(counts.clone())
        .finish()
        .unwrap();
    assert!(free.can_release());
    assert!(free.can_release());
    assert!(counts.lock().is_empty());
}

#[test]
fn add_dependency_is_idempotent() {
    let (sink, counts) = testbed();
    let mut model = object("model", "model", &sink, &counts);

    assert!(model.add_dependency("texture"));
    assert!(!model.add_dependency("texture"));
    assert!(model.add_dependency("shader"));

    assert_eq!(model.dependencies(), &["texture", "shader"]);
    assert_eq!(counts.count(&"texture"), 1);
    assert_eq!(counts.count(&"shader"), 1);
}

#[test]
fn dependents_block_release() {
    let (sink, counts) = testbed();
    let mut model = object("model", "model", &sink, &counts);
    let mut material = object("material", "material", &sink, &counts);
    let texture = object("texture", "texture", &sink, &counts);

    model.add_dependency("texture");
    material.add_dependency("texture");
    assert_eq!(counts.count(&"texture"), 2);
    assert!(!texture.can_release());

    model.release(false).unwrap();
    assert_eq!(counts.count(&"texture"), 1);
    assert!(!texture.can_release());

    material.release(false).unwrap();
    assert_eq!(counts.count(&"texture"), 0);
    assert!(texture.can_release());
}

#[test]
fn release_in_dependency_order() {
    let (sink, counts) = testbed();
    let mut h1 = object("h1", "h1", &sink, &counts);
    let mut h2 = object("h2", "h2", &sink, &counts);

    h1.add_dependency("h2");
    assert_eq!(counts.lock().get(&"h2"), Some(1));

    h1.release(false).unwrap();
    assert!(h1.is_released());
    assert_eq!(counts.lock().get(&"h1"), None);
    assert_eq!(counts.lock().get(&"h2"), Some(0));

    h2.release(false).unwrap();
    assert!(counts.lock().is_empty());
    assert_eq!(sink.released(), vec!["h1", "h2"]);
}

#[test]
fn release_in_reverse_order() {
    let (sink, counts) = testbed();
    let mut h1 = object("h1", "h1", &sink, &counts);
    let mut h2 = object("h2", "h2", &sink, &counts);

    h1.add_dependency("h2");

    let err = h2.release(false).unwrap_err();
    assert!(err.is_invariant_violation());
    match err {
        Error::DanglingReference { ref name, count } => {
            assert_eq!(name, "h2");
            assert_eq!(count, 1);
        }
        _ => panic!("{}", err),
    }

    assert!(!h2.is_released());
    assert_eq!(counts.lock().get(&"h2"), Some(1));
    assert_eq!(counts.lock().len(), 1);
    assert!(sink.released().is_empty());

    // The correct order still works afterwards.
    h1.release(false).unwrap();
    h2.release(false).unwrap();
    assert_eq!(sink.released(), vec!["h1", "h2"]);
}

#[test]
fn missing_dependency_entry() {
    let (sink, counts) = testbed();
    let mut model = object("model", "model", &sink, &counts);

    model.add_dependency("texture");
    counts.lock().remove(&"texture");

    match model.release(false) {
        Err(Error::InconsistentState { ref name, .. }) => assert_eq!(name, "model"),
        _ => panic!("decrementing an unknown entry must fail."),
    }

    assert!(!model.is_released());
    assert!(sink.released().is_empty());
}

#[test]
fn shutdown_ignores_debts() {
    let (sink, counts) = testbed();
    let mut h1 = object("h1", "h1", &sink, &counts);
    let mut h2 = object("h2", "h2", &sink, &counts);

    h1.add_dependency("h2");
    counts.lock().remove(&"h2");
    counts.lock().increment("h2");
    counts.lock().increment("h2");

    h2.release(true).unwrap();
    assert_eq!(counts.lock().get(&"h2"), None);
    assert_eq!(sink.released(), vec!["h2"]);

    // The entry of "h2" is gone, which would be a failure on the normal path.
    h1.release(true).unwrap();
    assert!(counts.lock().is_empty());
    assert_eq!(sink.released(), vec!["h2", "h1"]);
}

#[test]
fn closure_sink() {
    let _ = env_logger::try_init();

    let released = Arc::new(Mutex::new(0));
    let counter = released.clone();
    let sink: Arc<dyn ReleaseSink<u32>> = Arc::new(move |_: u32| {
        *counter.lock().unwrap() += 1;
    });

    let mut object = ResourceObject::build("mesh", 8u32)
        .with_sink(sink)
        .with_dependencies(SharedDependencies::new())
        .finish()
        .unwrap();

    object.release(false).unwrap();
    assert_eq!(*released.lock().unwrap(), 1);
}

#[test]
fn zeroed_dependency_entry() {
    let (sink, counts) = testbed();
    let mut model = object("model", "model", &sink, &counts);

    model.add_dependency("texture");
    model.add_dependency("shader");
    assert_eq!(counts.lock().decrement(&"texture"), Some(0));

    match model.release(false) {
        Err(Error::InconsistentState { ref name, .. }) => assert_eq!(name, "model"),
        _ => panic!("decrementing a zeroed entry must fail."),
    }

    assert!(!model.is_released());
    assert_eq!(counts.lock().get(&"texture"), Some(0));
    assert_eq!(counts.lock().get(&"shader"), Some(1));
    assert!(sink.released().is_empty());
}

#[test]
fn self_dependency() {
    let (sink, counts) = testbed();
    let mut model = object("model", "model", &sink, &counts);

    assert!(model.add_dependency("model"));
    assert!(!model.can_release());

    match model.release(false) {
        Err(Error::DanglingReference { count, .. }) => assert_eq!(count, 1),
        _ => panic!("a self dependency blocks the normal release."),
    }
    assert!(sink.released().is_empty());

    model.release(true).unwrap();
    assert!(model.is_released());
    assert!(counts.lock().is_empty());
    assert_eq!(sink.released(), vec!["model"]);
}
