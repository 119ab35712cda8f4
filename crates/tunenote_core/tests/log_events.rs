use log::{LevelFilter, Log, Metadata, Record};
use std::sync::Mutex;
use tunenote_core::db::open_db_in_memory;
use tunenote_core::{ensure_managed, MigratorConfig, SqliteRecordStore, TuneCardBuilder};

struct CaptureLogger {
    lines: Mutex<Vec<String>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.lines
            .lock()
            .unwrap()
            .push(record.args().to_string());
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    lines: Mutex::new(Vec::new()),
};

fn events_named<'a>(lines: &'a [String], event: &str) -> Vec<&'a String> {
    let needle = format!("event={event} ");
    lines.iter().filter(|line| line.contains(&needle)).collect()
}

// Single test in this binary: it owns the global logger.
#[test]
fn each_applied_step_logs_exactly_one_step_event() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let mut conn = open_db_in_memory().unwrap();
    let mut store = SqliteRecordStore::try_new(&mut conn).unwrap();
    ensure_managed(&mut store, &MigratorConfig::default(), &TuneCardBuilder).unwrap();

    let lines = LOGGER.lines.lock().unwrap().clone();

    let steps = events_named(&lines, "note_type_migrate_step");
    assert_eq!(steps.len(), 2, "step events: {steps:?}");
    for line in &steps {
        assert!(line.contains("status=ok"), "missing status: {line}");
        assert!(line.contains(" from=") && line.contains(" to="), "missing versions: {line}");
    }
    assert!(steps[0].contains("step=create_note_type"));
    assert!(steps[1].contains("step=split_key_from_tune_type"));

    assert_eq!(events_named(&lines, "note_type_key_split").len(), 1);
    assert_eq!(events_named(&lines, "template_sync").len(), 1);

    // Field values never reach the log.
    assert!(lines.iter().all(|line| !line.contains("AnkiTune")));
}
