use std::path::Path;
use synth_herder::extract::instance::{collect, parse_str};

const EXPORT_REPORT: &str = "\
== Vivado HLS Report for 'decoder_parser'
...
=== Resource Usage ===
SLICE:           1205
LUT:             4321
FF:              6543
DSP:                2
BRAM:               4
SRL:               19

=== Final Timing ===
CP required:                     3.300
CP achieved post-synthesis:      2.899
";

#[test]
fn parses_counters_and_timing() {
    let report = parse_str(EXPORT_REPORT).unwrap();

    assert_eq!(report.resources["SLICE"], Some(1205));
    assert_eq!(report.resources["LUT"], Some(4321));
    assert_eq!(report.resources["FF"], Some(6543));
    assert_eq!(report.resources["DSP"], Some(2));
    assert_eq!(report.resources["BRAM"], Some(4));
    assert_eq!(report.resources["SRL"], Some(19));
    // URAM is absent from the report but its key is still present
    assert_eq!(report.resources["URAM"], None);
    assert_eq!(report.resources.len(), 7);

    assert!((report.timing.required.unwrap() - 3.300).abs() < 1e-9);
    assert!((report.timing.achieved.unwrap() - 2.899).abs() < 1e-9);
}

#[test]
fn garbage_report_keeps_every_field_null() {
    let report = parse_str("nothing to see here").unwrap();
    assert!(report.resources.values().all(Option::is_none));
    assert!(report.timing.required.is_none());
    assert!(report.timing.achieved.is_none());
}

fn write_export_report(root: &Path, instance: &str, text: &str) {
    let dir = root
        .join(instance)
        .join("solution/impl/report/verilog");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{instance}_export.rpt")), text).unwrap();
}

#[test]
fn collect_tolerates_missing_reports() {
    let root = tempfile::tempdir().unwrap();
    write_export_report(root.path(), "actor_a", EXPORT_REPORT);
    write_export_report(root.path(), "actor_b", EXPORT_REPORT);
    // actor_c has the directory layout but no report file
    std::fs::create_dir_all(root.path().join("actor_c/solution/impl/report/verilog")).unwrap();

    let reports = collect(root.path()).unwrap();
    assert_eq!(reports.len(), 3);
    assert!(reports["actor_a"].is_some());
    assert!(reports["actor_b"].is_some());
    assert!(reports["actor_c"].is_none());

    // keys come out sorted by instance name
    let names: Vec<&String> = reports.keys().collect();
    assert_eq!(names, ["actor_a", "actor_b", "actor_c"]);
}

#[test]
fn collect_ignores_stray_files() {
    let root = tempfile::tempdir().unwrap();
    write_export_report(root.path(), "actor_a", EXPORT_REPORT);
    std::fs::write(root.path().join("notes.txt"), "not an instance").unwrap();

    let reports = collect(root.path()).unwrap();
    assert_eq!(reports.len(), 1);
}
