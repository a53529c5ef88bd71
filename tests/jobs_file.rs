use synth_herder::config::{JobList, JobSpec};

#[test]
fn parse_example_job_list() {
    let raw = include_str!("../jobs.example.json");
    let list: JobList = serde_json::from_str(raw).expect("parse JSON");

    assert_eq!(list.username, "alice");
    assert!(!list.token.is_empty());
    assert_eq!(list.jobs.len(), 2);

    for entry in &list.jobs {
        let job = JobSpec::from_value(entry).expect("well-formed job entry");
        assert!(job.name.starts_with("u250_rvc_configuration_"));
        assert!(!job.dir.is_empty());
        assert_eq!(job.operation, "build");
        assert!(job.params.contains_key("HLS_CLOCK_PERIOD"));
        assert!(job.params.contains_key("KERNEL_FREQ"));
    }
}

#[test]
fn malformed_entries_fail_individually() {
    let raw = r#"{
        "username": "alice",
        "token": "t",
        "jobs": [
            {"name": "ok", "dir": "d", "network": "n", "operation": "build", "params": {}},
            {"name": "missing everything else"}
        ]
    }"#;
    let list: JobList = serde_json::from_str(raw).expect("list itself parses");
    assert!(JobSpec::from_value(&list.jobs[0]).is_ok());
    assert!(JobSpec::from_value(&list.jobs[1]).is_err());
}
